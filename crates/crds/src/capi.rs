//! Cluster API resource types
//!
//! Partial mirrors of the upstream Cluster API `Cluster` and `Machine`
//! resources (group `cluster.x-k8s.io`). The bootstrap controller only
//! consumes these, so only the fields it reads are modeled; unknown fields
//! are ignored on deserialization.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label carrying the owning cluster name on Cluster API resources.
pub const CLUSTER_NAME_LABEL: &str = "cluster.x-k8s.io/cluster-name";

/// Label marking a Machine as a control plane machine.
pub const CONTROL_PLANE_LABEL: &str = "cluster.x-k8s.io/control-plane";

/// Condition type set on a Cluster once its control plane has initialized.
pub const CONTROL_PLANE_INITIALIZED_CONDITION: &str = "ControlPlaneInitialized";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "cluster.x-k8s.io",
    version = "v1beta1",
    kind = "Cluster",
    namespaced,
    status = "ClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Endpoint clients use to reach the cluster's apiserver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<ApiEndpoint>,

    /// Reconciliation of this cluster and its owned resources is paused
    #[serde(default)]
    pub paused: bool,
}

/// A host/port endpoint of an apiserver.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    /// The hostname on which the API server is serving
    #[serde(default)]
    pub host: String,

    /// The port on which the API server is serving
    #[serde(default)]
    pub port: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    /// The cluster's infrastructure has been provisioned
    #[serde(default)]
    pub infrastructure_ready: bool,

    /// Cluster API conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<CapiCondition>,
}

/// A Cluster API style condition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CapiCondition {
    /// Condition type, e.g. "ControlPlaneInitialized"
    #[serde(rename = "type")]
    pub type_: String,

    /// Condition status: "True", "False" or "Unknown"
    #[serde(default)]
    pub status: String,
}

impl Cluster {
    /// Whether the control plane of this cluster has been initialized.
    ///
    /// Absence of the condition counts as not initialized.
    #[must_use]
    pub fn is_control_plane_initialized(&self) -> bool {
        self.status
            .as_ref()
            .map(|status| &status.conditions)
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == CONTROL_PLANE_INITIALIZED_CONDITION && c.status == "True")
            })
    }

    /// Whether the cluster infrastructure is provisioned.
    #[must_use]
    pub fn is_infrastructure_ready(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|status| status.infrastructure_ready)
    }
}

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "cluster.x-k8s.io",
    version = "v1beta1",
    kind = "Machine",
    namespaced,
    status = "MachineStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    /// Name of the owning Cluster
    #[serde(default)]
    pub cluster_name: String,

    /// Kubernetes version the machine should run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Provider specific machine id, set once infrastructure exists
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "providerID")]
    pub provider_id: Option<String>,

    /// Bootstrap configuration of the machine
    #[serde(default)]
    pub bootstrap: Bootstrap,
}

/// Reference to the bootstrap configuration of a machine.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    /// Reference to the bootstrap config resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_ref: Option<ConfigRef>,

    /// Name of an externally managed bootstrap data secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_secret_name: Option<String>,
}

/// Namespaced reference to a bootstrap config resource.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRef {
    /// Kind of the referenced resource
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// Name of the referenced resource
    pub name: String,

    /// Namespace of the referenced resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct MachineStatus {
    /// Lifecycle phase of the machine, e.g. "Running"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Addresses of the provisioned machine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<MachineAddress>,
}

/// An address of a machine.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct MachineAddress {
    /// Address type, e.g. "InternalIP"
    #[serde(rename = "type")]
    pub type_: String,

    /// The address itself
    #[serde(default)]
    pub address: String,
}

impl Machine {
    /// Whether this machine belongs to the control plane, indicated by the
    /// upstream control plane label.
    #[must_use]
    pub fn is_control_plane(&self) -> bool {
        self.metadata
            .labels
            .as_ref()
            .is_some_and(|labels| labels.contains_key(CONTROL_PLANE_LABEL))
    }

    /// First non-empty address of a machine, if it has any.
    #[must_use]
    pub fn first_address(&self) -> Option<&str> {
        self.status
            .as_ref()?
            .addresses
            .iter()
            .map(|a| a.address.as_str())
            .find(|address| !address.is_empty())
    }
}
