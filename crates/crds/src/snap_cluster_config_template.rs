//! SnapClusterConfigTemplate CRD
//!
//! Template wrapping a [`SnapClusterConfigSpec`]. MachineDeployments and
//! control plane providers reference a template and stamp one
//! SnapClusterConfig per machine from it; the bootstrap controller never
//! reconciles the template itself.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::snap_cluster_config::SnapClusterConfigSpec;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "bootstrap.snapcluster.dev",
    version = "v1beta1",
    kind = "SnapClusterConfigTemplate",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SnapClusterConfigTemplateSpec {
    /// The configuration stamped onto each generated SnapClusterConfig
    pub template: SnapClusterConfigTemplateResource,
}

/// The templated resource body: only the spec is templated, metadata is
/// owned by whoever stamps the config.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct SnapClusterConfigTemplateResource {
    /// Spec copied verbatim into the generated SnapClusterConfig
    #[serde(default)]
    pub spec: SnapClusterConfigSpec,
}
