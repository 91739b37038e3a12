//! SnapClusterConfig CRD
//!
//! Bootstrap configuration for a machine joining a snapk8s cluster. The
//! bootstrap controller compiles this, together with the owning Machine and
//! Cluster, into the cloud-config handed to the machine on first boot.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Join token TTL applied when the configuration does not set one: roughly
/// ten years, so the token practically never expires.
pub const DEFAULT_JOIN_TOKEN_TTL_SECS: i64 = 315_569_260;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "bootstrap.snapcluster.dev",
    version = "v1beta1",
    kind = "SnapClusterConfig",
    namespaced,
    status = "SnapClusterConfigStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct SnapClusterConfigSpec {
    /// Cluster-wide configuration shared by every node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_configuration: Option<ClusterConfiguration>,

    /// Configuration for initializing and joining nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_configuration: Option<InitConfiguration>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfiguration {
    /// Remap the cluster agent port (25000) and dqlite port (19001) to
    /// 30000 and 2379. The default ports are blocked by security groups in
    /// several infrastructure providers, while the remapped ports are open
    /// because kubeadm uses them.
    #[serde(default = "default_true")]
    pub port_compatibility_remap: bool,
}

impl Default for ClusterConfiguration {
    fn default() -> Self {
        Self {
            port_compatibility_remap: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct InitConfiguration {
    /// The join token will expire after the specified seconds, defaults to
    /// 10 years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_token_ttl_in_secs: Option<i64>,

    /// List of addons to be enabled upon cluster creation, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addons: Vec<String>,

    /// Use IP-in-IP encapsulation for the Calico overlay
    #[serde(default, rename = "IPinIP")]
    pub ip_in_ip: bool,

    /// HTTP proxy configured for containerd
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "httpProxy")]
    pub http_proxy: Option<String>,

    /// HTTPS proxy configured for containerd
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "httpsProxy")]
    pub https_proxy: Option<String>,

    /// Comma separated no-proxy list for containerd
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_proxy: Option<String>,

    /// Snap confinement of the snapk8s installation: "classic" (default)
    /// or "strict"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub confinement: String,

    /// Risk level of the snap channel: "stable", "candidate", "beta" or
    /// "edge"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub risk_level: String,

    /// Skip the default CNI during installation so another CNI can be used
    #[serde(default, rename = "disableDefaultCNI")]
    pub disable_default_cni: bool,

    /// Scheme of a snap store proxy to use, defaults to "http"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub snapstore_proxy_scheme: String,

    /// Domain of a snap store proxy to use
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub snapstore_proxy_domain: String,

    /// Store id served by the snap store proxy
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub snapstore_proxy_id: String,

    /// HTTP proxy for reaching the snap store
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "snapstoreHTTPProxy"
    )]
    pub snapstore_http_proxy: Option<String>,

    /// HTTPS proxy for reaching the snap store
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "snapstoreHTTPSProxy"
    )]
    pub snapstore_https_proxy: Option<String>,

    /// Additional files written to the machine before any command runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_write_files: Vec<CloudInitWriteFile>,

    /// Extra arguments passed to kubelet, one flag per entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_kubelet_args: Vec<String>,

    /// Commands executed early in the boot process
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boot_commands: Vec<String>,

    /// Commands executed before the snapk8s installation block
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_run_commands: Vec<String>,

    /// Commands executed after the snapk8s installation block
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_run_commands: Vec<String>,
}

/// A file to write to the machine via cloud-init.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CloudInitWriteFile {
    /// File contents
    pub content: String,

    /// Absolute path on the machine
    pub path: String,

    /// Octal permission string, e.g. "0644"
    pub permissions: String,

    /// Owner specification, e.g. "root:root"
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct SnapClusterConfigStatus {
    /// Ready indicates the bootstrap data secret is ready to be consumed
    #[serde(default)]
    pub ready: bool,

    /// Name of the secret that stores the generated bootstrap data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_secret_name: Option<String>,

    /// Set on non-retryable errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// Set on non-retryable errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,

    /// Last reconciliation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled: Option<chrono::DateTime<chrono::Utc>>,
}

fn default_true() -> bool {
    true
}

impl SnapClusterConfigSpec {
    /// Whether the compatibility port remap applies. Absence of the
    /// cluster configuration section means the default, which is remapped.
    #[must_use]
    pub fn port_compatibility_remap(&self) -> bool {
        self.cluster_configuration
            .as_ref()
            .is_none_or(|c| c.port_compatibility_remap)
    }

    /// Join token TTL in seconds, falling back to the ten year default.
    #[must_use]
    pub fn join_token_ttl_in_secs(&self) -> i64 {
        self.init_configuration
            .as_ref()
            .and_then(|c| c.join_token_ttl_in_secs)
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_JOIN_TOKEN_TTL_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_remap_defaults_on() {
        let spec = SnapClusterConfigSpec::default();
        assert!(spec.port_compatibility_remap());

        let spec = SnapClusterConfigSpec {
            cluster_configuration: Some(ClusterConfiguration {
                port_compatibility_remap: false,
            }),
            ..Default::default()
        };
        assert!(!spec.port_compatibility_remap());
    }

    #[test]
    fn test_join_token_ttl_default() {
        let spec = SnapClusterConfigSpec::default();
        assert_eq!(spec.join_token_ttl_in_secs(), DEFAULT_JOIN_TOKEN_TTL_SECS);

        let spec = SnapClusterConfigSpec {
            init_configuration: Some(InitConfiguration {
                join_token_ttl_in_secs: Some(10000),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(spec.join_token_ttl_in_secs(), 10000);
    }

    #[test]
    fn test_spec_field_names_are_camel_case() {
        let spec = SnapClusterConfigSpec {
            cluster_configuration: Some(ClusterConfiguration::default()),
            init_configuration: Some(InitConfiguration {
                ip_in_ip: true,
                http_proxy: Some("http://proxy".to_string()),
                disable_default_cni: true,
                ..Default::default()
            }),
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert!(value["clusterConfiguration"]["portCompatibilityRemap"].as_bool().unwrap());
        assert!(value["initConfiguration"]["IPinIP"].as_bool().unwrap());
        assert!(value["initConfiguration"]["disableDefaultCNI"].as_bool().unwrap());
        assert_eq!(
            value["initConfiguration"]["httpProxy"].as_str().unwrap(),
            "http://proxy"
        );
    }
}
