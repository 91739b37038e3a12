//! Plan compiler for the first control plane node of a cluster.
//!
//! The produced command order is a compatibility contract with the
//! first-boot agent: changing it changes what existing clusters execute.

use crate::channel::Confinement;
use crate::cloud_config::{CloudConfig, File};
use crate::common::{
    default_if_empty, extra_kubelet_args_file, new_base_cloud_config, resolve_install_argument,
    script_command, validate_token, validate_token_ttl, EndpointType, ProxySettings,
    DEFAULT_CLUSTER_AGENT_PORT, DEFAULT_DQLITE_PORT,
};
use crate::error::Error;
use crate::scripts::Script;

/// Inputs for compiling the cluster initialization plan.
#[derive(Debug, Clone, Default)]
pub struct ControlPlaneInitInput {
    /// PEM encoded cluster CA certificate, staged before any command runs
    pub ca_cert: String,
    /// PEM encoded cluster CA private key, staged before any command runs
    pub ca_key: String,
    /// Control plane endpoint (DNS name or literal IP)
    pub control_plane_endpoint: String,
    /// 32 character cluster join token to register
    pub token: String,
    /// TTL in seconds of the registered join token
    pub token_ttl: i64,
    /// Kubernetes version, e.g. "v1.25.2"
    pub kubernetes_version: String,
    /// Cluster agent port, defaults to 25000 when empty
    pub cluster_agent_port: String,
    /// Dqlite port, defaults to 19001 when empty
    pub dqlite_port: String,
    /// Whether the Calico overlay uses IP-in-IP encapsulation
    pub ip_in_ip: bool,
    /// Addons to enable, in order; a DNS addon is appended if absent
    pub addons: Vec<String>,
    /// Snap confinement mode
    pub confinement: Confinement,
    /// Snap channel risk level, e.g. "stable" or "edge"
    pub risk_level: String,
    /// Proxy settings for containerd
    pub containerd_proxy: ProxySettings,
    /// Additional files to stage on the machine
    pub extra_write_files: Vec<File>,
    /// Extra kubelet arguments, one flag per entry
    pub extra_kubelet_args: Vec<String>,
}

/// Compiles the provisioning plan that forms a new cluster from its first
/// control plane node.
pub fn new_init_control_plane(input: &ControlPlaneInitInput) -> Result<CloudConfig, Error> {
    validate_token(&input.token)?;
    validate_token_ttl(input.token_ttl)?;
    let install_argument = resolve_install_argument(
        &input.kubernetes_version,
        input.confinement,
        &input.risk_level,
    )?;

    let endpoint_type = EndpointType::classify(&input.control_plane_endpoint);
    let cluster_agent_port =
        default_if_empty(&input.cluster_agent_port, DEFAULT_CLUSTER_AGENT_PORT);
    let dqlite_port = default_if_empty(&input.dqlite_port, DEFAULT_DQLITE_PORT);
    let addons = normalize_addons(&input.addons);

    let mut config = new_base_cloud_config();

    // CA material must be on disk before the install command runs.
    config.write_files.push(File {
        content: input.ca_key.clone(),
        path: "/var/tmp/ca.key".to_string(),
        permissions: "0600".to_string(),
        owner: "root:root".to_string(),
    });
    config.write_files.push(File {
        content: input.ca_cert.clone(),
        path: "/var/tmp/ca.crt".to_string(),
        permissions: "0600".to_string(),
        owner: "root:root".to_string(),
    });
    config
        .write_files
        .extend(input.extra_write_files.iter().cloned());
    if let Some(file) = extra_kubelet_args_file(&input.extra_kubelet_args) {
        config.write_files.push(file);
    }

    config.runcmd.extend([
        Script::DisableHostServices.path(),
        format!("{} \"{install_argument}\"", Script::InstallSnapK8s.path()),
        input.containerd_proxy.containerd_command(),
        Script::ConfigureKubelet.path(),
        "snapk8s status --wait-ready".to_string(),
        "snapk8s refresh-certs /var/tmp".to_string(),
        format!("{} {}", Script::ConfigureCalicoIpip.path(), input.ip_in_ip),
        script_command(Script::ConfigureClusterAgentPort, [cluster_agent_port.as_str()]),
        script_command(Script::ConfigureDqlitePort, [dqlite_port.as_str()]),
        script_command(
            Script::ConfigureCertForLb,
            [endpoint_type.as_str(), input.control_plane_endpoint.as_str()],
        ),
        Script::ConfigureApiserver.path(),
        script_command(
            Script::EnableAddons,
            addons.iter().map(String::as_str),
        ),
        format!(
            "snapk8s add-node --token-ttl {} --token \"{}\"",
            input.token_ttl, input.token
        ),
    ]);

    Ok(config)
}

/// Guarantees a DNS-providing addon is present: caller order is preserved
/// and "dns" is appended last only when no supplied addon contains "dns".
fn normalize_addons(addons: &[String]) -> Vec<String> {
    let mut addons = addons.to_vec();
    if !addons.iter().any(|addon| addon.contains("dns")) {
        addons.push("dns".to_string());
    }
    addons
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_addons_appends_dns_last() {
        let addons = normalize_addons(&["ingress".to_string(), "metrics".to_string()]);
        assert_eq!(addons, vec!["ingress", "metrics", "dns"]);
    }

    #[test]
    fn test_normalize_addons_keeps_existing_dns() {
        let addons = normalize_addons(&["coredns".to_string(), "ingress".to_string()]);
        assert_eq!(addons, vec!["coredns", "ingress"]);
    }

    #[test]
    fn test_normalize_addons_empty() {
        assert_eq!(normalize_addons(&[]), vec!["dns"]);
    }
}
