//! Plan compiler for a control plane node joining an existing cluster.

use crate::channel::Confinement;
use crate::cloud_config::{CloudConfig, File};
use crate::common::{
    default_if_empty, extra_kubelet_args_file, join_command, join_urls, new_base_cloud_config,
    resolve_install_argument, script_command, validate_token, validate_token_ttl, EndpointType,
    ProxySettings, SnapstoreProxy, CAPI_AUTH_TOKEN_PATH, DEFAULT_CLUSTER_AGENT_PORT,
    DEFAULT_DQLITE_PORT,
};
use crate::error::Error;
use crate::scripts::Script;

/// Inputs for compiling the control plane join plan.
#[derive(Debug, Clone, Default)]
pub struct ControlPlaneJoinInput {
    /// Auth token the node uses to talk back to the provider, staged as a
    /// write-file
    pub auth_token: String,
    /// Control plane endpoint (DNS name or literal IP)
    pub control_plane_endpoint: String,
    /// 32 character cluster join token
    pub token: String,
    /// TTL in seconds of the join token re-registered by this node
    pub token_ttl: i64,
    /// Kubernetes version, e.g. "v1.25.2"
    pub kubernetes_version: String,
    /// Cluster agent port, defaults to 25000 when empty
    pub cluster_agent_port: String,
    /// Dqlite port, defaults to 19001 when empty
    pub dqlite_port: String,
    /// Whether the Calico overlay uses IP-in-IP encapsulation
    pub ip_in_ip: bool,
    /// Skip bundling the default CNI during installation
    pub disable_default_cni: bool,
    /// Candidate peer addresses, primary first, the rest are fallbacks
    pub join_node_ips: Vec<String>,
    /// Snap confinement mode
    pub confinement: Confinement,
    /// Snap channel risk level
    pub risk_level: String,
    /// Proxy settings for containerd
    pub containerd_proxy: ProxySettings,
    /// Snap store proxy identity
    pub snapstore_proxy: SnapstoreProxy,
    /// HTTP proxy URL for reaching the snap store
    pub snapstore_http_proxy: Option<String>,
    /// HTTPS proxy URL for reaching the snap store
    pub snapstore_https_proxy: Option<String>,
    /// Additional files to stage on the machine
    pub extra_write_files: Vec<File>,
    /// Extra kubelet arguments, one flag per entry
    pub extra_kubelet_args: Vec<String>,
    /// Caller commands spliced before the installation block
    pub pre_run_commands: Vec<String>,
    /// Caller commands spliced after the installation block
    pub post_run_commands: Vec<String>,
    /// Caller commands executed during early boot
    pub boot_commands: Vec<String>,
}

/// Compiles the provisioning plan for a node joining the control plane.
pub fn new_join_control_plane(input: &ControlPlaneJoinInput) -> Result<CloudConfig, Error> {
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
    let urls = join_urls(&input.join_node_ips, &cluster_agent_port, &input.token);

    let mut config = new_base_cloud_config();
    config.bootcmd.extend(input.boot_commands.iter().cloned());

    config.write_files.push(File {
        content: input.auth_token.clone(),
        path: CAPI_AUTH_TOKEN_PATH.to_string(),
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
        script_command(
            Script::ConfigureSnapstoreHttpProxy,
            [
                input.snapstore_http_proxy.as_deref().unwrap_or(""),
                input.snapstore_https_proxy.as_deref().unwrap_or(""),
            ],
        ),
        input.snapstore_proxy.command(),
    ]);
    config.runcmd.extend(input.pre_run_commands.iter().cloned());
    config.runcmd.extend([
        Script::DisableHostServices.path(),
        format!(
            "{} \"{install_argument}\" {}",
            Script::InstallSnapK8s.path(),
            input.disable_default_cni
        ),
        input.containerd_proxy.containerd_command(),
        Script::ConfigureKubelet.path(),
        Script::WaitApiserver.path(),
        format!("{} {}", Script::ConfigureCalicoIpip.path(), input.ip_in_ip),
        script_command(Script::ConfigureClusterAgentPort, [cluster_agent_port.as_str()]),
        script_command(Script::ConfigureDqlitePort, [dqlite_port.as_str()]),
        // Port changes restart services, so gate on the apiserver again
        // before touching certificates and joining.
        Script::WaitApiserver.path(),
        script_command(
            Script::ConfigureCertForLb,
            [endpoint_type.as_str(), input.control_plane_endpoint.as_str()],
        ),
        join_command(false, &urls),
        Script::ConfigureApiserver.path(),
        format!(
            "snapk8s add-node --token-ttl {} --token \"{}\"",
            input.token_ttl, input.token
        ),
    ]);
    config.runcmd.extend(input.post_run_commands.iter().cloned());

    Ok(config)
}
