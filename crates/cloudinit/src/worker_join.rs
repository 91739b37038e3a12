//! Plan compiler for a worker node joining an existing cluster.

use crate::channel::Confinement;
use crate::cloud_config::{CloudConfig, File};
use crate::common::{
    default_if_empty, extra_kubelet_args_file, join_command, join_urls, new_base_cloud_config,
    resolve_install_argument, script_command, validate_token, ProxySettings, SnapstoreProxy,
    DEFAULT_CLUSTER_AGENT_PORT,
};
use crate::error::Error;
use crate::scripts::Script;

/// Inputs for compiling the worker join plan.
#[derive(Debug, Clone, Default)]
pub struct WorkerInput {
    /// 32 character cluster join token
    pub token: String,
    /// Control plane endpoint (DNS name or literal IP)
    pub control_plane_endpoint: String,
    /// Kubernetes version, e.g. "v1.25.2"
    pub kubernetes_version: String,
    /// Cluster agent port, defaults to 25000 when empty
    pub cluster_agent_port: String,
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
    /// Additional files to stage on the machine
    pub extra_write_files: Vec<File>,
    /// Extra kubelet arguments, one flag per entry
    pub extra_kubelet_args: Vec<String>,
}

/// Compiles the provisioning plan for a node joining as a worker.
pub fn new_join_worker(input: &WorkerInput) -> Result<CloudConfig, Error> {
    validate_token(&input.token)?;
    let install_argument = resolve_install_argument(
        &input.kubernetes_version,
        input.confinement,
        &input.risk_level,
    )?;

    let cluster_agent_port =
        default_if_empty(&input.cluster_agent_port, DEFAULT_CLUSTER_AGENT_PORT);
    let urls = join_urls(&input.join_node_ips, &cluster_agent_port, &input.token);

    let mut config = new_base_cloud_config();
    config
        .write_files
        .extend(input.extra_write_files.iter().cloned());
    if let Some(file) = extra_kubelet_args_file(&input.extra_kubelet_args) {
        config.write_files.push(file);
    }

    config.runcmd.extend([
        input.snapstore_proxy.command(),
        Script::DisableHostServices.path(),
        format!("{} \"{install_argument}\"", Script::InstallSnapK8s.path()),
        input.containerd_proxy.containerd_command(),
        Script::ConfigureKubelet.path(),
        "snapk8s status --wait-ready".to_string(),
        script_command(Script::ConfigureClusterAgentPort, [cluster_agent_port.as_str()]),
        join_command(true, &urls),
    ]);

    Ok(config)
}
