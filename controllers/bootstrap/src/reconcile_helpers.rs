//! Pure helpers for the reconcile paths.
//!
//! Everything here maps API types onto plan compiler inputs without
//! touching the Kubernetes API, so it is unit-testable without a cluster.

use cloudinit::{
    Confinement, ControlPlaneInitInput, ControlPlaneJoinInput, File, ProxySettings,
    SnapstoreProxy, WorkerInput,
};
use crds::{CloudInitWriteFile, InitConfiguration, Machine, SnapClusterConfigSpec};
use uuid::Uuid;

/// Default cluster agent port of a snapk8s node.
pub const DEFAULT_CLUSTER_AGENT_PORT: &str = "25000";
/// Default dqlite port of a snapk8s node.
pub const DEFAULT_DQLITE_PORT: &str = "19001";

// The default ports are blocked by security groups in several infra
// providers; the remapped ports are open there because kubeadm uses them.
/// Cluster agent port used when port compatibility remap is on.
pub const REMAPPED_CLUSTER_AGENT_PORT: &str = "30000";
/// Dqlite port used when port compatibility remap is on.
pub const REMAPPED_DQLITE_PORT: &str = "2379";

/// Everything the plan input builders need besides the configuration spec.
#[derive(Debug, Clone)]
pub struct BootstrapContext<'a> {
    /// Bootstrap configuration spec
    pub spec: &'a SnapClusterConfigSpec,
    /// Control plane endpoint host
    pub endpoint: String,
    /// Kubernetes version of the machine
    pub kubernetes_version: String,
    /// Cluster join token
    pub token: String,
}

/// Cluster agent and dqlite ports after applying the compatibility remap.
#[must_use]
pub fn resolved_ports(spec: &SnapClusterConfigSpec) -> (String, String) {
    if spec.port_compatibility_remap() {
        (
            REMAPPED_CLUSTER_AGENT_PORT.to_string(),
            REMAPPED_DQLITE_PORT.to_string(),
        )
    } else {
        (
            DEFAULT_CLUSTER_AGENT_PORT.to_string(),
            DEFAULT_DQLITE_PORT.to_string(),
        )
    }
}

/// Generates a fresh 32 character cluster join token.
#[must_use]
pub fn generate_join_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Converts API write files into plan files.
#[must_use]
pub fn write_files_from_api(files: &[CloudInitWriteFile]) -> Vec<File> {
    files
        .iter()
        .map(|file| File {
            content: file.content.clone(),
            path: file.path.clone(),
            permissions: file.permissions.clone(),
            owner: file.owner.clone(),
        })
        .collect()
}

fn proxy_settings(init: Option<&InitConfiguration>) -> ProxySettings {
    init.map(|c| ProxySettings {
        http: c.http_proxy.clone(),
        https: c.https_proxy.clone(),
        no_proxy: c.no_proxy.clone(),
    })
    .unwrap_or_default()
}

fn snapstore_proxy(init: Option<&InitConfiguration>) -> SnapstoreProxy {
    init.map(|c| SnapstoreProxy {
        scheme: c.snapstore_proxy_scheme.clone(),
        domain: c.snapstore_proxy_domain.clone(),
        id: c.snapstore_proxy_id.clone(),
    })
    .unwrap_or_default()
}

/// Addresses of control plane machines a joining node can connect to:
/// provisioned, running machines with at least one reported address, in
/// list order. The first is the primary join target, the rest fallbacks.
#[must_use]
pub fn join_addresses(machines: &[Machine]) -> Vec<String> {
    machines
        .iter()
        .filter(|machine| {
            machine.spec.provider_id.is_some()
                && machine
                    .status
                    .as_ref()
                    .and_then(|status| status.phase.as_deref())
                    == Some("Running")
        })
        .filter_map(|machine| machine.first_address())
        .map(str::to_string)
        .collect()
}

/// Builds the plan input for initializing a cluster from its first control
/// plane machine.
#[must_use]
pub fn init_input(ctx: &BootstrapContext<'_>, ca_cert: String, ca_key: String) -> ControlPlaneInitInput {
    let init = ctx.spec.init_configuration.as_ref();
    let (cluster_agent_port, dqlite_port) = resolved_ports(ctx.spec);

    ControlPlaneInitInput {
        ca_cert,
        ca_key,
        control_plane_endpoint: ctx.endpoint.clone(),
        token: ctx.token.clone(),
        token_ttl: ctx.spec.join_token_ttl_in_secs(),
        kubernetes_version: ctx.kubernetes_version.clone(),
        cluster_agent_port,
        dqlite_port,
        ip_in_ip: init.is_some_and(|c| c.ip_in_ip),
        addons: init.map(|c| c.addons.clone()).unwrap_or_default(),
        confinement: confinement(init),
        risk_level: risk_level(init),
        containerd_proxy: proxy_settings(init),
        extra_write_files: extra_write_files(init),
        extra_kubelet_args: extra_kubelet_args(init),
    }
}

/// Builds the plan input for a machine joining the control plane.
#[must_use]
pub fn control_plane_join_input(
    ctx: &BootstrapContext<'_>,
    auth_token: String,
    join_node_ips: Vec<String>,
) -> ControlPlaneJoinInput {
    let init = ctx.spec.init_configuration.as_ref();
    let (cluster_agent_port, dqlite_port) = resolved_ports(ctx.spec);

    ControlPlaneJoinInput {
        auth_token,
        control_plane_endpoint: ctx.endpoint.clone(),
        token: ctx.token.clone(),
        token_ttl: ctx.spec.join_token_ttl_in_secs(),
        kubernetes_version: ctx.kubernetes_version.clone(),
        cluster_agent_port,
        dqlite_port,
        ip_in_ip: init.is_some_and(|c| c.ip_in_ip),
        disable_default_cni: init.is_some_and(|c| c.disable_default_cni),
        join_node_ips,
        confinement: confinement(init),
        risk_level: risk_level(init),
        containerd_proxy: proxy_settings(init),
        snapstore_proxy: snapstore_proxy(init),
        snapstore_http_proxy: init.and_then(|c| c.snapstore_http_proxy.clone()),
        snapstore_https_proxy: init.and_then(|c| c.snapstore_https_proxy.clone()),
        extra_write_files: extra_write_files(init),
        extra_kubelet_args: extra_kubelet_args(init),
        pre_run_commands: init.map(|c| c.pre_run_commands.clone()).unwrap_or_default(),
        post_run_commands: init.map(|c| c.post_run_commands.clone()).unwrap_or_default(),
        boot_commands: init.map(|c| c.boot_commands.clone()).unwrap_or_default(),
    }
}

/// Builds the plan input for a machine joining as a worker.
#[must_use]
pub fn worker_input(ctx: &BootstrapContext<'_>, join_node_ips: Vec<String>) -> WorkerInput {
    let init = ctx.spec.init_configuration.as_ref();
    let (cluster_agent_port, _) = resolved_ports(ctx.spec);

    WorkerInput {
        token: ctx.token.clone(),
        control_plane_endpoint: ctx.endpoint.clone(),
        kubernetes_version: ctx.kubernetes_version.clone(),
        cluster_agent_port,
        join_node_ips,
        confinement: confinement(init),
        risk_level: risk_level(init),
        containerd_proxy: proxy_settings(init),
        snapstore_proxy: snapstore_proxy(init),
        extra_write_files: extra_write_files(init),
        extra_kubelet_args: extra_kubelet_args(init),
    }
}

fn confinement(init: Option<&InitConfiguration>) -> Confinement {
    init.map(|c| Confinement::parse(&c.confinement))
        .unwrap_or_default()
}

fn risk_level(init: Option<&InitConfiguration>) -> String {
    init.map(|c| c.risk_level.clone()).unwrap_or_default()
}

fn extra_write_files(init: Option<&InitConfiguration>) -> Vec<File> {
    init.map(|c| write_files_from_api(&c.extra_write_files))
        .unwrap_or_default()
}

fn extra_kubelet_args(init: Option<&InitConfiguration>) -> Vec<String> {
    init.map(|c| c.extra_kubelet_args.clone()).unwrap_or_default()
}
