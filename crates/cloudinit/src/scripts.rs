//! Registry of the provisioning step scripts.
//!
//! Every provisioning step a plan can reference is addressed by a stable
//! symbolic name here. The registry maps each step to its invocation path
//! under the well-known scripts directory and to its embedded payload; the
//! payload contents themselves are opaque provisioning material. Embedding
//! with `include_str!` makes a missing payload a build failure rather than
//! a runtime surprise.

/// Directory on the provisioned machine where all step scripts are staged.
pub const SCRIPTS_DIR: &str = "/capi-scripts";

/// A provisioning step script addressed by a stable symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    /// Configure HTTP/HTTPS proxy credentials for the snap store
    ConfigureSnapstoreHttpProxy,
    /// Point the snap client at a snap store proxy
    ConfigureSnapstoreProxy,
    /// Disable containerd/kubelet services shipped with the host image
    DisableHostServices,
    /// Install the snapk8s snap at a resolved channel
    InstallSnapK8s,
    /// Redirect the apiserver port and converge its arguments
    ConfigureApiserver,
    /// Toggle IP-in-IP encapsulation for the Calico overlay
    ConfigureCalicoIpip,
    /// Change the cluster agent port
    ConfigureClusterAgentPort,
    /// Configure proxy environment for containerd
    ConfigureContainerdProxy,
    /// Change the dqlite port
    ConfigureDqlitePort,
    /// Apply kubelet defaults and extra arguments
    ConfigureKubelet,
    /// Add the load balancer endpoint to the server certificate SANs
    ConfigureCertForLb,
    /// Enable a list of snapk8s addons
    EnableAddons,
    /// Join the node to an existing cluster
    Join,
    /// Block until the local apiserver answers
    WaitApiserver,
}

impl Script {
    /// All registered scripts, staged as write-files by every plan.
    pub const ALL: [Script; 14] = [
        Script::ConfigureSnapstoreHttpProxy,
        Script::ConfigureSnapstoreProxy,
        Script::DisableHostServices,
        Script::InstallSnapK8s,
        Script::ConfigureApiserver,
        Script::ConfigureCalicoIpip,
        Script::ConfigureClusterAgentPort,
        Script::ConfigureContainerdProxy,
        Script::ConfigureDqlitePort,
        Script::ConfigureKubelet,
        Script::ConfigureCertForLb,
        Script::EnableAddons,
        Script::Join,
        Script::WaitApiserver,
    ];

    /// File name of the script. The numeric prefix reflects the rough phase
    /// in which the step runs and is part of the external contract.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Script::ConfigureSnapstoreHttpProxy => "00-configure-snapstore-http-proxy.sh",
            Script::ConfigureSnapstoreProxy => "00-configure-snapstore-proxy.sh",
            Script::DisableHostServices => "00-disable-host-services.sh",
            Script::InstallSnapK8s => "00-install-snapk8s.sh",
            Script::ConfigureApiserver => "10-configure-apiserver.sh",
            Script::ConfigureCalicoIpip => "10-configure-calico-ipip.sh",
            Script::ConfigureClusterAgentPort => "10-configure-cluster-agent-port.sh",
            Script::ConfigureContainerdProxy => "10-configure-containerd-proxy.sh",
            Script::ConfigureDqlitePort => "10-configure-dqlite-port.sh",
            Script::ConfigureKubelet => "10-configure-kubelet.sh",
            Script::ConfigureCertForLb => "10-configure-cert-for-lb.sh",
            Script::EnableAddons => "20-snapk8s-enable.sh",
            Script::Join => "20-snapk8s-join.sh",
            Script::WaitApiserver => "50-wait-apiserver.sh",
        }
    }

    /// Invocation path of the script on the provisioned machine.
    #[must_use]
    pub fn path(self) -> String {
        format!("{SCRIPTS_DIR}/{}", self.name())
    }

    /// Embedded payload of the script.
    #[must_use]
    pub fn content(self) -> &'static str {
        match self {
            Script::ConfigureSnapstoreHttpProxy => {
                include_str!("scripts/00-configure-snapstore-http-proxy.sh")
            }
            Script::ConfigureSnapstoreProxy => {
                include_str!("scripts/00-configure-snapstore-proxy.sh")
            }
            Script::DisableHostServices => include_str!("scripts/00-disable-host-services.sh"),
            Script::InstallSnapK8s => include_str!("scripts/00-install-snapk8s.sh"),
            Script::ConfigureApiserver => include_str!("scripts/10-configure-apiserver.sh"),
            Script::ConfigureCalicoIpip => include_str!("scripts/10-configure-calico-ipip.sh"),
            Script::ConfigureClusterAgentPort => {
                include_str!("scripts/10-configure-cluster-agent-port.sh")
            }
            Script::ConfigureContainerdProxy => {
                include_str!("scripts/10-configure-containerd-proxy.sh")
            }
            Script::ConfigureDqlitePort => include_str!("scripts/10-configure-dqlite-port.sh"),
            Script::ConfigureKubelet => include_str!("scripts/10-configure-kubelet.sh"),
            Script::ConfigureCertForLb => include_str!("scripts/10-configure-cert-for-lb.sh"),
            Script::EnableAddons => include_str!("scripts/20-snapk8s-enable.sh"),
            Script::Join => include_str!("scripts/20-snapk8s-join.sh"),
            Script::WaitApiserver => include_str!("scripts/50-wait-apiserver.sh"),
        }
    }
}
