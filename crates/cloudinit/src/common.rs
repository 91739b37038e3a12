//! Shared validation, resolution and assembly helpers for the three plan
//! compiler entry points.

use crate::channel::{self, Confinement};
use crate::cloud_config::{CloudConfig, File};
use crate::error::Error;
use crate::scripts::Script;

/// Required length of the cluster join token.
pub const TOKEN_LENGTH: usize = 32;

/// Path where the control-plane join path stages the CAPI auth token.
pub const CAPI_AUTH_TOKEN_PATH: &str = "/var/tmp/capi-auth-token";

/// Path where extra kubelet arguments are staged for the kubelet step.
pub const EXTRA_KUBELET_ARGS_PATH: &str = "/var/tmp/extra-kubelet-args";

pub(crate) const DEFAULT_CLUSTER_AGENT_PORT: &str = "25000";
pub(crate) const DEFAULT_DQLITE_PORT: &str = "19001";

/// Kind of the control plane endpoint, passed to the certificate SAN step
/// so the generated SAN entry matches the endpoint kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointType {
    /// Endpoint is a DNS name
    Dns,
    /// Endpoint is a literal IP address
    Ip,
}

impl EndpointType {
    /// Classifies an endpoint string: a literal network address is `Ip`,
    /// everything else is `Dns`.
    #[must_use]
    pub fn classify(endpoint: &str) -> Self {
        if endpoint.parse::<std::net::IpAddr>().is_ok() {
            EndpointType::Ip
        } else {
            EndpointType::Dns
        }
    }

    /// String form used as the script argument.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointType::Dns => "DNS",
            EndpointType::Ip => "IP",
        }
    }
}

/// Proxy settings threaded into the containerd proxy step.
///
/// Absent values render as empty-string arguments, keeping the argument
/// arity of the step stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    /// HTTP proxy URL
    pub http: Option<String>,
    /// HTTPS proxy URL
    pub https: Option<String>,
    /// Comma separated no-proxy list
    pub no_proxy: Option<String>,
}

impl ProxySettings {
    pub(crate) fn containerd_command(&self) -> String {
        script_command(
            Script::ConfigureContainerdProxy,
            [
                self.http.as_deref().unwrap_or(""),
                self.https.as_deref().unwrap_or(""),
                self.no_proxy.as_deref().unwrap_or(""),
            ],
        )
    }
}

/// Identity of a snap store proxy the machine should use instead of the
/// default store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapstoreProxy {
    /// URL scheme of the proxy, defaults to "http" when empty
    pub scheme: String,
    /// Domain of the proxy
    pub domain: String,
    /// Store id served by the proxy
    pub id: String,
}

impl SnapstoreProxy {
    pub(crate) fn command(&self) -> String {
        let scheme = if self.scheme.is_empty() {
            "http"
        } else {
            self.scheme.as_str()
        };
        script_command(
            Script::ConfigureSnapstoreProxy,
            [scheme, self.domain.as_str(), self.id.as_str()],
        )
    }
}

/// Builds the base plan every variant starts from: all step scripts staged
/// as write-files and the diagnostics marker as the first run command.
pub(crate) fn new_base_cloud_config() -> CloudConfig {
    CloudConfig {
        write_files: Script::ALL
            .iter()
            .map(|script| File {
                content: script.content().to_string(),
                path: script.path(),
                permissions: "0500".to_string(),
                owner: "root:root".to_string(),
            })
            .collect(),
        runcmd: vec!["set -x".to_string()],
        bootcmd: Vec::new(),
    }
}

/// Formats a script invocation with each argument double-quoted.
pub(crate) fn script_command<'a, I>(script: Script, args: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut command = script.path();
    for arg in args {
        command.push_str(" \"");
        command.push_str(arg);
        command.push('"');
    }
    command
}

pub(crate) fn validate_token(token: &str) -> Result<(), Error> {
    if token.len() != TOKEN_LENGTH {
        return Err(Error::InvalidToken {
            expected: TOKEN_LENGTH,
            actual: token.len(),
        });
    }
    Ok(())
}

pub(crate) fn validate_token_ttl(ttl: i64) -> Result<(), Error> {
    if ttl <= 0 {
        return Err(Error::InvalidTokenTTL(ttl));
    }
    Ok(())
}

/// Parses the kubernetes version, checks confinement legality and builds
/// the install argument. The legality check runs before the argument is
/// built for every variant.
pub(crate) fn resolve_install_argument(
    kubernetes_version: &str,
    confinement: Confinement,
    risk_level: &str,
) -> Result<String, Error> {
    let (major, minor) = channel::parse_version(kubernetes_version)?;
    channel::check_confinement(confinement, major, minor)?;
    Ok(channel::install_argument(confinement, risk_level, major, minor))
}

pub(crate) fn default_if_empty(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// Composes fully qualified join URLs, preserving caller order. The first
/// URL is the primary target; the join step falls back to the rest.
pub(crate) fn join_urls(node_ips: &[String], cluster_agent_port: &str, token: &str) -> Vec<String> {
    node_ips
        .iter()
        .map(|ip| format!("{ip}:{cluster_agent_port}/{token}"))
        .collect()
}

/// Builds the join step command from an ordered URL list.
pub(crate) fn join_command(worker: bool, urls: &[String]) -> String {
    let mut command = format!(
        "{} {}",
        Script::Join.path(),
        if worker { "yes" } else { "no" }
    );
    for url in urls {
        command.push_str(" \"");
        command.push_str(url);
        command.push('"');
    }
    command
}

/// File carrying extra kubelet arguments, rendered only when the argument
/// list is non-empty.
pub(crate) fn extra_kubelet_args_file(args: &[String]) -> Option<File> {
    if args.is_empty() {
        return None;
    }
    Some(File {
        content: args.join("\n"),
        path: EXTRA_KUBELET_ARGS_PATH.to_string(),
        permissions: "0400".to_string(),
        owner: "root:root".to_string(),
    })
}
