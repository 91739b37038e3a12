//! Structured cloud-config plans and their YAML rendering.
//!
//! The rendered output is parsed literally by the first-boot agent on the
//! provisioned machine, so the section order (write_files, runcmd, bootcmd)
//! and the per-file field order (content, path, permissions, owner) are a
//! compatibility contract. Serialization relies on serde emitting struct
//! fields in declaration order, which keeps the output byte-for-byte
//! reproducible for identical plans.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Header line expected by cloud-init at the top of the user data.
pub const CLOUD_CONFIG_HEADER: &str = "#cloud-config\n";

/// A file written to the machine before any command runs.
///
/// Field order matters: it fixes the key order in the rendered YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// File contents, written verbatim
    pub content: String,
    /// Absolute path on the machine
    pub path: String,
    /// Octal permission string, e.g. "0600"
    pub permissions: String,
    /// Owner specification, e.g. "root:root"
    pub owner: String,
}

/// An ordered provisioning plan for one machine.
///
/// Constructed exclusively by the plan compiler, consumed by
/// [`generate_cloud_config`]; plans are never mutated after compilation and
/// never reused across reconciliation attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Files staged before any command runs
    pub write_files: Vec<File>,
    /// Commands executed once, in order, on first boot
    pub runcmd: Vec<String>,
    /// Commands executed early in the boot process, in order
    pub bootcmd: Vec<String>,
}

/// Renders a plan to the cloud-config byte sequence handed to the machine.
///
/// Pure serialization: identical plans render to identical bytes. The only
/// failure mode is a YAML serialization error, which indicates a bug rather
/// than bad user input.
pub fn generate_cloud_config(config: &CloudConfig) -> Result<Vec<u8>, Error> {
    let rendered = serde_yaml::to_string(config)?;

    let mut out = Vec::with_capacity(CLOUD_CONFIG_HEADER.len() + rendered.len());
    out.extend_from_slice(CLOUD_CONFIG_HEADER.as_bytes());
    out.extend_from_slice(rendered.as_bytes());
    Ok(out)
}
