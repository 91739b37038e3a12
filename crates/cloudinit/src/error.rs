//! Error types for provisioning plan compilation and rendering.
//!
//! All validation errors are terminal for the compilation attempt: the
//! caller must fix the input before retrying. Rendering errors indicate a
//! programming error and should never occur for a well-formed plan.

use thiserror::Error;

/// Errors that can occur while compiling or rendering a provisioning plan.
#[derive(Debug, Error)]
pub enum Error {
    /// The kubernetes version string could not be parsed as a semantic version
    #[error("Invalid kubernetes version: {0:?}")]
    InvalidVersion(String),

    /// The join token does not have the required length
    #[error("Join token must be exactly {expected} characters, got {actual}")]
    InvalidToken {
        /// Required token length
        expected: usize,
        /// Length of the supplied token
        actual: usize,
    },

    /// The join token TTL is not a positive number of seconds
    #[error("Join token TTL must be a positive number of seconds, got {0}")]
    InvalidTokenTTL(i64),

    /// Strict confinement requested for a kubernetes version that does not support it
    #[error("Strict confinement requires kubernetes v1.25 or newer, got v{major}.{minor}")]
    UnsupportedConfinement {
        /// Parsed major version
        major: u64,
        /// Parsed minor version
        minor: u64,
    },

    /// The plan could not be serialized to cloud-config YAML
    #[error("Failed to render cloud-config: {0}")]
    Render(#[from] serde_yaml::Error),
}
