//! Controller-specific error types.
//!
//! This module defines error types specific to the bootstrap controller
//! that are not covered by upstream library errors.

use init_lock::StoreError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the bootstrap controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Cluster init lock store error
    #[error("Init lock error: {0}")]
    Lock(#[from] StoreError),

    /// Cloud-init plan compilation or rendering error
    #[error("Cloud-init error: {0}")]
    CloudInit(#[from] cloudinit::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A secret exists but is missing an expected data key
    #[error("Secret {secret} is missing key {key}")]
    MalformedSecret {
        /// Name of the secret
        secret: String,
        /// The missing data key
        key: String,
    },
}

impl ControllerError {
    /// Whether the error is terminal: retrying with the same inputs can
    /// never succeed. The plan compiler only rejects invalid input
    /// (malformed version, bad token, unsupported confinement), so its
    /// errors are surfaced on status instead of requeued.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControllerError::CloudInit(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_errors_are_terminal() {
        let err = ControllerError::CloudInit(cloudinit::Error::InvalidTokenTTL(0));
        assert!(err.is_terminal());

        let err =
            ControllerError::CloudInit(cloudinit::Error::InvalidVersion("latest".to_string()));
        assert!(err.is_terminal());
    }

    #[test]
    fn test_transient_errors_are_not_terminal() {
        let err = ControllerError::InvalidConfig("no version yet".to_string());
        assert!(!err.is_terminal());

        let err = ControllerError::Lock(StoreError::Unavailable("apiserver down".to_string()));
        assert!(!err.is_terminal());

        let err = ControllerError::MalformedSecret {
            secret: "cluster-a-ca".to_string(),
            key: "crt".to_string(),
        };
        assert!(!err.is_terminal());
    }
}
