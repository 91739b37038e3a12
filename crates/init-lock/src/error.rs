//! Claim store errors

use thiserror::Error;

/// Errors surfaced by a claim store.
///
/// Store errors are transient conditions of the store itself and must stay
/// distinguishable from losing the acquisition race, which is not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Kubernetes API request failed
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Claim payload could not be serialized or deserialized
    #[error("Claim serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store is temporarily unreachable
    #[error("Claim store unavailable: {0}")]
    Unavailable(String),
}
