//! ClaimStore trait for the durable claim primitives
//!
//! The lock only ever needs two operations from its store: atomic
//! create-if-absent and delete. Keeping the boundary this narrow lets the
//! same lock logic run against the ConfigMap store in production and an
//! in-memory store in tests.

use crate::claim::ClusterInitClaim;
use crate::error::StoreError;

/// Result of an atomic create-if-absent attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The claim was created; the caller now holds the lock
    Created,
    /// A claim already existed. The current claim is included when the
    /// store could read it back, so callers can recognize their own claim.
    AlreadyExists(Option<ClusterInitClaim>),
}

/// Durable store for cluster initialization claims.
///
/// All async methods must be `Send` to work with Tokio's work-stealing
/// runtime.
#[async_trait::async_trait]
pub trait ClaimStore: Send + Sync {
    /// Atomically creates the claim for its cluster if no claim exists.
    ///
    /// Two concurrent calls for the same cluster must never both observe
    /// [`CreateOutcome::Created`].
    async fn create_if_absent(
        &self,
        claim: &ClusterInitClaim,
    ) -> Result<CreateOutcome, StoreError>;

    /// Deletes the claim for a cluster.
    ///
    /// Returns whether a claim was actually removed; deleting an absent
    /// claim is not an error.
    async fn delete(&self, cluster_key: &str) -> Result<bool, StoreError>;
}
