//! Single-writer cluster initialization lock.
//!
//! Exactly one machine may run the cluster initialization flow per cluster.
//! The lock is a named claim in a durable store with atomic
//! create-if-absent semantics; whoever creates the claim first owns
//! initialization, every other contender backs off and retries later.
//! Losing the race is an expected outcome, not an error, and is reported
//! as `false` from [`InitLock::lock`].
//!
//! The production store keeps the claim in a ConfigMap next to the cluster
//! ([`ConfigMapClaimStore`]); an in-memory store is available for tests.

pub mod claim;
pub mod configmap;
pub mod error;
pub mod lock;
pub mod store;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use claim::ClusterInitClaim;
pub use configmap::ConfigMapClaimStore;
pub use error::StoreError;
pub use lock::InitLock;
pub use store::{ClaimStore, CreateOutcome};
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryClaimStore;
