//! In-memory claim store for unit testing
//!
//! Stores claims in a mutex-protected map and can be switched into an
//! unavailable state to exercise the transient-error path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::claim::ClusterInitClaim;
use crate::error::StoreError;
use crate::store::{ClaimStore, CreateOutcome};

/// In-memory claim store for testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryClaimStore {
    claims: Arc<Mutex<HashMap<String, ClusterInitClaim>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryClaimStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches the store into or out of the unavailable state. While
    /// unavailable every operation fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the current claim for a cluster, if any.
    #[must_use]
    pub fn claim(&self, cluster_key: &str) -> Option<ClusterInitClaim> {
        self.claims.lock().unwrap().get(cluster_key).cloned()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store switched unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn create_if_absent(
        &self,
        claim: &ClusterInitClaim,
    ) -> Result<CreateOutcome, StoreError> {
        self.check_available()?;
        let mut claims = self.claims.lock().unwrap();
        if let Some(existing) = claims.get(&claim.cluster_key) {
            return Ok(CreateOutcome::AlreadyExists(Some(existing.clone())));
        }
        claims.insert(claim.cluster_key.clone(), claim.clone());
        Ok(CreateOutcome::Created)
    }

    async fn delete(&self, cluster_key: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.claims.lock().unwrap().remove(cluster_key).is_some())
    }
}
