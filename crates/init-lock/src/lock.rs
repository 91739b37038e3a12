//! Lock semantics on top of a claim store.

use tracing::{debug, info};

use crate::claim::ClusterInitClaim;
use crate::error::StoreError;
use crate::store::{ClaimStore, CreateOutcome};

/// Single-writer lock guarding cluster initialization.
///
/// `lock` reports acquisition as a boolean: `Ok(true)` means the caller
/// owns initialization (freshly acquired or re-entered), `Ok(false)` means
/// another machine does and the caller should retry later. Only store
/// failures are errors.
#[derive(Debug, Clone)]
pub struct InitLock<S> {
    store: S,
}

impl<S: ClaimStore> InitLock<S> {
    /// Wraps a claim store with lock semantics.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Attempts to acquire the initialization lock for a cluster on behalf
    /// of a machine.
    ///
    /// Re-entrant for the holder: a machine that already owns the claim
    /// acquires again without touching the store record, so a reconciler
    /// restarted mid-initialization resumes instead of deadlocking on its
    /// own lock.
    pub async fn lock(&self, cluster_key: &str, machine_key: &str) -> Result<bool, StoreError> {
        let claim = ClusterInitClaim::new(cluster_key, machine_key);
        match self.store.create_if_absent(&claim).await? {
            CreateOutcome::Created => {
                info!(cluster = %cluster_key, machine = %machine_key, "acquired cluster init lock");
                Ok(true)
            }
            CreateOutcome::AlreadyExists(Some(existing))
                if existing.holder_machine_key == machine_key =>
            {
                debug!(cluster = %cluster_key, machine = %machine_key, "re-entered own cluster init lock");
                Ok(true)
            }
            CreateOutcome::AlreadyExists(existing) => {
                debug!(
                    cluster = %cluster_key,
                    machine = %machine_key,
                    holder = existing.as_ref().map(|c| c.holder_machine_key.as_str()),
                    "cluster init lock held elsewhere"
                );
                Ok(false)
            }
        }
    }

    /// Releases the initialization lock for a cluster.
    ///
    /// Idempotent: releasing an absent lock succeeds so reconcilers can
    /// unlock unconditionally once the control plane reports initialized.
    pub async fn unlock(&self, cluster_key: &str) -> Result<(), StoreError> {
        if self.store.delete(cluster_key).await? {
            info!(cluster = %cluster_key, "released cluster init lock");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryClaimStore;

    #[tokio::test]
    async fn test_first_contender_wins() {
        let lock = InitLock::new(MemoryClaimStore::new());
        assert!(lock.lock("cluster-a", "machine-1").await.unwrap());
        assert!(!lock.lock("cluster-a", "machine-2").await.unwrap());
        assert!(!lock.lock("cluster-a", "machine-3").await.unwrap());
    }

    #[tokio::test]
    async fn test_holder_reenters() {
        let lock = InitLock::new(MemoryClaimStore::new());
        assert!(lock.lock("cluster-a", "machine-1").await.unwrap());
        assert!(lock.lock("cluster-a", "machine-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_clusters_are_independent() {
        let lock = InitLock::new(MemoryClaimStore::new());
        assert!(lock.lock("cluster-a", "machine-1").await.unwrap());
        assert!(lock.lock("cluster-b", "machine-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_unlock_lets_contender_acquire() {
        let lock = InitLock::new(MemoryClaimStore::new());
        assert!(lock.lock("cluster-a", "machine-1").await.unwrap());
        assert!(!lock.lock("cluster-a", "machine-2").await.unwrap());

        lock.unlock("cluster-a").await.unwrap();
        assert!(lock.lock("cluster-a", "machine-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_unlock_is_idempotent() {
        let lock = InitLock::new(MemoryClaimStore::new());
        lock.unlock("cluster-a").await.unwrap();

        assert!(lock.lock("cluster-a", "machine-1").await.unwrap());
        lock.unlock("cluster-a").await.unwrap();
        lock.unlock("cluster-a").await.unwrap();
    }

    #[tokio::test]
    async fn test_store_failure_is_not_contention() {
        let store = MemoryClaimStore::new();
        let lock = InitLock::new(store.clone());

        store.set_unavailable(true);
        assert!(matches!(
            lock.lock("cluster-a", "machine-1").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            lock.unlock("cluster-a").await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_unavailable(false);
        assert!(lock.lock("cluster-a", "machine-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_claim_records_holder() {
        let store = MemoryClaimStore::new();
        let lock = InitLock::new(store.clone());
        assert!(lock.lock("cluster-a", "machine-1").await.unwrap());

        let claim = store.claim("cluster-a").unwrap();
        assert_eq!(claim.cluster_key, "cluster-a");
        assert_eq!(claim.holder_machine_key, "machine-1");
    }
}
