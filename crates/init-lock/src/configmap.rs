//! ConfigMap-backed claim store.
//!
//! The claim lives in a ConfigMap named `{cluster_key}-init-lock` in the
//! cluster's namespace. The apiserver rejects a create for an existing
//! name with 409 Conflict, which gives the store its atomic
//! create-if-absent primitive without any coordination of our own.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Api, DeleteParams, ObjectMeta, PostParams};
use kube::Client;
use tracing::debug;

use crate::claim::ClusterInitClaim;
use crate::error::StoreError;
use crate::store::{ClaimStore, CreateOutcome};

/// ConfigMap data key holding the serialized claim.
const CLAIM_KEY: &str = "claim";

/// Claim store persisting claims as ConfigMaps.
#[derive(Clone)]
pub struct ConfigMapClaimStore {
    api: Api<ConfigMap>,
}

impl std::fmt::Debug for ConfigMapClaimStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigMapClaimStore").finish_non_exhaustive()
    }
}

impl ConfigMapClaimStore {
    /// Creates a store writing ConfigMaps into the given namespace.
    #[must_use]
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
        }
    }

    /// Name of the lock ConfigMap for a cluster.
    #[must_use]
    pub fn lock_name(cluster_key: &str) -> String {
        format!("{cluster_key}-init-lock")
    }

    async fn read_existing_claim(&self, name: &str) -> Result<Option<ClusterInitClaim>, StoreError> {
        let Some(config_map) = self.api.get_opt(name).await? else {
            // Deleted between our create attempt and this read.
            return Ok(None);
        };
        let Some(raw) = config_map
            .data
            .as_ref()
            .and_then(|data| data.get(CLAIM_KEY))
        else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(raw)?))
    }
}

#[async_trait::async_trait]
impl ClaimStore for ConfigMapClaimStore {
    async fn create_if_absent(
        &self,
        claim: &ClusterInitClaim,
    ) -> Result<CreateOutcome, StoreError> {
        let name = Self::lock_name(&claim.cluster_key);
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                ..ObjectMeta::default()
            },
            data: Some(BTreeMap::from([(
                CLAIM_KEY.to_string(),
                serde_json::to_string(claim)?,
            )])),
            ..ConfigMap::default()
        };

        match self.api.create(&PostParams::default(), &config_map).await {
            Ok(_) => {
                debug!(name = %name, holder = %claim.holder_machine_key, "created init lock claim");
                Ok(CreateOutcome::Created)
            }
            Err(kube::Error::Api(response)) if response.code == 409 => {
                let existing = self.read_existing_claim(&name).await?;
                Ok(CreateOutcome::AlreadyExists(existing))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, cluster_key: &str) -> Result<bool, StoreError> {
        let name = Self::lock_name(cluster_key);
        match self.api.delete(&name, &DeleteParams::default()).await {
            Ok(_) => {
                debug!(name = %name, "deleted init lock claim");
                Ok(true)
            }
            Err(kube::Error::Api(response)) if response.code == 404 => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_name() {
        assert_eq!(
            ConfigMapClaimStore::lock_name("my-cluster"),
            "my-cluster-init-lock"
        );
    }
}
