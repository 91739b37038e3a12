//! The durable claim record written by the lock holder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record identifying which machine owns cluster initialization.
///
/// Stored verbatim in the claim store; readers use it to attribute the
/// lock and to re-enter it when the holder reconciles again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInitClaim {
    /// Stable key of the cluster being initialized
    pub cluster_key: String,
    /// Stable key of the machine holding the claim
    pub holder_machine_key: String,
    /// When the claim was acquired
    pub acquired_at: DateTime<Utc>,
}

impl ClusterInitClaim {
    /// Builds a claim acquired now.
    #[must_use]
    pub fn new(cluster_key: impl Into<String>, holder_machine_key: impl Into<String>) -> Self {
        Self {
            cluster_key: cluster_key.into(),
            holder_machine_key: holder_machine_key.into(),
            acquired_at: Utc::now(),
        }
    }
}
