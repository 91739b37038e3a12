//! SnapCluster bootstrap CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the bootstrap controller,
//! plus partial mirrors of the Cluster API resources it consumes.

pub mod capi;
pub mod snap_cluster_config;
pub mod snap_cluster_config_template;

pub use capi::*;
pub use snap_cluster_config::*;
pub use snap_cluster_config_template::*;
