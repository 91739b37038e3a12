//! SnapCluster Bootstrap Controller
//!
//! Cluster API bootstrap provider for snapk8s clusters. Reconciles
//! `SnapClusterConfig` resources into cloud-init bootstrap data: the first
//! control plane machine initializes the cluster (serialized through the
//! cluster init lock), later machines join it as control plane nodes or
//! workers. The rendered cloud-config lands in a secret consumed by the
//! infrastructure provider.

mod controller;
mod error;
mod reconcile_helpers;
#[cfg(test)]
mod reconcile_helpers_test;
mod reconciler;
mod token;

use crate::error::ControllerError;
use controller::Controller;
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting SnapCluster Bootstrap Controller");

    // Load configuration from environment variables
    let namespace = env::var("WATCH_NAMESPACE").ok();

    info!("Configuration:");
    info!(
        "  Namespace: {}",
        namespace.as_deref().unwrap_or("all namespaces")
    );

    // Initialize and run controller
    let controller = Controller::new(namespace).await?;
    controller.run().await?;

    Ok(())
}
