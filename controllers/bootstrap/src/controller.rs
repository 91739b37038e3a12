//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the
//! SnapClusterConfig watch to the reconciler using
//! `kube_runtime::Controller`.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crds::SnapClusterConfig;
use futures::StreamExt;
use kube::{Api, Client};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::{watcher, Controller as ConfigController};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Main controller for SnapClusterConfig bootstrap data generation.
pub struct Controller {
    config_api: Api<SnapClusterConfig>,
    reconciler: Arc<Reconciler>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(namespace: Option<String>) -> Result<Self, ControllerError> {
        info!("Initializing SnapCluster Bootstrap Controller");

        let client = Client::try_default().await?;
        let config_api = match namespace.as_deref() {
            Some(ns) => Api::namespaced(client.clone(), ns),
            None => Api::all(client.clone()),
        };
        let reconciler = Arc::new(Reconciler::new(client));

        Ok(Self {
            config_api,
            reconciler,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("SnapCluster Bootstrap Controller running");

        // Error policy: requeue with a fixed backoff on errors; transient
        // conditions inside the reconciler requeue themselves earlier.
        let error_policy =
            |obj: Arc<SnapClusterConfig>, error: &ControllerError, _ctx: Arc<Reconciler>| {
                error!(
                    "Reconciliation error for SnapClusterConfig {:?}: {}",
                    obj.metadata.name, error
                );
                Action::requeue(Duration::from_secs(60))
            };

        let reconcile = |obj: Arc<SnapClusterConfig>, ctx: Arc<Reconciler>| async move {
            ctx.reconcile(&obj).await
        };

        // Bound concurrent reconciliations; the init lock serializes the
        // cluster-forming path separately.
        let controller_config = ControllerConfig::default().concurrency(3);

        ConfigController::new(self.config_api, watcher::Config::default())
            .with_config(controller_config)
            .run(reconcile, error_policy, self.reconciler)
            .for_each(|result| async move {
                if let Err(err) = result {
                    error!("Controller error: {}", err);
                }
            })
            .await;

        Ok(())
    }
}
