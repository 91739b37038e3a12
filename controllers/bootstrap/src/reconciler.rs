//! Reconciliation of SnapClusterConfig resources into bootstrap data.
//!
//! The flow mirrors the Cluster API bootstrap contract: wait for the
//! cluster infrastructure, then either initialize the cluster from the
//! first control plane machine (gated by the cluster init lock) or join an
//! additional machine to the existing control plane or worker pool. The
//! rendered cloud-config is stored in a secret named after the config and
//! announced through the status subresource.

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8s_openapi::ByteString;
use kube::api::{Api, ListParams, ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use kube_runtime::controller::Action;
use serde_json::json;
use tracing::{debug, error, info};

use cloudinit::{generate_cloud_config, BootstrapIntent};
use crds::{Cluster, Machine, SnapClusterConfig, CLUSTER_NAME_LABEL, CONTROL_PLANE_LABEL};
use init_lock::{ConfigMapClaimStore, InitLock};

use crate::error::ControllerError;
use crate::reconcile_helpers::{self as helpers, BootstrapContext};
use crate::token;

/// Fixed backoff applied whenever a transient condition blocks progress.
pub const REQUEUE_INTERVAL: Duration = Duration::from_secs(30);

/// Secret type marking Cluster API owned secrets.
const CLUSTER_SECRET_TYPE: &str = "cluster.x-k8s.io/secret";

/// Failure reason recorded when bootstrap data cannot be generated from
/// the given configuration.
const DATA_SECRET_GENERATION_FAILED_REASON: &str = "DataSecretGenerationFailed";

/// Reconciles SnapClusterConfig resources.
pub struct Reconciler {
    client: Client,
}

impl Reconciler {
    /// Creates a reconciler using the given Kubernetes client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn init_lock(&self, namespace: &str) -> InitLock<ConfigMapClaimStore> {
        InitLock::new(ConfigMapClaimStore::new(self.client.clone(), namespace))
    }

    /// Reconciles one SnapClusterConfig.
    ///
    /// Terminal errors (the plan compiler rejecting the configuration) are
    /// recorded on status and not requeued: retrying with the same inputs
    /// can never succeed, the configuration has to change.
    pub async fn reconcile(&self, config: &SnapClusterConfig) -> Result<Action, ControllerError> {
        match self.reconcile_config(config).await {
            Err(err) if err.is_terminal() => {
                error!(
                    "SnapClusterConfig {:?} cannot produce bootstrap data: {}",
                    config.metadata.name, err
                );
                self.patch_status_failed(config, &err).await?;
                Ok(Action::await_change())
            }
            result => result,
        }
    }

    async fn reconcile_config(&self, config: &SnapClusterConfig) -> Result<Action, ControllerError> {
        let name = config.name_any();
        let namespace = config.namespace().ok_or_else(|| {
            ControllerError::InvalidConfig(format!("SnapClusterConfig {name} has no namespace"))
        })?;

        let Some(machine) = self.owner_machine(&namespace, config).await? else {
            debug!("SnapClusterConfig {}/{} has no Machine owner yet, requeueing", namespace, name);
            return Ok(Action::requeue(REQUEUE_INTERVAL));
        };
        let machine_name = machine.name_any();
        let cluster_name = machine.spec.cluster_name.clone();
        if cluster_name.is_empty() {
            debug!("Machine {}/{} is not linked to a cluster yet, requeueing", namespace, machine_name);
            return Ok(Action::requeue(REQUEUE_INTERVAL));
        }

        let cluster_api: Api<Cluster> = Api::namespaced(self.client.clone(), &namespace);
        let Some(cluster) = cluster_api.get_opt(&cluster_name).await? else {
            info!("Cluster {}/{} does not exist yet, requeueing", namespace, cluster_name);
            return Ok(Action::requeue(REQUEUE_INTERVAL));
        };

        // A machine restored from a backup (or pivoted between management
        // clusters) already references its data secret; adopt it instead
        // of generating bootstrap data again.
        if let Some(secret_name) = machine.spec.bootstrap.data_secret_name.as_deref() {
            let status = config.status.as_ref();
            if !status.is_some_and(|s| s.ready && s.data_secret_name.is_some()) {
                info!(
                    "Adopting existing bootstrap data secret {} for SnapClusterConfig {}/{}",
                    secret_name, namespace, name
                );
                self.patch_status_ready(&namespace, &name, secret_name).await?;
            }
            return Ok(Action::await_change());
        }

        // Bootstrap data is generated exactly once per config.
        if config.status.as_ref().is_some_and(|s| s.ready) {
            return Ok(Action::await_change());
        }

        if cluster.spec.paused {
            debug!("Cluster {}/{} is paused, requeueing", namespace, cluster_name);
            return Ok(Action::requeue(REQUEUE_INTERVAL));
        }
        if !cluster.is_infrastructure_ready() {
            info!("Cluster {}/{} infrastructure is not ready, waiting", namespace, cluster_name);
            return Ok(Action::requeue(REQUEUE_INTERVAL));
        }

        let kubernetes_version = machine.spec.version.clone().ok_or_else(|| {
            ControllerError::InvalidConfig(format!(
                "Machine {namespace}/{machine_name} has no kubernetes version"
            ))
        })?;
        let endpoint = cluster
            .spec
            .control_plane_endpoint
            .as_ref()
            .map(|endpoint| endpoint.host.clone())
            .unwrap_or_default();
        if endpoint.is_empty() {
            info!("Cluster {}/{} has no control plane endpoint yet, requeueing", namespace, cluster_name);
            return Ok(Action::requeue(REQUEUE_INTERVAL));
        }

        if !cluster.is_control_plane_initialized() {
            return self
                .handle_cluster_not_initialized(
                    &namespace,
                    config,
                    &cluster_name,
                    &machine,
                    endpoint,
                    kubernetes_version,
                )
                .await;
        }

        // The control plane is up; release any claim left over from the
        // initialization attempt.
        self.init_lock(&namespace).unlock(&cluster_name).await?;

        let token =
            token::get_or_create_join_token(&self.client, &namespace, &cluster_name).await?;
        let ctx = BootstrapContext {
            spec: &config.spec,
            endpoint,
            kubernetes_version,
            token,
        };

        let join_node_ips = self.join_addresses(&namespace, &cluster_name).await?;
        if join_node_ips.is_empty() {
            info!("No running control plane machine to join via yet, requeueing");
            return Ok(Action::requeue(REQUEUE_INTERVAL));
        }

        let intent = if machine.is_control_plane() {
            info!("Creating bootstrap data for control plane machine {}/{}", namespace, machine_name);
            let auth_token =
                token::get_or_create_auth_token(&self.client, &namespace, &cluster_name).await?;
            BootstrapIntent::JoinControlPlane(helpers::control_plane_join_input(
                &ctx,
                auth_token,
                join_node_ips,
            ))
        } else {
            info!("Creating bootstrap data for worker machine {}/{}", namespace, machine_name);
            BootstrapIntent::JoinWorker(helpers::worker_input(&ctx, join_node_ips))
        };

        let data = generate_cloud_config(&intent.compile()?)?;
        self.store_bootstrap_data(&namespace, config, &cluster_name, &data)
            .await?;
        Ok(Action::await_change())
    }

    /// Initialization path: only the first control plane machine proceeds,
    /// everyone else backs off until the control plane reports
    /// initialized.
    async fn handle_cluster_not_initialized(
        &self,
        namespace: &str,
        config: &SnapClusterConfig,
        cluster_name: &str,
        machine: &Machine,
        endpoint: String,
        kubernetes_version: String,
    ) -> Result<Action, ControllerError> {
        if !machine.is_control_plane() {
            debug!("Cluster {}/{} control plane is not initialized, worker waits", namespace, cluster_name);
            return Ok(Action::requeue(REQUEUE_INTERVAL));
        }

        let machine_name = machine.name_any();
        let lock = self.init_lock(namespace);
        if !lock.lock(cluster_name, &machine_name).await? {
            info!(
                "Another machine is already initializing cluster {}/{}, requeueing",
                namespace, cluster_name
            );
            return Ok(Action::requeue(REQUEUE_INTERVAL));
        }

        // A transient requeue below keeps the claim: the holder re-enters
        // on retry. Only a failed attempt releases it so another machine
        // can take over.
        match self
            .create_init_bootstrap_data(namespace, config, cluster_name, endpoint, kubernetes_version)
            .await
        {
            Ok(action) => Ok(action),
            Err(err) => {
                if let Err(unlock_err) = lock.unlock(cluster_name).await {
                    error!(
                        "Failed to release init lock for cluster {}/{}: {}",
                        namespace, cluster_name, unlock_err
                    );
                }
                Err(err)
            }
        }
    }

    async fn create_init_bootstrap_data(
        &self,
        namespace: &str,
        config: &SnapClusterConfig,
        cluster_name: &str,
        endpoint: String,
        kubernetes_version: String,
    ) -> Result<Action, ControllerError> {
        info!("Creating bootstrap data for the init control plane of cluster {}/{}", namespace, cluster_name);

        let token = token::get_or_create_join_token(&self.client, namespace, cluster_name).await?;
        let Some((ca_cert, ca_key)) =
            token::get_cluster_ca(&self.client, namespace, cluster_name).await?
        else {
            info!("Cluster {}/{} CA secret is not available yet, requeueing", namespace, cluster_name);
            return Ok(Action::requeue(REQUEUE_INTERVAL));
        };

        let ctx = BootstrapContext {
            spec: &config.spec,
            endpoint,
            kubernetes_version,
            token,
        };
        let intent = BootstrapIntent::InitControlPlane(helpers::init_input(&ctx, ca_cert, ca_key));
        let data = generate_cloud_config(&intent.compile()?)?;
        self.store_bootstrap_data(namespace, config, cluster_name, &data)
            .await?;
        Ok(Action::await_change())
    }

    /// Resolves the Machine owning a config through its owner references.
    async fn owner_machine(
        &self,
        namespace: &str,
        config: &SnapClusterConfig,
    ) -> Result<Option<Machine>, ControllerError> {
        let Some(owner) = config
            .owner_references()
            .iter()
            .find(|reference| reference.kind == "Machine")
        else {
            return Ok(None);
        };
        let api: Api<Machine> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(&owner.name).await?)
    }

    /// Addresses of control plane machines a joining node can connect to.
    async fn join_addresses(
        &self,
        namespace: &str,
        cluster_name: &str,
    ) -> Result<Vec<String>, ControllerError> {
        let api: Api<Machine> = Api::namespaced(self.client.clone(), namespace);
        let selector = format!("{CLUSTER_NAME_LABEL}={cluster_name},{CONTROL_PLANE_LABEL}");
        let machines = api.list(&ListParams::default().labels(&selector)).await?;
        Ok(helpers::join_addresses(&machines.items))
    }

    /// Stores the rendered cloud-config in the bootstrap data secret and
    /// marks the config ready.
    async fn store_bootstrap_data(
        &self,
        namespace: &str,
        config: &SnapClusterConfig,
        cluster_name: &str,
        data: &[u8],
    ) -> Result<(), ControllerError> {
        let name = config.name_any();
        let uid = config.uid().ok_or_else(|| {
            ControllerError::InvalidConfig(format!("SnapClusterConfig {namespace}/{name} has no uid"))
        })?;

        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(namespace.to_string()),
                labels: Some(BTreeMap::from([(
                    CLUSTER_NAME_LABEL.to_string(),
                    cluster_name.to_string(),
                )])),
                owner_references: Some(vec![OwnerReference {
                    api_version: SnapClusterConfig::api_version(&()).to_string(),
                    kind: SnapClusterConfig::kind(&()).to_string(),
                    name: name.clone(),
                    uid,
                    controller: Some(true),
                    ..OwnerReference::default()
                }]),
                ..ObjectMeta::default()
            },
            data: Some(BTreeMap::from([
                ("value".to_string(), ByteString(data.to_vec())),
                ("format".to_string(), ByteString(b"cloud-config".to_vec())),
            ])),
            type_: Some(CLUSTER_SECRET_TYPE.to_string()),
            ..Secret::default()
        };

        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match api.create(&PostParams::default(), &secret).await {
            Ok(_) => {}
            Err(kube::Error::Api(response)) if response.code == 409 => {
                info!("Bootstrap data secret {}/{} already exists, updating", namespace, name);
                let mut existing = api.get(&name).await?;
                existing.data.clone_from(&secret.data);
                api.replace(&name, &PostParams::default(), &existing).await?;
            }
            Err(err) => return Err(err.into()),
        }

        self.patch_status_ready(namespace, &name, &name).await
    }

    /// Records a terminal failure on status.
    async fn patch_status_failed(
        &self,
        config: &SnapClusterConfig,
        error: &ControllerError,
    ) -> Result<(), ControllerError> {
        let name = config.name_any();
        let namespace = config.namespace().ok_or_else(|| {
            ControllerError::InvalidConfig(format!("SnapClusterConfig {name} has no namespace"))
        })?;

        let api: Api<SnapClusterConfig> = Api::namespaced(self.client.clone(), &namespace);
        let status_patch = json!({
            "status": {
                "failureReason": DATA_SECRET_GENERATION_FAILED_REASON,
                "failureMessage": error.to_string(),
                "lastReconciled": chrono::Utc::now(),
            }
        });
        api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&status_patch))
            .await?;
        Ok(())
    }

    /// Marks the config ready and announces its data secret.
    async fn patch_status_ready(
        &self,
        namespace: &str,
        name: &str,
        secret_name: &str,
    ) -> Result<(), ControllerError> {
        let api: Api<SnapClusterConfig> = Api::namespaced(self.client.clone(), namespace);
        let status_patch = json!({
            "status": {
                "ready": true,
                "dataSecretName": secret_name,
                "lastReconciled": chrono::Utc::now(),
            }
        });
        api.patch_status(name, &PatchParams::default(), &Patch::Merge(&status_patch))
            .await?;
        info!("SnapClusterConfig {}/{} bootstrap data is ready in secret {}", namespace, name, secret_name);
        Ok(())
    }
}
