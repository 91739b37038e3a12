//! The bootstrap intent sum type.
//!
//! The three plan shapes are a closed set with exhaustive dispatch, so a
//! future fourth variant cannot silently skip validation or assembly.

use crate::cloud_config::CloudConfig;
use crate::controlplane_init::{new_init_control_plane, ControlPlaneInitInput};
use crate::controlplane_join::{new_join_control_plane, ControlPlaneJoinInput};
use crate::error::Error;
use crate::worker_join::{new_join_worker, WorkerInput};

/// A declarative bootstrap intention for one machine.
#[derive(Debug, Clone)]
pub enum BootstrapIntent {
    /// Form a new cluster from this first control plane node
    InitControlPlane(ControlPlaneInitInput),
    /// Join this node to the control plane of an existing cluster
    JoinControlPlane(ControlPlaneJoinInput),
    /// Join this node as a worker of an existing cluster
    JoinWorker(WorkerInput),
}

impl BootstrapIntent {
    /// Compiles the intent into an ordered provisioning plan.
    ///
    /// Validation failures are terminal for the attempt and produce no
    /// partial plan.
    pub fn compile(&self) -> Result<CloudConfig, Error> {
        match self {
            BootstrapIntent::InitControlPlane(input) => new_init_control_plane(input),
            BootstrapIntent::JoinControlPlane(input) => new_join_control_plane(input),
            BootstrapIntent::JoinWorker(input) => new_join_worker(input),
        }
    }
}
