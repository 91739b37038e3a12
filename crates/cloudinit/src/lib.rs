//! Cloud-init provisioning plans for snapk8s cluster bootstrap.
//!
//! This crate turns a declarative bootstrap intention (initialize a
//! cluster, join a control plane node, join a worker) into a deterministic,
//! ordered cloud-config plan: files to write, boot commands and run
//! commands. Compilation is pure; the plan is executed by an external
//! first-boot agent on the provisioned machine.
//!
//! Entry points:
//! - [`new_init_control_plane`] for the first control plane node
//! - [`new_join_control_plane`] for additional control plane nodes
//! - [`new_join_worker`] for worker nodes
//! - [`generate_cloud_config`] renders the compiled plan to bytes

mod channel;
mod cloud_config;
mod common;
mod controlplane_init;
mod controlplane_join;
mod error;
mod intent;
mod scripts;
mod worker_join;

#[cfg(test)]
mod cloudinit_common_test;

pub use channel::{install_argument, parse_version, Confinement};
pub use cloud_config::{generate_cloud_config, CloudConfig, File, CLOUD_CONFIG_HEADER};
pub use common::{
    EndpointType, ProxySettings, SnapstoreProxy, CAPI_AUTH_TOKEN_PATH, EXTRA_KUBELET_ARGS_PATH,
    TOKEN_LENGTH,
};
pub use controlplane_init::{new_init_control_plane, ControlPlaneInitInput};
pub use controlplane_join::{new_join_control_plane, ControlPlaneJoinInput};
pub use error::Error;
pub use intent::BootstrapIntent;
pub use scripts::{Script, SCRIPTS_DIR};
pub use worker_join::{new_join_worker, WorkerInput};
