//! Prints the CRD manifests owned by this project to stdout.
//!
//! The Cluster API resources are installed by Cluster API itself and are
//! not emitted here.

use kube::CustomResourceExt;

use crds::{SnapClusterConfig, SnapClusterConfigTemplate};

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&SnapClusterConfig::crd())?);
    println!("---");
    print!(
        "{}",
        serde_yaml::to_string(&SnapClusterConfigTemplate::crd())?
    );
    Ok(())
}
