//! Container deployment backend.
//!
//! Solver stages run inside containers controlled through the
//! [`ContainerRuntime`] collaborator API; the file-management stage bodies
//! are the shared ones from `gf-local`.

pub mod deployer;
pub mod docker_cli;
pub mod paths;
pub mod runtime;
pub mod stages;

pub use deployer::{SolverDeployer, resolve_workspace_volume};
pub use docker_cli::DockerCli;
pub use paths::format_host_path;
pub use runtime::{
    BindMount, ContainerInfo, ContainerRuntime, ContainerSpec, ImageInfo, MountPoint,
    RuntimeError, RuntimeResult,
};
pub use stages::{ContainerSolverRunner, register_docker_backend};
