//! Per-container solver deployment.

use std::path::Path;
use std::sync::Arc;

use gf_sim::{TaskError, TaskResult};
use tracing::{debug, info};
use uuid::Uuid;

use crate::paths::format_host_path;
use crate::runtime::{BindMount, ContainerRuntime, ContainerSpec};

pub const HYDRUS_IMAGE: &str = "watermodelling/hydrus-1d-docker";
pub const MODFLOW_IMAGE: &str = "mjstealey/docker-modflow";
pub const IMAGE_TAG: &str = "latest";

/// Path the solver images expect the model directory at.
const WORKSPACE_BIND: &str = "/workspace";

/// The runtime control socket; never a workspace volume.
const CONTROL_SOCKET: &str = "/var/run/docker.sock";

/// Host path backing the shared workspace volume: an explicit override when
/// the orchestrator runs directly on the host, otherwise the orchestrator
/// container's own mount that is not the runtime control socket.
pub fn resolve_workspace_volume(
    runtime: &dyn ContainerRuntime,
    override_path: Option<&Path>,
    own_container: Option<&str>,
) -> TaskResult<String> {
    if let Some(path) = override_path {
        let absolute = std::path::absolute(path)?;
        return Ok(absolute.to_string_lossy().into_owned());
    }

    let own_container = own_container
        .ok_or_else(|| TaskError::new("no workspace volume override and no own container id"))?;
    let mounts = runtime.container_mounts(own_container)?;
    mounts
        .into_iter()
        .map(|mount| mount.source)
        .find(|source| !source.contains(CONTROL_SOCKET))
        .ok_or_else(|| {
            TaskError::new(format!(
                "container {own_container} has no workspace mount"
            ))
        })
}

/// Deploys one solver container and waits for it.
///
/// The container name is generated once per deployer (random token plus
/// solver and model id), so repeated deployment through the same deployer is
/// idempotent: an already-existing container is reused instead of created.
pub struct SolverDeployer {
    runtime: Arc<dyn ContainerRuntime>,
    image: &'static str,
    container_name: String,
    host_model_path: String,
    command: Option<Vec<String>>,
}

impl SolverDeployer {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        image: &'static str,
        solver: &str,
        model_id: &str,
        workspace_volume: &str,
        model_subpath: &str,
        command: Option<Vec<String>>,
    ) -> Self {
        let container_name = format!("{}-{solver}-{model_id}", Uuid::new_v4().simple());
        let host_model_path = format!("{}/{model_subpath}", format_host_path(workspace_volume));
        Self {
            runtime,
            image,
            container_name,
            host_model_path,
            command,
        }
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    /// Pull the image when it is not present locally.
    pub fn ensure_image(&self) -> TaskResult<()> {
        if self.runtime.inspect_image(self.image)?.is_some() {
            debug!(image = self.image, "image present");
        } else {
            info!(image = self.image, tag = IMAGE_TAG, "pulling image");
            self.runtime.pull_image(self.image, IMAGE_TAG)?;
        }
        Ok(())
    }

    /// Create and start the container unless it already exists.
    pub fn deploy(&self) -> TaskResult<()> {
        if self.runtime.inspect_container(&self.container_name)?.is_some() {
            debug!(container = %self.container_name, "container already exists");
            return Ok(());
        }

        info!(container = %self.container_name, image = self.image, "creating container");
        let spec = ContainerSpec {
            image: format!("{}:{IMAGE_TAG}", self.image),
            name: self.container_name.clone(),
            binds: vec![BindMount {
                host_path: self.host_model_path.clone(),
                container_path: WORKSPACE_BIND.to_owned(),
                read_only: false,
            }],
            command: self.command.clone(),
        };
        self.runtime.create_container(&spec)?;
        self.runtime.start_container(&self.container_name)?;
        Ok(())
    }

    /// Block until the container exits; non-zero exit fails the stage.
    pub fn wait_for_termination(&self) -> TaskResult<()> {
        let exit_code = self.runtime.wait_for_exit(&self.container_name)?;
        if exit_code == 0 {
            info!(container = %self.container_name, "calculations completed");
            Ok(())
        } else {
            Err(TaskError::new(format!(
                "container {} exited with code {exit_code}",
                self.container_name
            )))
        }
    }
}
