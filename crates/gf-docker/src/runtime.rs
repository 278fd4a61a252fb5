//! Container-runtime control API.
//!
//! The orchestrator talks to the runtime through this trait; a production
//! implementation wraps the engine's HTTP socket, tests substitute an
//! in-memory fake.

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failure of a runtime control call (transport or API error).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RuntimeError {
    message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<RuntimeError> for gf_sim::TaskError {
    fn from(err: RuntimeError) -> Self {
        gf_sim::TaskError::new(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub name: String,
    pub running: bool,
}

/// One mount of a running container, as reported by inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub host_path: String,
    pub container_path: String,
    pub read_only: bool,
}

/// Everything needed to create one solver container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub name: String,
    pub binds: Vec<BindMount>,
    pub command: Option<Vec<String>>,
}

pub trait ContainerRuntime: Send + Sync {
    fn inspect_image(&self, image: &str) -> RuntimeResult<Option<ImageInfo>>;

    fn pull_image(&self, repository: &str, tag: &str) -> RuntimeResult<()>;

    fn inspect_container(&self, name: &str) -> RuntimeResult<Option<ContainerInfo>>;

    fn create_container(&self, spec: &ContainerSpec) -> RuntimeResult<()>;

    fn start_container(&self, name: &str) -> RuntimeResult<()>;

    /// Block until the container exits; returns its exit code.
    fn wait_for_exit(&self, name: &str) -> RuntimeResult<i64>;

    /// Mounts of an existing container, used to introspect the
    /// orchestrator's own workspace volume.
    fn container_mounts(&self, name: &str) -> RuntimeResult<Vec<MountPoint>>;
}
