//! Error taxonomy of the orchestration core.

use gf_core::ProjectId;

use crate::chapter::StageName;
use crate::registry::DeploymentProfile;

pub type SimResult<T> = Result<T, SimulationError>;

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Project configuration cannot be turned into a chapter plan.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Registry miss under the active deployment profile.
    #[error("No component '{id}' registered for the {profile} deployment")]
    ComponentUnavailable {
        id: String,
        profile: DeploymentProfile,
    },

    /// A stage body failed; always fatal to the run.
    #[error("Stage {stage} failed: {message}")]
    TaskExecution { stage: StageName, message: String },

    /// Backend-level failure outside any single stage (run or chapter
    /// activation on the remote engine).
    #[error("Deployment backend error: {0}")]
    Backend(String),

    /// Status query for a project with no registered run.
    #[error("No active simulation for project: {0}")]
    NotFound(ProjectId),

    #[error("Project error: {0}")]
    Project(#[from] gf_project::ProjectError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
