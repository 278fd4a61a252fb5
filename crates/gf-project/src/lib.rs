//! gf-project: project metadata schema, workspace layout and persistence.

pub mod config;
pub mod metadata;
pub mod paths;
pub mod store;

pub use config::RunnerConfig;
pub use metadata::{
    ModflowMetadata, ModflowStep, ProjectMetadata, ShapeAssignment, SimulationMode, StepKind,
};
pub use paths::{WorkspacePaths, feedback_model_name, scan_for_nam_file};
pub use store::{LocalProjectStore, ProjectStore};

use gf_core::ProjectId;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Project not found: {0}")]
    NotFound(ProjectId),

    #[error("Project {project_id} has no groundwater model attached")]
    MissingModflowModel { project_id: ProjectId },

    #[error("No .nam file found in model directory: {dir}")]
    NamFileNotFound { dir: std::path::PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
