//! In-process deployment backend.
//!
//! File-management stage bodies delegate to a [`DataProcessor`]
//! collaborator; the solver stages launch the configured HYDRUS and MODFLOW
//! executables as child processes. The file-management bodies are shared
//! with the container deployment, which only replaces the two solver
//! stages.

pub mod processor;
pub mod solver;
pub mod stages;

pub use processor::{DataProcessor, ToolkitProcessor};
pub use solver::LocalSolverRunner;
pub use stages::{register_file_tasks, register_local_backend};
