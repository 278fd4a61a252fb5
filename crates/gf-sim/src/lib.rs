//! gf-sim: simulation orchestration core.
//!
//! Turns project configuration into an ordered chapter plan, executes it
//! against whichever deployment backend the component registry resolves, and
//! reports per-stage status to callers. The numeric work inside stage bodies
//! lives in the backend crates; this crate only sequences, dispatches and
//! reports.

pub mod chapter;
pub mod configurator;
pub mod engine;
pub mod error;
pub mod registry;
pub mod service;
pub mod status;
pub mod task;

pub use chapter::{Chapter, StageName};
pub use configurator::plan_chapters;
pub use engine::{Run, RunEngine, SharedRun, generate_run_token};
pub use error::{SimResult, SimulationError};
pub use registry::{ComponentRegistry, DeploymentProfile, RegistryBuilder};
pub use service::SimulationService;
pub use status::{ChapterStatus, ChapterStatusView, StageRecord, StageStatus, StageStatusView};
pub use task::{InProcessLifecycle, RunLifecycle, StageContext, StageTask, TaskError, TaskResult};
