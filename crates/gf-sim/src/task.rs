//! Stage task bodies and the per-deployment run lifecycle seam.

use gf_project::ProjectMetadata;

use crate::chapter::{Chapter, StageName};

pub type TaskResult<T> = Result<T, TaskError>;

/// Failure of a stage body. Backends fold their own error types into this;
/// the engine records the message verbatim and aborts the run.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TaskError {
    message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for TaskError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<gf_project::ProjectError> for TaskError {
    fn from(err: gf_project::ProjectError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Everything a stage body gets to see about the run it executes in.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub metadata: &'a ProjectMetadata,
    /// Human-diagnostic token unique per (project, chapter, start time).
    pub run_token: &'a str,
    pub chapter: Chapter,
    pub stage: StageName,
}

/// One unit of work, opaque to the engine. The three deployment backends
/// supply structurally different implementations for the same stage names.
pub trait StageTask: Send + Sync {
    fn execute(&self, ctx: &StageContext<'_>) -> TaskResult<()>;
}

impl<F> StageTask for F
where
    F: for<'a> Fn(&StageContext<'a>) -> TaskResult<()> + Send + Sync,
{
    fn execute(&self, ctx: &StageContext<'_>) -> TaskResult<()> {
        self(ctx)
    }
}

/// Hooks the engine calls at run and chapter boundaries. The in-process
/// backends need none; the remote workflow-engine backend uses them to
/// enable its pipelines and trigger chapter runs.
pub trait RunLifecycle: Send + Sync {
    fn on_run_start(&self, _metadata: &ProjectMetadata) -> TaskResult<()> {
        Ok(())
    }

    fn on_chapter_start(
        &self,
        _run_token: &str,
        _chapter: Chapter,
        _metadata: &ProjectMetadata,
    ) -> TaskResult<()> {
        Ok(())
    }
}

/// Lifecycle for backends that execute chapters inside this process.
#[derive(Debug, Default)]
pub struct InProcessLifecycle;

impl RunLifecycle for InProcessLifecycle {}
