//! Workflow-engine HTTP API surface.

use serde_json::Value;

pub type ApiResult<T> = Result<T, ApiError>;

/// Transport failure or malformed engine response. Fatal to the stage that
/// observes it, identical in effect to a local solver crash.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ApiError> for gf_sim::TaskError {
    fn from(err: ApiError) -> Self {
        gf_sim::TaskError::new(err.to_string())
    }
}

pub trait WorkflowEngineApi: Send + Sync {
    /// Unpause every DAG whose id matches the pattern; returns the ids that
    /// were enabled.
    fn unpause_dags(&self, dag_id_pattern: &str) -> ApiResult<Vec<String>>;

    /// Trigger one DAG run with the given run id and configuration payload.
    fn trigger_dag_run(&self, dag_name: &str, dag_run_id: &str, conf: &Value) -> ApiResult<()>;

    /// Raw engine state token of one task instance.
    fn task_instance_state(
        &self,
        dag_name: &str,
        dag_run_id: &str,
        task_name: &str,
    ) -> ApiResult<String>;

    /// Raw state tokens of every dynamically-mapped instance of a task.
    fn mapped_task_instance_states(
        &self,
        dag_name: &str,
        dag_run_id: &str,
        task_name: &str,
    ) -> ApiResult<Vec<String>>;
}
