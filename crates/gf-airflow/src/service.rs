//! Chapter triggering and stage monitoring against the workflow engine.

use std::sync::Arc;
use std::time::Duration;

use gf_project::ProjectMetadata;
use gf_sim::{Chapter, StageName, StageStatus, TaskError, TaskResult};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::api::WorkflowEngineApi;
use crate::names::{DAG_ID_PREFIX, dag_name, is_fan_out, task_name};
use crate::storage::ObjectStorage;

/// Fixed interval between task-state polls.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Local status of one raw engine state token. Unknown tokens (queued,
/// scheduled, deferred, ...) count as pending.
pub fn classify_state(state: &str) -> StageStatus {
    match state {
        "success" | "skipped" => StageStatus::Success,
        "failed" | "upstream_failed" => StageStatus::Error,
        "running" => StageStatus::Running,
        _ => StageStatus::Pending,
    }
}

/// Fold mapped-instance statuses into one stage status, by precedence
/// Error > Running > Pending > Success: the fan-out only succeeds once
/// every instance has.
pub fn aggregate_states(states: impl IntoIterator<Item = StageStatus>) -> StageStatus {
    let mut aggregated = StageStatus::Success;
    for status in states {
        match status {
            StageStatus::Error => return StageStatus::Error,
            StageStatus::Running => aggregated = StageStatus::Running,
            StageStatus::Pending => {
                if aggregated != StageStatus::Running {
                    aggregated = StageStatus::Pending;
                }
            }
            StageStatus::Success => {}
        }
    }
    aggregated
}

/// Triggers pipelines and monitors their tasks for the remote deployment.
pub struct WorkflowService {
    api: Arc<dyn WorkflowEngineApi>,
    storage: Arc<dyn ObjectStorage>,
    poll_interval: Duration,
}

impl WorkflowService {
    pub fn new(api: Arc<dyn WorkflowEngineApi>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self::with_poll_interval(api, storage, POLL_INTERVAL)
    }

    pub fn with_poll_interval(
        api: Arc<dyn WorkflowEngineApi>,
        storage: Arc<dyn ObjectStorage>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            api,
            storage,
            poll_interval,
        }
    }

    /// Enable every pipeline of this system on the engine.
    pub fn activate_dags(&self) -> TaskResult<()> {
        let enabled = self.api.unpause_dags(DAG_ID_PREFIX)?;
        info!(?enabled, "enabled workflow pipelines");
        Ok(())
    }

    /// Trigger the chapter's DAG under the run token, with the full project
    /// configuration, its storage location and the feedback flag as the run
    /// payload.
    pub fn start_chapter(
        &self,
        run_token: &str,
        chapter: Chapter,
        metadata: &ProjectMetadata,
    ) -> TaskResult<()> {
        debug!(%chapter, run_token, "triggering chapter pipeline");
        let conf = self.chapter_conf(metadata)?;
        self.api
            .trigger_dag_run(dag_name(chapter), run_token, &conf)?;
        Ok(())
    }

    fn chapter_conf(&self, metadata: &ProjectMetadata) -> TaskResult<Value> {
        let mut simulation = serde_json::to_value(metadata)?;
        let fields = simulation
            .as_object_mut()
            .ok_or_else(|| TaskError::new("project configuration did not serialize to an object"))?;
        fields.insert(
            "project_storage_location".to_owned(),
            Value::String(self.storage.project_location(&metadata.project_id)),
        );
        fields.insert(
            "is_feedback_loop".to_owned(),
            Value::Bool(metadata.is_feedback_loop()),
        );
        Ok(json!({ "simulation": simulation }))
    }

    /// Poll the stage's engine task until it reaches a terminal
    /// classification. An Error classification fails the stage.
    pub fn monitor_stage(
        &self,
        run_token: &str,
        chapter: Chapter,
        stage: StageName,
    ) -> TaskResult<()> {
        let dag = dag_name(chapter);
        let task = task_name(stage);
        debug!(dag, task, run_token, "monitoring engine task");

        loop {
            let status = if is_fan_out(stage) {
                let states = self
                    .api
                    .mapped_task_instance_states(dag, run_token, task)?;
                aggregate_states(states.iter().map(|state| classify_state(state)))
            } else {
                classify_state(&self.api.task_instance_state(dag, run_token, task)?)
            };

            match status {
                StageStatus::Success => return Ok(()),
                StageStatus::Error => {
                    return Err(TaskError::new(format!("task {task} has failed")));
                }
                StageStatus::Pending | StageStatus::Running => {
                    std::thread::sleep(self.poll_interval);
                }
            }
        }
    }
}
