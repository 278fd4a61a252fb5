//! Engine hooks for the remote deployment.

use std::sync::Arc;

use gf_project::ProjectMetadata;
use gf_sim::{Chapter, RunLifecycle, TaskResult};

use crate::service::WorkflowService;

/// Enables the pipelines at run start and triggers the chapter DAG at each
/// chapter boundary.
pub struct WorkflowLifecycle {
    service: Arc<WorkflowService>,
}

impl WorkflowLifecycle {
    pub fn new(service: Arc<WorkflowService>) -> Self {
        Self { service }
    }
}

impl RunLifecycle for WorkflowLifecycle {
    fn on_run_start(&self, _metadata: &ProjectMetadata) -> TaskResult<()> {
        self.service.activate_dags()
    }

    fn on_chapter_start(
        &self,
        run_token: &str,
        chapter: Chapter,
        metadata: &ProjectMetadata,
    ) -> TaskResult<()> {
        self.service.start_chapter(run_token, chapter, metadata)
    }
}
