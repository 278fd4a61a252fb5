//! Per-project run registry and asynchronous launch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use gf_core::ProjectId;
use gf_project::{ProjectMetadata, ProjectStore};
use tracing::{debug, error, info};

use crate::configurator::plan_chapters;
use crate::engine::{Run, RunEngine, SharedRun, lock_run};
use crate::error::{SimResult, SimulationError};
use crate::registry::ComponentRegistry;
use crate::status::ChapterStatusView;

/// Supervised handle of one in-flight run: the shared status state plus the
/// join handle of its background execution.
struct RunHandle {
    run: SharedRun,
    // Kept for supervision; dropping it on reclamation detaches the thread.
    _join: JoinHandle<SimResult<()>>,
}

/// Owns the registry of in-flight runs, launches execution in the
/// background and answers status queries.
pub struct SimulationService {
    registry: Arc<ComponentRegistry>,
    store: Arc<dyn ProjectStore>,
    runs: Mutex<HashMap<ProjectId, RunHandle>>,
}

impl SimulationService {
    pub fn new(registry: Arc<ComponentRegistry>, store: Arc<dyn ProjectStore>) -> Self {
        Self {
            registry,
            store,
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Plan and launch a run for a project; returns as soon as the
    /// background execution is registered. A second start for the same
    /// project id replaces the previous registration (last writer wins).
    pub fn start(&self, metadata: ProjectMetadata) -> SimResult<()> {
        let project_id = metadata.project_id.clone();
        info!(project = %project_id, "starting simulation");

        let chapters = plan_chapters(&metadata)?;

        let mut metadata = metadata;
        metadata.finished = false;
        self.store.save(&metadata)?;

        let run: SharedRun = Arc::new(Mutex::new(Run::new(metadata, chapters)));

        let engine = RunEngine::new(self.registry.clone());
        let thread_run = run.clone();
        let thread_project = project_id.clone();
        let join = std::thread::Builder::new()
            .name(format!("run-{project_id}"))
            .spawn(move || {
                let result = engine.run(&thread_run);
                if let Err(err) = &result {
                    error!(project = %thread_project, %err, "simulation run failed");
                }
                result
            })?;

        self.lock_runs()
            .insert(project_id, RunHandle { run, _join: join });
        Ok(())
    }

    /// Current status of every chapter of the project's run.
    ///
    /// Observing a finished run removes its registration as a side effect,
    /// so the next call for the same project id reports `NotFound`.
    pub fn status(&self, project_id: &ProjectId) -> SimResult<Vec<ChapterStatusView>> {
        debug!(project = %project_id, "checking simulation status");
        let mut runs = self.lock_runs();
        let handle = runs
            .get(project_id)
            .ok_or_else(|| SimulationError::NotFound(project_id.clone()))?;

        let (views, finished) = {
            let guard = lock_run(&handle.run);
            (guard.status_views(), guard.is_finished())
        };

        if finished {
            debug!(project = %project_id, "run finished, reclaiming registration");
            runs.remove(project_id);
        }
        Ok(views)
    }

    /// Whether a run is currently registered for the project.
    pub fn is_registered(&self, project_id: &ProjectId) -> bool {
        self.lock_runs().contains_key(project_id)
    }

    fn lock_runs(&self) -> MutexGuard<'_, HashMap<ProjectId, RunHandle>> {
        self.runs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
