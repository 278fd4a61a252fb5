//! Run state and the sequential chapter executor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use gf_core::ProjectId;
use gf_project::ProjectMetadata;
use tracing::{error, info};

use crate::chapter::{Chapter, StageName};
use crate::error::{SimResult, SimulationError};
use crate::registry::ComponentRegistry;
use crate::status::{ChapterStatus, ChapterStatusView, StageStatus};
use crate::task::StageContext;

/// Diagnostic key for cumulative chapter time, recorded when the
/// groundwater solve completes.
const TOTAL_TIMING_KEY: &str = "TOTAL";

/// One started simulation: project configuration, per-chapter status and
/// wall-time diagnostics. Mutated in place by the engine's background
/// execution, read by arbitrarily many status queries.
#[derive(Debug)]
pub struct Run {
    metadata: ProjectMetadata,
    chapters: Vec<ChapterStatus>,
    timings: HashMap<String, Duration>,
}

impl Run {
    pub fn new(metadata: ProjectMetadata, chapters: Vec<Chapter>) -> Self {
        Self {
            metadata,
            chapters: chapters.into_iter().map(ChapterStatus::new).collect(),
            timings: HashMap::new(),
        }
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn chapter_statuses(&self) -> &[ChapterStatus] {
        &self.chapters
    }

    pub fn status_views(&self) -> Vec<ChapterStatusView> {
        self.chapters
            .iter()
            .enumerate()
            .map(|(idx, chapter)| chapter.to_view(idx))
            .collect()
    }

    /// A run is finished iff the last stage of its last chapter is terminal.
    pub fn is_finished(&self) -> bool {
        self.chapters
            .last()
            .is_some_and(|chapter| chapter.is_finished())
    }

    pub fn timings(&self) -> &HashMap<String, Duration> {
        &self.timings
    }

    fn record_timing(&mut self, key: impl Into<String>, elapsed: Duration) {
        self.timings.insert(key.into(), elapsed);
    }
}

pub type SharedRun = Arc<Mutex<Run>>;

/// Lock a shared run, recovering the data from a poisoned mutex: the
/// poisoning thread already recorded its failure into the status model.
pub(crate) fn lock_run(run: &SharedRun) -> MutexGuard<'_, Run> {
    run.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Human-diagnostic unique token for one chapter execution.
pub fn generate_run_token(project_id: &ProjectId, chapter: Chapter) -> String {
    format!(
        "{project_id}-{}-{}",
        chapter.snake_id(),
        chrono::Utc::now().to_rfc3339()
    )
}

/// Executes a chapter plan sequentially to completion. Identical across all
/// deployment profiles; everything backend-specific is resolved through the
/// component registry.
pub struct RunEngine {
    registry: Arc<ComponentRegistry>,
}

impl RunEngine {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self { registry }
    }

    /// Run every chapter in order. The first stage failure aborts the run;
    /// there are no retries anywhere in this engine.
    pub fn run(&self, run: &SharedRun) -> SimResult<()> {
        let metadata = lock_run(run).metadata().clone();
        info!(project = %metadata.project_id, "starting simulation run");

        let lifecycle = self.registry.lifecycle();
        lifecycle
            .on_run_start(&metadata)
            .map_err(|err| SimulationError::Backend(err.to_string()))?;

        let chapter_count = lock_run(run).chapter_statuses().len();
        for chapter_idx in 0..chapter_count {
            self.run_chapter(run, chapter_idx, &metadata)?;
        }

        info!(project = %metadata.project_id, "simulation run completed");
        Ok(())
    }

    fn run_chapter(
        &self,
        run: &SharedRun,
        chapter_idx: usize,
        metadata: &ProjectMetadata,
    ) -> SimResult<()> {
        let chapter = lock_run(run).chapter_statuses()[chapter_idx].chapter();
        info!(project = %metadata.project_id, %chapter, "running chapter");

        let chapter_started = Instant::now();
        let run_token = generate_run_token(&metadata.project_id, chapter);

        self.registry
            .lifecycle()
            .on_chapter_start(&run_token, chapter, metadata)
            .map_err(|err| SimulationError::Backend(err.to_string()))?;

        for (stage_idx, &stage) in chapter.stages().iter().enumerate() {
            lock_run(run).chapters[chapter_idx].set_stage_status(
                stage_idx,
                StageStatus::Running,
                None,
            );
            info!(project = %metadata.project_id, %stage, "running stage");

            let task = self.registry.task(stage)?;
            let ctx = StageContext {
                metadata,
                run_token: &run_token,
                chapter,
                stage,
            };

            let stage_started = Instant::now();
            match task.execute(&ctx) {
                Ok(()) => {
                    let elapsed = stage_started.elapsed();
                    let mut guard = lock_run(run);
                    guard.chapters[chapter_idx].set_stage_status(
                        stage_idx,
                        StageStatus::Success,
                        None,
                    );
                    guard.record_timing(stage.snake_id(), elapsed);
                    if stage == StageName::ModflowSimulation {
                        guard.record_timing(TOTAL_TIMING_KEY, chapter_started.elapsed());
                    }
                    drop(guard);
                    info!(project = %metadata.project_id, %stage, ?elapsed, "stage succeeded");
                }
                Err(err) => {
                    let message = err.to_string();
                    lock_run(run).chapters[chapter_idx].set_stage_status(
                        stage_idx,
                        StageStatus::Error,
                        Some(message.clone()),
                    );
                    error!(
                        project = %metadata.project_id,
                        %stage,
                        %message,
                        "stage failed, simulation interrupted"
                    );
                    return Err(SimulationError::TaskExecution { stage, message });
                }
            }
        }

        info!(project = %metadata.project_id, %chapter, "chapter completed");
        Ok(())
    }
}
