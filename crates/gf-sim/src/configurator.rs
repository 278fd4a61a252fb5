//! Run planning: project configuration → ordered chapter list.

use gf_project::{ProjectMetadata, SimulationMode, StepKind};
use tracing::info;

use crate::chapter::Chapter;
use crate::error::{SimResult, SimulationError};

/// Build the ordered chapter plan for a project.
///
/// Simple coupling is a single chapter. Feedback mode derives its plan from
/// the groundwater model's step list: a warmup chapter selected by the first
/// step's kind, one iteration chapter per remaining step, and a finalization
/// chapter; N steps yield N+1 chapters.
pub fn plan_chapters(metadata: &ProjectMetadata) -> SimResult<Vec<Chapter>> {
    let chapters = match metadata.simulation_mode {
        SimulationMode::SimpleCoupling => vec![Chapter::SimpleCoupling],
        SimulationMode::WithFeedback => {
            let modflow = metadata.modflow_metadata.as_ref().ok_or_else(|| {
                SimulationError::Configuration(format!(
                    "project {} runs a feedback loop but has no groundwater model",
                    metadata.project_id
                ))
            })?;
            let first = modflow.steps_info.first().ok_or_else(|| {
                SimulationError::Configuration(format!(
                    "groundwater model {} has an empty step list",
                    modflow.modflow_id
                ))
            })?;

            let warmup = match first.kind {
                StepKind::SteadyState => Chapter::FeedbackWarmupSteadyState,
                StepKind::Transient => Chapter::FeedbackWarmupTransient,
            };
            let mut chapters = vec![warmup];
            chapters.extend(
                modflow.steps_info[1..]
                    .iter()
                    .map(|_| Chapter::FeedbackIteration),
            );
            chapters.push(Chapter::FeedbackSimulationFinalization);
            chapters
        }
    };

    info!(
        project = %metadata.project_id,
        ?chapters,
        "simulation plan configured"
    );
    Ok(chapters)
}
