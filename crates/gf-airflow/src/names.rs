//! Static name tables mapping chapters and stages onto the remote
//! pipelines.

use gf_sim::{Chapter, StageName};

/// Prefix of every pipeline belonging to this system; used to enable them
/// in one call at run start.
pub const DAG_ID_PREFIX: &str = "groundflow_";

/// DAG executing a chapter. Both warmup chapters run the same DAG; the
/// transfer direction is decided inside the pipeline from the triggering
/// payload.
pub const fn dag_name(chapter: Chapter) -> &'static str {
    match chapter {
        Chapter::SimpleCoupling => "groundflow_simple_coupling",
        Chapter::FeedbackWarmupSteadyState | Chapter::FeedbackWarmupTransient => {
            "groundflow_feedback_warmup_steady_state"
        }
        Chapter::FeedbackIteration => "groundflow_feedback_iteration",
        Chapter::FeedbackSimulationFinalization => "groundflow_feedback_finalization",
    }
}

/// Engine task name monitored for a stage. Several stages share a task:
/// the warmup solve is the ordinary HYDRUS task, and all MODFLOW→HYDRUS
/// transfers run the same transfer task.
pub const fn task_name(stage: StageName) -> &'static str {
    match stage {
        StageName::Initialization => "prepare-simulation-volume-content",
        StageName::WeatherDataTransfer => "transfer-weather-files",
        StageName::HydrusSimulation | StageName::HydrusSimulationWarmup => "hydrus-simulation",
        StageName::HydrusToModflowDataPassing => "transfer-hydrus-results-to-modflow",
        StageName::ModflowSimulation => "modflow-simulation",
        StageName::ModflowToHydrusDataPassing
        | StageName::ModflowInitConditionTransferSteadyState
        | StageName::ModflowInitConditionTransferTransient => {
            "transfer-modflow-results-to-hydrus"
        }
        StageName::OutputExtraction => "upload-simulation-results",
        StageName::Cleanup => "cleanup-simulation-volume-content",
        StageName::InitializeNewIterationFiles => "initialize-feedback-iteration",
        StageName::SaveReferenceHydrusModels => "create-reference-hydrus-models",
        StageName::CreatePerZoneHydrusModels => "create-per-zone-hydrus-models",
        StageName::IterationPreConfiguration | StageName::FeedbackSaveOutputIteration => {
            "iteration-pre-configuration"
        }
    }
}

/// Stages the pipelines fan out into one mapped instance per model.
pub const fn is_fan_out(stage: StageName) -> bool {
    matches!(
        stage,
        StageName::Initialization
            | StageName::HydrusSimulation
            | StageName::HydrusSimulationWarmup
            | StageName::ModflowSimulation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dag_name_carries_the_system_prefix() {
        for chapter in [
            Chapter::SimpleCoupling,
            Chapter::FeedbackWarmupSteadyState,
            Chapter::FeedbackWarmupTransient,
            Chapter::FeedbackIteration,
            Chapter::FeedbackSimulationFinalization,
        ] {
            assert!(dag_name(chapter).starts_with(DAG_ID_PREFIX));
        }
    }

    #[test]
    fn warmup_chapters_share_one_dag() {
        assert_eq!(
            dag_name(Chapter::FeedbackWarmupSteadyState),
            dag_name(Chapter::FeedbackWarmupTransient)
        );
    }

    #[test]
    fn every_stage_has_a_task_name() {
        for stage in StageName::ALL {
            assert!(!task_name(stage).is_empty());
        }
    }
}
