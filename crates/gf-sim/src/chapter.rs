//! Chapters, stages and the static chapter→stages table.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Top-level phase of a run. The stage composition of each chapter is fixed
/// and deployment-independent; only the number of `FeedbackIteration`
/// chapters varies per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Chapter {
    SimpleCoupling,
    FeedbackWarmupSteadyState,
    FeedbackWarmupTransient,
    FeedbackIteration,
    FeedbackSimulationFinalization,
}

/// Single named unit of work within a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageName {
    Initialization,
    WeatherDataTransfer,
    HydrusSimulation,
    HydrusSimulationWarmup,
    HydrusToModflowDataPassing,
    ModflowSimulation,
    ModflowToHydrusDataPassing,
    ModflowInitConditionTransferSteadyState,
    ModflowInitConditionTransferTransient,
    OutputExtraction,
    Cleanup,
    InitializeNewIterationFiles,
    SaveReferenceHydrusModels,
    CreatePerZoneHydrusModels,
    IterationPreConfiguration,
    FeedbackSaveOutputIteration,
}

impl Chapter {
    /// Ordered stage list, mirroring the remote pipeline definitions.
    pub const fn stages(self) -> &'static [StageName] {
        use StageName::*;
        match self {
            Chapter::SimpleCoupling => &[
                Initialization,
                WeatherDataTransfer,
                HydrusSimulation,
                HydrusToModflowDataPassing,
                ModflowSimulation,
                OutputExtraction,
                Cleanup,
            ],
            Chapter::FeedbackWarmupSteadyState => &[
                Initialization,
                WeatherDataTransfer,
                SaveReferenceHydrusModels,
                CreatePerZoneHydrusModels,
                InitializeNewIterationFiles,
                ModflowInitConditionTransferSteadyState,
                HydrusSimulationWarmup,
            ],
            Chapter::FeedbackWarmupTransient => &[
                Initialization,
                WeatherDataTransfer,
                SaveReferenceHydrusModels,
                CreatePerZoneHydrusModels,
                InitializeNewIterationFiles,
                ModflowInitConditionTransferTransient,
                HydrusSimulationWarmup,
            ],
            Chapter::FeedbackIteration => &[
                IterationPreConfiguration,
                InitializeNewIterationFiles,
                ModflowToHydrusDataPassing,
                HydrusSimulation,
                HydrusToModflowDataPassing,
                ModflowSimulation,
            ],
            Chapter::FeedbackSimulationFinalization => &[
                FeedbackSaveOutputIteration,
                OutputExtraction,
                Cleanup,
            ],
        }
    }

    pub const fn snake_id(self) -> &'static str {
        match self {
            Chapter::SimpleCoupling => "simple_coupling",
            Chapter::FeedbackWarmupSteadyState => "feedback_warmup_steady_state",
            Chapter::FeedbackWarmupTransient => "feedback_warmup_transient",
            Chapter::FeedbackIteration => "feedback_iteration",
            Chapter::FeedbackSimulationFinalization => "feedback_simulation_finalization",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Chapter::SimpleCoupling => "Simple coupling",
            Chapter::FeedbackWarmupSteadyState => "Feedback warmup (steady state)",
            Chapter::FeedbackWarmupTransient => "Feedback warmup (transient)",
            Chapter::FeedbackIteration => "Feedback iteration",
            Chapter::FeedbackSimulationFinalization => "Feedback simulation finalization",
        }
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.snake_id())
    }
}

impl StageName {
    /// All stages, used by the registry to validate backend completeness.
    pub const ALL: [StageName; 16] = [
        StageName::Initialization,
        StageName::WeatherDataTransfer,
        StageName::HydrusSimulation,
        StageName::HydrusSimulationWarmup,
        StageName::HydrusToModflowDataPassing,
        StageName::ModflowSimulation,
        StageName::ModflowToHydrusDataPassing,
        StageName::ModflowInitConditionTransferSteadyState,
        StageName::ModflowInitConditionTransferTransient,
        StageName::OutputExtraction,
        StageName::Cleanup,
        StageName::InitializeNewIterationFiles,
        StageName::SaveReferenceHydrusModels,
        StageName::CreatePerZoneHydrusModels,
        StageName::IterationPreConfiguration,
        StageName::FeedbackSaveOutputIteration,
    ];

    pub const fn snake_id(self) -> &'static str {
        match self {
            StageName::Initialization => "initialization",
            StageName::WeatherDataTransfer => "weather_data_transfer",
            StageName::HydrusSimulation => "hydrus_simulation",
            StageName::HydrusSimulationWarmup => "hydrus_simulation_warmup",
            StageName::HydrusToModflowDataPassing => "hydrus_to_modflow_data_passing",
            StageName::ModflowSimulation => "modflow_simulation",
            StageName::ModflowToHydrusDataPassing => "modflow_to_hydrus_data_passing",
            StageName::ModflowInitConditionTransferSteadyState => {
                "modflow_init_condition_transfer_steady_state"
            }
            StageName::ModflowInitConditionTransferTransient => {
                "modflow_init_condition_transfer_transient"
            }
            StageName::OutputExtraction => "output_extraction",
            StageName::Cleanup => "cleanup",
            StageName::InitializeNewIterationFiles => "initialize_new_iteration_files",
            StageName::SaveReferenceHydrusModels => "save_reference_hydrus_models",
            StageName::CreatePerZoneHydrusModels => "create_per_zone_hydrus_models",
            StageName::IterationPreConfiguration => "iteration_pre_configuration",
            StageName::FeedbackSaveOutputIteration => "feedback_save_output_iteration",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            StageName::Initialization => "Initialization",
            StageName::WeatherDataTransfer => "Weather data transfer",
            StageName::HydrusSimulation => "HYDRUS simulation",
            StageName::HydrusSimulationWarmup => "HYDRUS simulation (warmup)",
            StageName::HydrusToModflowDataPassing => "HYDRUS to MODFLOW data passing",
            StageName::ModflowSimulation => "MODFLOW simulation",
            StageName::ModflowToHydrusDataPassing => "MODFLOW to HYDRUS data passing",
            StageName::ModflowInitConditionTransferSteadyState => {
                "MODFLOW initial condition transfer (steady state)"
            }
            StageName::ModflowInitConditionTransferTransient => {
                "MODFLOW initial condition transfer (transient)"
            }
            StageName::OutputExtraction => "Output extraction",
            StageName::Cleanup => "Cleanup",
            StageName::InitializeNewIterationFiles => "Initialize new iteration files",
            StageName::SaveReferenceHydrusModels => "Save reference HYDRUS models",
            StageName::CreatePerZoneHydrusModels => "Create per-zone HYDRUS models",
            StageName::IterationPreConfiguration => "Iteration pre-configuration",
            StageName::FeedbackSaveOutputIteration => "Save output iteration",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.snake_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_chapter_has_stages() {
        for chapter in [
            Chapter::SimpleCoupling,
            Chapter::FeedbackWarmupSteadyState,
            Chapter::FeedbackWarmupTransient,
            Chapter::FeedbackIteration,
            Chapter::FeedbackSimulationFinalization,
        ] {
            assert!(!chapter.stages().is_empty());
        }
    }

    #[test]
    fn warmup_chapters_differ_only_in_transfer_stage() {
        let steady = Chapter::FeedbackWarmupSteadyState.stages();
        let transient = Chapter::FeedbackWarmupTransient.stages();
        assert_eq!(steady.len(), transient.len());
        for (a, b) in steady.iter().zip(transient) {
            if *a == StageName::ModflowInitConditionTransferSteadyState {
                assert_eq!(*b, StageName::ModflowInitConditionTransferTransient);
            } else {
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn stage_tokens_are_snake_case() {
        for stage in StageName::ALL {
            let id = stage.snake_id();
            assert!(id.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
