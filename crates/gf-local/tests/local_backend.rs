//! Local backend tests: delegation of file-management stages and solver
//! process launching.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use gf_core::{HydrusId, ModflowId, ProjectId, ShapeId};
use gf_local::{DataProcessor, LocalSolverRunner, register_file_tasks, register_local_backend};
use gf_project::{
    ModflowMetadata, ModflowStep, ProjectMetadata, ShapeAssignment, SimulationMode, StepKind,
    WorkspacePaths,
};
use gf_sim::{
    Chapter, ComponentRegistry, DeploymentProfile, InProcessLifecycle, RegistryBuilder,
    StageContext, StageName, TaskResult,
};

#[derive(Default)]
struct RecordingProcessor {
    operations: Mutex<Vec<String>>,
}

impl RecordingProcessor {
    fn record(&self, operation: impl Into<String>) -> TaskResult<()> {
        self.operations.lock().unwrap().push(operation.into());
        Ok(())
    }

    fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }
}

impl DataProcessor for RecordingProcessor {
    fn initialize_simulation_files(&self, _: &ProjectMetadata) -> TaskResult<()> {
        self.record("initialize_simulation_files")
    }

    fn transfer_weather_data(&self, _: &ProjectMetadata) -> TaskResult<()> {
        self.record("transfer_weather_data")
    }

    fn preserve_reference_models(&self, _: &ProjectMetadata) -> TaskResult<()> {
        self.record("preserve_reference_models")
    }

    fn create_per_zone_models(&self, _: &ProjectMetadata) -> TaskResult<()> {
        self.record("create_per_zone_models")
    }

    fn initialize_feedback_iteration(&self, _: &ProjectMetadata) -> TaskResult<()> {
        self.record("initialize_feedback_iteration")
    }

    fn pre_configure_iteration(&self, _: &ProjectMetadata) -> TaskResult<()> {
        self.record("pre_configure_iteration")
    }

    fn transfer_hydrus_to_modflow(&self, _: &ProjectMetadata) -> TaskResult<()> {
        self.record("transfer_hydrus_to_modflow")
    }

    fn transfer_modflow_to_hydrus(
        &self,
        _: &ProjectMetadata,
        use_modflow_results: bool,
    ) -> TaskResult<()> {
        self.record(format!("transfer_modflow_to_hydrus({use_modflow_results})"))
    }

    fn extract_output(&self, _: &ProjectMetadata) -> TaskResult<()> {
        self.record("extract_output")
    }
}

fn metadata(mode: SimulationMode) -> ProjectMetadata {
    ProjectMetadata {
        project_id: ProjectId::new("p1"),
        start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        spin_up: 0,
        simulation_mode: mode,
        modflow_metadata: Some(ModflowMetadata {
            modflow_id: ModflowId::new("mf1"),
            grid_unit: "m".to_owned(),
            steps_info: vec![ModflowStep {
                kind: StepKind::SteadyState,
                duration_days: 10,
            }],
        }),
        shapes_to_hydrus: BTreeMap::from([
            ("s1".into(), ShapeAssignment::Hydrus(HydrusId::new("h1"))),
            ("s2".into(), ShapeAssignment::Hydrus(HydrusId::new("h2"))),
        ]),
        hydrus_to_weather: BTreeMap::new(),
        finished: false,
    }
}

fn local_registry(
    processor: Arc<RecordingProcessor>,
    hydrus_program: &str,
    modflow_program: &str,
    workspace: impl Into<PathBuf>,
) -> ComponentRegistry {
    let mut builder = RegistryBuilder::new();
    register_local_backend(
        &mut builder,
        processor,
        Arc::new(LocalSolverRunner::new(
            hydrus_program,
            modflow_program,
            WorkspacePaths::new(workspace),
        )),
    );
    builder.finalize(DeploymentProfile::Local).unwrap()
}

fn execute(registry: &ComponentRegistry, stage: StageName, metadata: &ProjectMetadata) -> TaskResult<()> {
    let ctx = StageContext {
        metadata,
        run_token: "p1-test-token",
        chapter: Chapter::SimpleCoupling,
        stage,
    };
    registry.task(stage).unwrap().execute(&ctx)
}

fn temp_workspace(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("gf-local-{tag}-{}", std::process::id()))
}

#[test]
fn file_stages_delegate_to_the_processor() {
    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(processor.clone(), "true", "true", "ws");
    let metadata = metadata(SimulationMode::WithFeedback);

    for stage in [
        StageName::Initialization,
        StageName::WeatherDataTransfer,
        StageName::SaveReferenceHydrusModels,
        StageName::CreatePerZoneHydrusModels,
        StageName::InitializeNewIterationFiles,
        StageName::IterationPreConfiguration,
        StageName::HydrusToModflowDataPassing,
        StageName::OutputExtraction,
    ] {
        execute(&registry, stage, &metadata).unwrap();
    }

    assert_eq!(
        processor.operations(),
        vec![
            "initialize_simulation_files",
            "transfer_weather_data",
            "preserve_reference_models",
            "create_per_zone_models",
            "initialize_feedback_iteration",
            "pre_configure_iteration",
            "transfer_hydrus_to_modflow",
            "extract_output",
        ]
    );
}

#[test]
fn saving_the_output_iteration_reuses_the_iteration_snapshot() {
    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(processor.clone(), "true", "true", "ws");

    execute(
        &registry,
        StageName::FeedbackSaveOutputIteration,
        &metadata(SimulationMode::WithFeedback),
    )
    .unwrap();

    assert_eq!(processor.operations(), vec!["pre_configure_iteration"]);
}

#[test]
fn transient_init_transfer_skips_solver_results() {
    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(processor.clone(), "true", "true", "ws");
    let metadata = metadata(SimulationMode::WithFeedback);

    execute(&registry, StageName::ModflowToHydrusDataPassing, &metadata).unwrap();
    execute(
        &registry,
        StageName::ModflowInitConditionTransferTransient,
        &metadata,
    )
    .unwrap();

    assert_eq!(
        processor.operations(),
        vec![
            "transfer_modflow_to_hydrus(true)",
            "transfer_modflow_to_hydrus(false)",
        ]
    );
}

#[test]
fn cleanup_keeps_results_in_place() {
    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(processor.clone(), "true", "true", "ws");

    execute(&registry, StageName::Cleanup, &metadata(SimulationMode::SimpleCoupling)).unwrap();

    assert!(processor.operations().is_empty());
}

#[test]
fn file_tasks_alone_do_not_satisfy_the_container_profile() {
    let mut builder = RegistryBuilder::new();
    register_file_tasks(&mut builder, Arc::new(RecordingProcessor::default()));
    builder.register_lifecycle(DeploymentProfile::Docker, Arc::new(InProcessLifecycle));

    // The solver stages are still missing under the container profile.
    assert!(builder.finalize(DeploymentProfile::Docker).is_err());
}

#[test]
fn hydrus_stage_runs_one_solver_per_model() {
    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(processor, "true", "true", "ws");

    execute(
        &registry,
        StageName::HydrusSimulation,
        &metadata(SimulationMode::SimpleCoupling),
    )
    .unwrap();
}

#[test]
fn failing_solver_fails_the_stage() {
    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(processor, "false", "true", "ws");

    let err = execute(
        &registry,
        StageName::HydrusSimulation,
        &metadata(SimulationMode::SimpleCoupling),
    )
    .unwrap_err();
    assert!(err.to_string().contains("exited with"));
}

#[test]
fn hydrus_fan_out_is_capped_at_eight_concurrent_solvers() {
    let workspace = temp_workspace("pool-cap");
    std::fs::create_dir_all(&workspace).unwrap();
    let solver = workspace.join("slow-solver");
    std::fs::write(&solver, "#!/bin/sh\nsleep 0.1\n").unwrap();
    let mut permissions = std::fs::metadata(&solver).unwrap().permissions();
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(0o755);
    }
    std::fs::set_permissions(&solver, permissions).unwrap();

    let mut metadata = metadata(SimulationMode::SimpleCoupling);
    metadata.shapes_to_hydrus = (0..12)
        .map(|i| {
            (
                ShapeId::new(format!("s{i:02}")),
                ShapeAssignment::Hydrus(HydrusId::new(format!("h{i:02}"))),
            )
        })
        .collect();

    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(
        processor,
        solver.to_str().unwrap(),
        "true",
        &workspace,
    );

    let started = Instant::now();
    execute(&registry, StageName::HydrusSimulation, &metadata).unwrap();
    let elapsed = started.elapsed();

    // Twelve solves of 100ms under the 8-worker cap need at least two
    // waves; an unbounded pool would finish in one.
    assert!(elapsed >= Duration::from_millis(180), "finished in {elapsed:?}");

    std::fs::remove_dir_all(&workspace).ok();
}

#[test]
fn modflow_stage_without_a_groundwater_model_names_the_project() {
    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(processor, "true", "true", "ws");
    let mut metadata = metadata(SimulationMode::SimpleCoupling);
    metadata.modflow_metadata = None;

    let err = execute(&registry, StageName::ModflowSimulation, &metadata).unwrap_err();
    assert!(err.to_string().contains("p1"));
    assert!(err.to_string().contains("no groundwater model"));
}

#[test]
fn modflow_stage_solves_against_the_discovered_nam_file() {
    let workspace = temp_workspace("modflow");
    let model_dir = workspace.join("p1/simulation/modflow/mf1");
    std::fs::create_dir_all(&model_dir).unwrap();
    std::fs::write(model_dir.join("model.nam"), "LIST 2 model.list\n").unwrap();

    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(processor, "true", "true", &workspace);

    execute(
        &registry,
        StageName::ModflowSimulation,
        &metadata(SimulationMode::SimpleCoupling),
    )
    .unwrap();

    std::fs::remove_dir_all(&workspace).ok();
}

#[test]
fn modflow_stage_fails_without_a_nam_file() {
    let workspace = temp_workspace("modflow-missing-nam");
    let model_dir = workspace.join("p1/simulation/modflow/mf1");
    std::fs::create_dir_all(&model_dir).unwrap();

    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(processor, "true", "true", &workspace);

    assert!(
        execute(
            &registry,
            StageName::ModflowSimulation,
            &metadata(SimulationMode::SimpleCoupling),
        )
        .is_err()
    );

    std::fs::remove_dir_all(&workspace).ok();
}

#[test]
fn steady_state_init_transfer_solves_then_transfers() {
    let workspace = temp_workspace("steady-state");
    let model_dir = workspace.join("p1/simulation/modflow/mf1");
    std::fs::create_dir_all(&model_dir).unwrap();
    std::fs::write(model_dir.join("MODEL.NAM"), "").unwrap();

    let processor = Arc::new(RecordingProcessor::default());
    let registry = local_registry(processor.clone(), "true", "true", &workspace);

    execute(
        &registry,
        StageName::ModflowInitConditionTransferSteadyState,
        &metadata(SimulationMode::WithFeedback),
    )
    .unwrap();

    assert_eq!(processor.operations(), vec!["transfer_modflow_to_hydrus(true)"]);

    std::fs::remove_dir_all(&workspace).ok();
}
