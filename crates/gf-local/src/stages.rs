//! Stage registrations for the in-process deployment.

use std::sync::Arc;

use gf_sim::{
    DeploymentProfile, InProcessLifecycle, RegistryBuilder, StageContext, StageName, StageTask,
    TaskResult,
};
use tracing::debug;

use crate::processor::DataProcessor;
use crate::solver::LocalSolverRunner;

/// The file-management bodies serve both in-process deployments; only the
/// solver stages differ under the container profile.
const FILE_TASK_PROFILES: &[DeploymentProfile] =
    &[DeploymentProfile::Local, DeploymentProfile::Docker];

fn delegating(
    processor: &Arc<dyn DataProcessor>,
    body: impl Fn(&dyn DataProcessor, &StageContext<'_>) -> TaskResult<()> + Send + Sync + 'static,
) -> Arc<dyn StageTask> {
    let processor = processor.clone();
    Arc::new(move |ctx: &StageContext<'_>| {
        debug!(stage = %ctx.stage, "launching local task");
        body(processor.as_ref(), ctx)
    })
}

/// Register the file-management stage bodies for the local and container
/// profiles.
pub fn register_file_tasks(builder: &mut RegistryBuilder, processor: Arc<dyn DataProcessor>) {
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::Initialization,
        delegating(&processor, |p, ctx| {
            p.initialize_simulation_files(ctx.metadata)
        }),
    );
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::WeatherDataTransfer,
        delegating(&processor, |p, ctx| p.transfer_weather_data(ctx.metadata)),
    );
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::SaveReferenceHydrusModels,
        delegating(&processor, |p, ctx| {
            p.preserve_reference_models(ctx.metadata)
        }),
    );
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::CreatePerZoneHydrusModels,
        delegating(&processor, |p, ctx| p.create_per_zone_models(ctx.metadata)),
    );
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::InitializeNewIterationFiles,
        delegating(&processor, |p, ctx| {
            p.initialize_feedback_iteration(ctx.metadata)
        }),
    );
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::IterationPreConfiguration,
        delegating(&processor, |p, ctx| p.pre_configure_iteration(ctx.metadata)),
    );
    // Saving the final output iteration is the same snapshot operation.
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::FeedbackSaveOutputIteration,
        delegating(&processor, |p, ctx| p.pre_configure_iteration(ctx.metadata)),
    );
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::HydrusToModflowDataPassing,
        delegating(&processor, |p, ctx| {
            p.transfer_hydrus_to_modflow(ctx.metadata)
        }),
    );
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::ModflowToHydrusDataPassing,
        delegating(&processor, |p, ctx| {
            p.transfer_modflow_to_hydrus(ctx.metadata, true)
        }),
    );
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::ModflowInitConditionTransferTransient,
        delegating(&processor, |p, ctx| {
            p.transfer_modflow_to_hydrus(ctx.metadata, false)
        }),
    );
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::OutputExtraction,
        delegating(&processor, |p, ctx| p.extract_output(ctx.metadata)),
    );
    // Deliberately empty: results stay in place for download.
    builder.register_task_for(
        FILE_TASK_PROFILES,
        StageName::Cleanup,
        Arc::new(|_ctx: &StageContext<'_>| -> TaskResult<()> { Ok(()) }),
    );
}

/// Register the complete local-profile table: shared file-management bodies
/// plus the child-process solver stages.
pub fn register_local_backend(
    builder: &mut RegistryBuilder,
    processor: Arc<dyn DataProcessor>,
    solver: Arc<LocalSolverRunner>,
) {
    register_file_tasks(builder, processor.clone());

    let hydrus = {
        let solver = solver.clone();
        Arc::new(move |ctx: &StageContext<'_>| solver.run_hydrus_models(ctx.metadata))
            as Arc<dyn StageTask>
    };
    builder.register_task(DeploymentProfile::Local, StageName::HydrusSimulation, hydrus.clone());
    // The warmup solve is an ordinary HYDRUS solve over the warmup window.
    builder.register_task(DeploymentProfile::Local, StageName::HydrusSimulationWarmup, hydrus);

    let modflow_solver = solver.clone();
    builder.register_task(
        DeploymentProfile::Local,
        StageName::ModflowSimulation,
        Arc::new(move |ctx: &StageContext<'_>| modflow_solver.run_modflow(ctx.metadata)),
    );

    // Steady-state warmup seeds the HYDRUS profiles from an actual solve.
    builder.register_task(
        DeploymentProfile::Local,
        StageName::ModflowInitConditionTransferSteadyState,
        Arc::new(move |ctx: &StageContext<'_>| {
            solver.run_modflow(ctx.metadata)?;
            processor.transfer_modflow_to_hydrus(ctx.metadata, true)
        }),
    );

    builder.register_lifecycle(DeploymentProfile::Local, Arc::new(InProcessLifecycle));
}
