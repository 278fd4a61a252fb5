//! Solver stage registrations for the container deployment.

use std::sync::Arc;

use gf_core::ProjectId;
use gf_local::DataProcessor;
use gf_project::{ProjectError, ProjectMetadata, WorkspacePaths, scan_for_nam_file};
use gf_sim::{
    DeploymentProfile, InProcessLifecycle, RegistryBuilder, StageContext, StageName, StageTask,
    TaskError, TaskResult,
};
use rayon::prelude::*;

use crate::deployer::{HYDRUS_IMAGE, MODFLOW_IMAGE, SolverDeployer};
use crate::runtime::ContainerRuntime;

/// Hard cap on concurrently supervised solver containers.
const MAX_CONCURRENT_MODELS: usize = 8;

const MODFLOW_PROGRAM: &str = "mf2005";

/// Runs the solver stages through the container runtime. The workspace
/// volume is resolved once at construction and shared by every deployment.
pub struct ContainerSolverRunner {
    runtime: Arc<dyn ContainerRuntime>,
    paths: WorkspacePaths,
    workspace_volume: String,
}

impl ContainerSolverRunner {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        paths: WorkspacePaths,
        workspace_volume: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            paths,
            workspace_volume: workspace_volume.into(),
        }
    }

    /// Model directory path relative to the workspace root, in the form the
    /// bind specification joins onto the host volume.
    fn model_subpath(&self, model_dir: &std::path::Path) -> String {
        model_dir
            .strip_prefix(self.paths.root())
            .unwrap_or(model_dir)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// One container per HYDRUS model to run, supervised under a bounded
    /// pool; the stage succeeds once every container has exited cleanly.
    pub fn run_hydrus_models(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        let project_id = &metadata.project_id;
        let deployers: Vec<SolverDeployer> = metadata
            .hydrus_models_to_run()
            .iter()
            .map(|hydrus_id| {
                let model_dir = self.paths.hydrus_model_path(project_id, hydrus_id, true);
                SolverDeployer::new(
                    self.runtime.clone(),
                    HYDRUS_IMAGE,
                    "hydrus",
                    hydrus_id.as_str(),
                    &self.workspace_volume,
                    &self.model_subpath(&model_dir),
                    None,
                )
            })
            .collect();
        if deployers.is_empty() {
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(deployers.len().min(MAX_CONCURRENT_MODELS))
            .build()
            .map_err(|err| TaskError::new(err.to_string()))?;
        pool.install(|| {
            deployers.par_iter().try_for_each(|deployer| {
                deployer.ensure_image()?;
                deployer.deploy()?;
                deployer.wait_for_termination()
            })
        })
    }

    /// Single MODFLOW container running `mf2005` against the discovered name
    /// file.
    pub fn run_modflow(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        let deployer = self.modflow_deployer(metadata)?;
        deployer.ensure_image()?;
        deployer.deploy()?;
        deployer.wait_for_termination()
    }

    fn modflow_deployer(&self, metadata: &ProjectMetadata) -> TaskResult<SolverDeployer> {
        let modflow = metadata
            .modflow_metadata
            .as_ref()
            .ok_or_else(|| ProjectError::MissingModflowModel {
                project_id: metadata.project_id.clone(),
            })?;
        let model_dir =
            self.modflow_model_dir(&metadata.project_id, modflow);
        let nam_file = scan_for_nam_file(&model_dir)?;
        Ok(SolverDeployer::new(
            self.runtime.clone(),
            MODFLOW_IMAGE,
            "modflow",
            modflow.modflow_id.as_str(),
            &self.workspace_volume,
            &self.model_subpath(&model_dir),
            Some(vec![MODFLOW_PROGRAM.to_owned(), nam_file]),
        ))
    }

    fn modflow_model_dir(
        &self,
        project_id: &ProjectId,
        modflow: &gf_project::ModflowMetadata,
    ) -> std::path::PathBuf {
        self.paths
            .modflow_model_path(project_id, &modflow.modflow_id, true)
    }
}

/// Register the container-profile solver stages and lifecycle. The
/// file-management bodies are registered separately through
/// `gf_local::register_file_tasks`.
pub fn register_docker_backend(
    builder: &mut RegistryBuilder,
    processor: Arc<dyn DataProcessor>,
    runner: Arc<ContainerSolverRunner>,
) {
    let hydrus = {
        let runner = runner.clone();
        Arc::new(move |ctx: &StageContext<'_>| runner.run_hydrus_models(ctx.metadata))
            as Arc<dyn StageTask>
    };
    builder.register_task(DeploymentProfile::Docker, StageName::HydrusSimulation, hydrus.clone());
    builder.register_task(DeploymentProfile::Docker, StageName::HydrusSimulationWarmup, hydrus);

    let modflow_runner = runner.clone();
    builder.register_task(
        DeploymentProfile::Docker,
        StageName::ModflowSimulation,
        Arc::new(move |ctx: &StageContext<'_>| modflow_runner.run_modflow(ctx.metadata)),
    );

    builder.register_task(
        DeploymentProfile::Docker,
        StageName::ModflowInitConditionTransferSteadyState,
        Arc::new(move |ctx: &StageContext<'_>| {
            runner.run_modflow(ctx.metadata)?;
            processor.transfer_modflow_to_hydrus(ctx.metadata, true)
        }),
    );

    builder.register_lifecycle(DeploymentProfile::Docker, Arc::new(InProcessLifecycle));
}
