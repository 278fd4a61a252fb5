//! Headless runner: start one simulation project from the command line and
//! poll it to completion.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gf_core::ProjectId;
use gf_docker::{ContainerSolverRunner, DockerCli, register_docker_backend, resolve_workspace_volume};
use gf_local::{DataProcessor, LocalSolverRunner, ToolkitProcessor, register_file_tasks, register_local_backend};
use gf_project::{LocalProjectStore, ProjectStore, RunnerConfig, WorkspacePaths};
use gf_sim::{
    ChapterStatusView, ComponentRegistry, DeploymentProfile, RegistryBuilder, SimulationError,
    SimulationService,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "gf-runner")]
#[command(about = "Headless runner for coupled HYDRUS/MODFLOW simulation projects", long_about = None)]
struct Cli {
    /// Project to run (its directory name under the workspace)
    #[arg(short, long)]
    project_id: String,

    /// Workspace root holding one directory per project
    #[arg(short, long)]
    workspace: PathBuf,

    /// Deployment profile to run under
    #[arg(short, long, default_value = "local", value_parser = ["local", "desktop", "docker"])]
    deployment: String,

    /// HYDRUS executable (local deployment, takes precedence over the
    /// configuration file)
    #[arg(long)]
    with_hydrus: Option<PathBuf>,

    /// MODFLOW executable (local deployment, takes precedence over the
    /// configuration file)
    #[arg(long)]
    with_modflow: Option<PathBuf>,

    /// Data-processing toolkit executable (takes precedence over the
    /// configuration file)
    #[arg(long)]
    with_toolkit: Option<PathBuf>,

    /// Configuration file holding solver and toolkit paths
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Project(#[from] gf_project::ProjectError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error(transparent)]
    Backend(#[from] gf_sim::TaskError),
    #[error("Simulation finished with a failed stage: {0}")]
    RunFailed(String),
}

fn main() -> Result<(), RunnerError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let profile: DeploymentProfile = cli
        .deployment
        .parse()
        .map_err(|err: SimulationError| RunnerError::Config(err.to_string()))?;

    let mut config = match &cli.config {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };
    config.workspace_path = cli.workspace.clone();
    if let Some(hydrus) = cli.with_hydrus {
        config.hydrus_program_path = Some(hydrus);
    }
    if let Some(modflow) = cli.with_modflow {
        config.modflow_program_path = Some(modflow);
    }
    if let Some(toolkit) = cli.with_toolkit {
        config.processing_program_path = Some(toolkit);
    }
    if profile == DeploymentProfile::Docker && config.workspace_volume_override.is_none() {
        // The runner is not containerized, so the workspace path doubles as
        // the host volume.
        config.workspace_volume_override = Some(cli.workspace.clone());
    }

    info!(%profile, workspace = %config.workspace_path.display(), "starting runner");

    let paths = WorkspacePaths::new(config.workspace_path.clone());
    let store: Arc<dyn ProjectStore> = Arc::new(LocalProjectStore::new(paths.clone()));
    let registry = Arc::new(build_registry(profile, &config, &paths)?);

    let project_id = ProjectId::new(cli.project_id);
    let metadata = store.load(&project_id)?;

    let service = SimulationService::new(registry, store);
    service.start(metadata)?;

    let views = poll_to_completion(&service, &project_id)?;
    print_report(&views);

    let failed = views
        .iter()
        .flat_map(|chapter| &chapter.stage_statuses)
        .find(|stage| stage.error.is_some());
    match failed {
        Some(stage) => Err(RunnerError::RunFailed(format!(
            "{}: {}",
            stage.name,
            stage.error.as_deref().unwrap_or("unknown error")
        ))),
        None => Ok(()),
    }
}

fn build_registry(
    profile: DeploymentProfile,
    config: &RunnerConfig,
    paths: &WorkspacePaths,
) -> Result<ComponentRegistry, RunnerError> {
    let toolkit = required_path(config.processing_program_path.as_deref(), "processing toolkit")?;
    let processor: Arc<dyn DataProcessor> =
        Arc::new(ToolkitProcessor::new(toolkit, paths.clone()));

    let mut builder = RegistryBuilder::new();
    match profile {
        DeploymentProfile::Local => {
            let hydrus = required_path(config.hydrus_program_path.as_deref(), "HYDRUS executable")?;
            let modflow =
                required_path(config.modflow_program_path.as_deref(), "MODFLOW executable")?;
            register_local_backend(
                &mut builder,
                processor,
                Arc::new(LocalSolverRunner::new(hydrus, modflow, paths.clone())),
            );
        }
        DeploymentProfile::Docker => {
            register_file_tasks(&mut builder, processor.clone());
            let runtime = Arc::new(DockerCli::new());
            let volume = resolve_workspace_volume(
                runtime.as_ref(),
                config.workspace_volume_override.as_deref(),
                std::env::var("HOSTNAME").ok().as_deref(),
            )?;
            let runner = Arc::new(ContainerSolverRunner::new(runtime, paths.clone(), volume));
            register_docker_backend(&mut builder, processor, runner);
        }
        DeploymentProfile::Remote => {
            return Err(RunnerError::Config(
                "the remote deployment is driven by the cluster, not this runner".to_owned(),
            ));
        }
    }
    Ok(builder.finalize(profile)?)
}

fn required_path(path: Option<&Path>, what: &str) -> Result<PathBuf, RunnerError> {
    path.map(Path::to_path_buf)
        .ok_or_else(|| RunnerError::Config(format!("{what} not configured")))
}

fn poll_to_completion(
    service: &SimulationService,
    project_id: &ProjectId,
) -> Result<Vec<ChapterStatusView>, RunnerError> {
    loop {
        std::thread::sleep(Duration::from_secs(1));
        let views = service.status(project_id)?;
        let finished = views
            .last()
            .and_then(|chapter| chapter.stage_statuses.last())
            .is_some_and(|stage| stage.status.is_terminal());
        if finished {
            return Ok(views);
        }
    }
}

fn print_report(views: &[ChapterStatusView]) {
    for chapter in views {
        println!("{}", chapter.chapter_name);
        for stage in &chapter.stage_statuses {
            match &stage.error {
                Some(error) => println!("  {:<45} {:?}: {error}", stage.name, stage.status),
                None => println!("  {:<45} {:?}", stage.name, stage.status),
            }
        }
    }
}
