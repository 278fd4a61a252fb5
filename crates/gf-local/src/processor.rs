//! Model-data processing collaborator.
//!
//! The numeric side of the coupling (weather-series slicing, recharge and
//! water-table transfer, output extraction) lives in a separate processing
//! toolkit. The orchestrator only decides *when* each operation runs.

use std::process::{Command, Stdio};

use gf_project::{ProjectMetadata, WorkspacePaths};
use gf_sim::{TaskError, TaskResult};
use tracing::debug;

/// Operations the file-management stages delegate to.
pub trait DataProcessor: Send + Sync {
    /// Reset the simulation tree from the editable project models.
    fn initialize_simulation_files(&self, metadata: &ProjectMetadata) -> TaskResult<()>;

    /// Slice the assigned weather series into each used HYDRUS model.
    fn transfer_weather_data(&self, metadata: &ProjectMetadata) -> TaskResult<()>;

    /// Preserve pristine copies of the HYDRUS models for re-seeding.
    fn preserve_reference_models(&self, metadata: &ProjectMetadata) -> TaskResult<()>;

    /// Clone one HYDRUS model per assigned zone.
    fn create_per_zone_models(&self, metadata: &ProjectMetadata) -> TaskResult<()>;

    /// Prepare both solvers' inputs for the next feedback iteration.
    fn initialize_feedback_iteration(&self, metadata: &ProjectMetadata) -> TaskResult<()>;

    /// Snapshot the current iteration's outputs before the next one starts.
    fn pre_configure_iteration(&self, metadata: &ProjectMetadata) -> TaskResult<()>;

    /// Pass computed recharge from HYDRUS into the MODFLOW inputs.
    fn transfer_hydrus_to_modflow(&self, metadata: &ProjectMetadata) -> TaskResult<()>;

    /// Pass the water table back into the HYDRUS profiles. With
    /// `use_modflow_results == false` the transfer seeds initial conditions
    /// without reading solver output (first transient step).
    fn transfer_modflow_to_hydrus(
        &self,
        metadata: &ProjectMetadata,
        use_modflow_results: bool,
    ) -> TaskResult<()>;

    /// Export the final head output as JSON next to the project metadata.
    fn extract_output(&self, metadata: &ProjectMetadata) -> TaskResult<()>;
}

/// [`DataProcessor`] backed by the external processing toolkit executable.
///
/// Each operation is one toolkit subcommand, pointed at the workspace and
/// project and fed the full project configuration on stdin. A non-zero exit
/// fails the stage with the toolkit's stderr.
pub struct ToolkitProcessor {
    program: std::path::PathBuf,
    paths: WorkspacePaths,
}

impl ToolkitProcessor {
    pub fn new(program: impl Into<std::path::PathBuf>, paths: WorkspacePaths) -> Self {
        Self {
            program: program.into(),
            paths,
        }
    }

    fn invoke(
        &self,
        operation: &str,
        metadata: &ProjectMetadata,
        extra_args: &[&str],
    ) -> TaskResult<()> {
        debug!(operation, project = %metadata.project_id, "invoking processing toolkit");
        let mut child = Command::new(&self.program)
            .arg(operation)
            .arg("--workspace")
            .arg(self.paths.root())
            .arg("--project")
            .arg(metadata.project_id.as_str())
            .args(extra_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(stdin) = child.stdin.take() {
            serde_json::to_writer(stdin, metadata)?;
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(TaskError::new(format!(
                "{operation} failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

impl DataProcessor for ToolkitProcessor {
    fn initialize_simulation_files(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        self.invoke("initialization", metadata, &[])
    }

    fn transfer_weather_data(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        self.invoke("weather-data-transfer", metadata, &[])
    }

    fn preserve_reference_models(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        self.invoke("save-reference-hydrus-models", metadata, &[])
    }

    fn create_per_zone_models(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        self.invoke("create-per-zone-hydrus-models", metadata, &[])
    }

    fn initialize_feedback_iteration(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        self.invoke("initialize-new-iteration-files", metadata, &[])
    }

    fn pre_configure_iteration(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        self.invoke("iteration-pre-configuration", metadata, &[])
    }

    fn transfer_hydrus_to_modflow(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        self.invoke("hydrus-to-modflow", metadata, &[])
    }

    fn transfer_modflow_to_hydrus(
        &self,
        metadata: &ProjectMetadata,
        use_modflow_results: bool,
    ) -> TaskResult<()> {
        let extra_args: &[&str] = if use_modflow_results {
            &[]
        } else {
            &["--init-transient"]
        };
        self.invoke("modflow-to-hydrus", metadata, extra_args)
    }

    fn extract_output(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        self.invoke("output-extraction", metadata, &[])
    }
}
