//! Child-process solver launcher.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use gf_project::{ProjectError, ProjectMetadata, WorkspacePaths, scan_for_nam_file};
use gf_sim::{TaskError, TaskResult};
use rayon::prelude::*;
use tracing::debug;

/// Hard cap on concurrently running HYDRUS instances.
const MAX_CONCURRENT_SOLVERS: usize = 8;

/// Launches the configured solver executables against prepared model
/// directories in the simulation tree.
pub struct LocalSolverRunner {
    hydrus_program: PathBuf,
    modflow_program: PathBuf,
    paths: WorkspacePaths,
}

impl LocalSolverRunner {
    pub fn new(
        hydrus_program: impl Into<PathBuf>,
        modflow_program: impl Into<PathBuf>,
        paths: WorkspacePaths,
    ) -> Self {
        Self {
            hydrus_program: hydrus_program.into(),
            modflow_program: modflow_program.into(),
            paths,
        }
    }

    /// One HYDRUS solve per model to run, under a bounded pool. The stage
    /// only succeeds once every instance has exited cleanly.
    pub fn run_hydrus_models(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        let models = metadata.hydrus_models_to_run();
        if models.is_empty() {
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(models.len().min(MAX_CONCURRENT_SOLVERS))
            .build()
            .map_err(|err| TaskError::new(err.to_string()))?;

        pool.install(|| {
            models.par_iter().try_for_each(|hydrus_id| {
                let model_dir =
                    self.paths
                        .hydrus_model_path(&metadata.project_id, hydrus_id, true);
                run_confirmed(&self.hydrus_program, &[model_dir.as_os_str()], None)
            })
        })
    }

    /// Single MODFLOW solve, executed from inside the model directory
    /// against its discovered name file.
    pub fn run_modflow(&self, metadata: &ProjectMetadata) -> TaskResult<()> {
        let modflow = metadata
            .modflow_metadata
            .as_ref()
            .ok_or_else(|| ProjectError::MissingModflowModel {
                project_id: metadata.project_id.clone(),
            })?;
        let model_dir = self
            .paths
            .modflow_model_path(&metadata.project_id, &modflow.modflow_id, true);
        let nam_file = scan_for_nam_file(&model_dir)?;
        run_confirmed(
            &self.modflow_program,
            &[std::ffi::OsStr::new(&nam_file)],
            Some(&model_dir),
        )
    }
}

/// Spawn a solver, send the confirmation keystroke it waits for on exit,
/// and block until it terminates.
fn run_confirmed(
    program: &Path,
    args: &[&std::ffi::OsStr],
    current_dir: Option<&Path>,
) -> TaskResult<()> {
    debug!(program = %program.display(), ?args, "launching solver process");
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = current_dir {
        command.current_dir(dir);
    }
    let mut child = command.spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        // A solver that already exited has closed its end; that is fine.
        match stdin.write_all(b"\n") {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
            Err(err) => return Err(err.into()),
        }
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(TaskError::new(format!(
            "solver {} exited with {status}",
            program.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_exit_is_success() {
        run_confirmed(Path::new("true"), &[], None).unwrap();
    }

    #[test]
    fn non_zero_exit_fails_with_status() {
        let err = run_confirmed(Path::new("false"), &[], None).unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[test]
    fn missing_executable_fails() {
        assert!(run_confirmed(Path::new("/nonexistent/solver"), &[], None).is_err());
    }
}
