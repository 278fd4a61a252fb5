//! Workspace directory layout.
//!
//! Every project lives under `<workspace>/<project_id>/` with its editable
//! models, and runs execute against a copied tree under
//! `<workspace>/<project_id>/simulation/`. Feedback mode additionally keeps
//! pristine reference models under `simulation/ref/`.

use std::path::{Path, PathBuf};

use gf_core::{HydrusId, ModflowId, ProjectId, ShapeId, WeatherId};

use crate::{ProjectError, ProjectResult};

pub const SIMULATION_DIR: &str = "simulation";
pub const METADATA_FILENAME: &str = "metadata.json";
pub const RESULTS_FILENAME: &str = "results.json";

/// Name of the per-zone model cloned from `hydrus_id` for `shape_id`.
pub fn feedback_model_name(hydrus_id: &HydrusId, shape_id: &ShapeId) -> HydrusId {
    HydrusId::new(format!("{hydrus_id}--{shape_id}"))
}

/// Resolver for all paths below a workspace root.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.root.join(project_id.as_str())
    }

    pub fn simulation_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.project_dir(project_id).join(SIMULATION_DIR)
    }

    fn base_dir(&self, project_id: &ProjectId, simulation: bool) -> PathBuf {
        if simulation {
            self.simulation_dir(project_id)
        } else {
            self.project_dir(project_id)
        }
    }

    pub fn metadata_path(&self, project_id: &ProjectId) -> PathBuf {
        self.project_dir(project_id).join(METADATA_FILENAME)
    }

    pub fn hydrus_dir(&self, project_id: &ProjectId, simulation: bool) -> PathBuf {
        self.base_dir(project_id, simulation).join("hydrus")
    }

    pub fn modflow_dir(&self, project_id: &ProjectId, simulation: bool) -> PathBuf {
        self.base_dir(project_id, simulation).join("modflow")
    }

    /// Pristine copies preserved for re-seeding feedback iterations.
    pub fn reference_hydrus_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.simulation_dir(project_id).join("ref").join("hydrus")
    }

    pub fn hydrus_model_path(
        &self,
        project_id: &ProjectId,
        hydrus_id: &HydrusId,
        simulation: bool,
    ) -> PathBuf {
        self.hydrus_dir(project_id, simulation).join(hydrus_id.as_str())
    }

    pub fn modflow_model_path(
        &self,
        project_id: &ProjectId,
        modflow_id: &ModflowId,
        simulation: bool,
    ) -> PathBuf {
        self.modflow_dir(project_id, simulation).join(modflow_id.as_str())
    }

    pub fn weather_path(&self, project_id: &ProjectId, weather_id: &WeatherId) -> PathBuf {
        self.base_dir(project_id, false)
            .join("weather")
            .join(format!("{weather_id}.csv"))
    }

    pub fn shape_path(&self, project_id: &ProjectId, shape_id: &ShapeId) -> PathBuf {
        self.base_dir(project_id, false)
            .join("shapes")
            .join(format!("{shape_id}.npy"))
    }

    pub fn results_path(&self, project_id: &ProjectId) -> PathBuf {
        self.project_dir(project_id).join(RESULTS_FILENAME)
    }
}

/// Locate the MODFLOW name file inside a prepared model directory.
pub fn scan_for_nam_file(model_dir: &Path) -> ProjectResult<String> {
    for entry in std::fs::read_dir(model_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.to_ascii_lowercase().ends_with(".nam") {
            return Ok(name.into_owned());
        }
    }
    Err(ProjectError::NamFileNotFound {
        dir: model_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_tree_nests_under_project() {
        let paths = WorkspacePaths::new("workspace");
        let project = ProjectId::new("p1");
        assert_eq!(
            paths.simulation_dir(&project),
            Path::new("workspace/p1/simulation")
        );
        assert_eq!(
            paths.metadata_path(&project),
            Path::new("workspace/p1/metadata.json")
        );
    }

    #[test]
    fn model_paths_switch_on_simulation_flag() {
        let paths = WorkspacePaths::new("ws");
        let project = ProjectId::new("p1");
        let hydrus = HydrusId::new("h1");
        assert_eq!(
            paths.hydrus_model_path(&project, &hydrus, false),
            Path::new("ws/p1/hydrus/h1")
        );
        assert_eq!(
            paths.hydrus_model_path(&project, &hydrus, true),
            Path::new("ws/p1/simulation/hydrus/h1")
        );
    }

    #[test]
    fn compound_name_joins_model_and_shape() {
        let name = feedback_model_name(&HydrusId::new("h1"), &ShapeId::new("s2"));
        assert_eq!(name.as_str(), "h1--s2");
    }

    #[test]
    fn reference_models_live_under_ref() {
        let paths = WorkspacePaths::new("ws");
        assert_eq!(
            paths.reference_hydrus_dir(&ProjectId::new("p1")),
            Path::new("ws/p1/simulation/ref/hydrus")
        );
    }
}
