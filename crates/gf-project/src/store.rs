//! Project metadata persistence.

use std::path::Path;

use gf_core::ProjectId;
use tracing::debug;

use crate::metadata::ProjectMetadata;
use crate::paths::WorkspacePaths;
use crate::{ProjectError, ProjectResult};

/// Reader/writer for persisted project metadata.
///
/// The orchestration core only ever reads configuration and flips the
/// completion flag; everything else the store holds belongs to the
/// presentation layer.
pub trait ProjectStore: Send + Sync {
    fn load(&self, project_id: &ProjectId) -> ProjectResult<ProjectMetadata>;

    fn save(&self, metadata: &ProjectMetadata) -> ProjectResult<()>;

    fn mark_finished(&self, project_id: &ProjectId, finished: bool) -> ProjectResult<()> {
        let mut metadata = self.load(project_id)?;
        metadata.finished = finished;
        self.save(&metadata)
    }
}

/// Filesystem-backed store keeping one `metadata.json` per project.
#[derive(Debug, Clone)]
pub struct LocalProjectStore {
    paths: WorkspacePaths,
}

impl LocalProjectStore {
    pub fn new(paths: WorkspacePaths) -> Self {
        Self { paths }
    }

    fn metadata_path(&self, project_id: &ProjectId) -> std::path::PathBuf {
        self.paths.metadata_path(project_id)
    }
}

impl ProjectStore for LocalProjectStore {
    fn load(&self, project_id: &ProjectId) -> ProjectResult<ProjectMetadata> {
        let path = self.metadata_path(project_id);
        debug!(project = %project_id, path = %path.display(), "loading project metadata");
        let content = read_metadata(&path, project_id)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, metadata: &ProjectMetadata) -> ProjectResult<()> {
        let path = self.metadata_path(&metadata.project_id);
        debug!(project = %metadata.project_id, path = %path.display(), "saving project metadata");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(metadata)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

fn read_metadata(path: &Path, project_id: &ProjectId) -> ProjectResult<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(ProjectError::NotFound(project_id.clone()))
        }
        Err(err) => Err(err.into()),
    }
}
