//! Runner configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ProjectResult;

/// Deployment-specific knobs read from `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Local workspace root holding one directory per project.
    #[serde(default = "default_workspace")]
    pub workspace_path: PathBuf,

    /// HYDRUS executable, required for the local deployment only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydrus_program_path: Option<PathBuf>,

    /// MODFLOW executable, required for the local deployment only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modflow_program_path: Option<PathBuf>,

    /// Data-processing toolkit executable; file-management stages shell out
    /// to it under the local and container deployments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_program_path: Option<PathBuf>,

    /// Host path backing the shared workspace volume. Set by the headless
    /// runner when the orchestrator itself is not containerized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_volume_override: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workspace_path: default_workspace(),
            hydrus_program_path: None,
            modflow_program_path: None,
            processing_program_path: None,
            workspace_volume_override: None,
        }
    }
}

fn default_workspace() -> PathBuf {
    PathBuf::from("workspace")
}

impl RunnerConfig {
    pub fn load(path: &Path) -> ProjectResult<Self> {
        info!(path = %path.display(), "loading runner configuration");
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> ProjectResult<()> {
        info!(path = %path.display(), "saving runner configuration");
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: RunnerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.workspace_path, PathBuf::from("workspace"));
    }
}
