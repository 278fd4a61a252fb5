//! Object-storage collaborator.

use gf_core::ProjectId;

/// Supplies the engine-visible storage URI of a project's root; the remote
/// pipelines read and write model data there instead of a local workspace.
pub trait ObjectStorage: Send + Sync {
    fn project_location(&self, project_id: &ProjectId) -> String;
}
