//! Deployment-capability registry.
//!
//! Implementations self-register against one or more deployment profiles
//! before finalization; finalization validates completeness for the active
//! profile and yields an immutable lookup table. This single indirection is
//! what keeps the run engine identical across all three backends.

use core::fmt;
use std::any::Any;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::chapter::StageName;
use crate::error::{SimResult, SimulationError};
use crate::task::{RunLifecycle, StageTask};

/// One of the three supported execution environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentProfile {
    /// Stages run in this process; solvers are child processes.
    Local,
    /// Solvers run in containers managed through the container runtime API.
    Docker,
    /// Chapters are delegated to the remote workflow engine.
    Remote,
}

impl DeploymentProfile {
    pub const fn as_str(self) -> &'static str {
        match self {
            DeploymentProfile::Local => "local",
            DeploymentProfile::Docker => "docker",
            DeploymentProfile::Remote => "remote",
        }
    }
}

impl fmt::Display for DeploymentProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentProfile {
    type Err = SimulationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "local" | "desktop" => Ok(DeploymentProfile::Local),
            "docker" => Ok(DeploymentProfile::Docker),
            "remote" | "k8s" => Ok(DeploymentProfile::Remote),
            other => Err(SimulationError::Configuration(format!(
                "unknown deployment profile: {other}"
            ))),
        }
    }
}

/// Identifier of the required run-lifecycle singleton.
pub const RUN_LIFECYCLE: &str = "run_lifecycle";

type SingletonValue = Arc<dyn Any + Send + Sync>;

/// Mutable registration table, populated during process initialization.
#[derive(Default)]
pub struct RegistryBuilder {
    tasks: HashMap<StageName, HashMap<DeploymentProfile, Arc<dyn StageTask>>>,
    lifecycles: HashMap<DeploymentProfile, Arc<dyn RunLifecycle>>,
    singletons: HashMap<&'static str, HashMap<DeploymentProfile, SingletonValue>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a stage body to one deployment profile.
    pub fn register_task(
        &mut self,
        profile: DeploymentProfile,
        stage: StageName,
        task: Arc<dyn StageTask>,
    ) -> &mut Self {
        debug!(%profile, %stage, "registering stage task");
        self.tasks.entry(stage).or_default().insert(profile, task);
        self
    }

    /// Bind the same stage body to several profiles (the file-management
    /// stages are shared between the local and container deployments).
    pub fn register_task_for(
        &mut self,
        profiles: &[DeploymentProfile],
        stage: StageName,
        task: Arc<dyn StageTask>,
    ) -> &mut Self {
        for &profile in profiles {
            self.register_task(profile, stage, task.clone());
        }
        self
    }

    pub fn register_lifecycle(
        &mut self,
        profile: DeploymentProfile,
        lifecycle: Arc<dyn RunLifecycle>,
    ) -> &mut Self {
        debug!(%profile, "registering run lifecycle");
        self.lifecycles.insert(profile, lifecycle);
        self
    }

    /// Bind an auxiliary named singleton (shared backend services).
    pub fn register_singleton<T: Any + Send + Sync>(
        &mut self,
        profile: DeploymentProfile,
        id: &'static str,
        value: Arc<T>,
    ) -> &mut Self {
        debug!(%profile, id, "registering singleton");
        self.singletons.entry(id).or_default().insert(profile, value);
        self
    }

    /// Validate completeness for `profile` and freeze the table. Every stage
    /// name and the run lifecycle are required; a gap fails process startup.
    pub fn finalize(mut self, profile: DeploymentProfile) -> SimResult<ComponentRegistry> {
        let mut tasks = HashMap::with_capacity(StageName::ALL.len());
        for stage in StageName::ALL {
            let task = self
                .tasks
                .get_mut(&stage)
                .and_then(|by_profile| by_profile.remove(&profile))
                .ok_or_else(|| SimulationError::ComponentUnavailable {
                    id: stage.to_string(),
                    profile,
                })?;
            tasks.insert(stage, task);
        }

        let lifecycle =
            self.lifecycles
                .remove(&profile)
                .ok_or(SimulationError::ComponentUnavailable {
                    id: RUN_LIFECYCLE.to_owned(),
                    profile,
                })?;

        let singletons = self
            .singletons
            .into_iter()
            .filter_map(|(id, mut by_profile)| Some((id, by_profile.remove(&profile)?)))
            .collect();

        debug!(%profile, "component registry finalized");
        Ok(ComponentRegistry {
            profile,
            tasks,
            lifecycle,
            singletons,
        })
    }
}

/// Immutable capability table for the active deployment profile.
pub struct ComponentRegistry {
    profile: DeploymentProfile,
    tasks: HashMap<StageName, Arc<dyn StageTask>>,
    lifecycle: Arc<dyn RunLifecycle>,
    singletons: HashMap<&'static str, SingletonValue>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("profile", &self.profile)
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .field("singletons", &self.singletons.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ComponentRegistry {
    pub fn profile(&self) -> DeploymentProfile {
        self.profile
    }

    /// Resolve the task body for a stage under the active profile.
    pub fn task(&self, stage: StageName) -> SimResult<Arc<dyn StageTask>> {
        self.tasks
            .get(&stage)
            .cloned()
            .ok_or_else(|| SimulationError::ComponentUnavailable {
                id: stage.to_string(),
                profile: self.profile,
            })
    }

    pub fn lifecycle(&self) -> Arc<dyn RunLifecycle> {
        self.lifecycle.clone()
    }

    /// Resolve a typed named singleton under the active profile.
    pub fn singleton<T: Any + Send + Sync>(&self, id: &'static str) -> SimResult<Arc<T>> {
        self.singletons
            .get(id)
            .and_then(|value| value.clone().downcast::<T>().ok())
            .ok_or_else(|| SimulationError::ComponentUnavailable {
                id: id.to_owned(),
                profile: self.profile,
            })
    }
}
