//! Project metadata schema.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use gf_core::{HydrusId, ModflowId, ProjectId, ShapeId, WeatherId};
use serde::{Deserialize, Serialize};

use crate::paths::feedback_model_name;

/// How the two solvers are coupled over the simulated period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationMode {
    /// One HYDRUS pass feeding one MODFLOW pass.
    SimpleCoupling,
    /// Iterative exchange of boundary conditions, once per groundwater step.
    WithFeedback,
}

/// Kind of a single entry in the groundwater model's time-step list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKind {
    SteadyState,
    Transient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModflowStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    #[serde(default)]
    pub duration_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModflowMetadata {
    pub modflow_id: ModflowId,
    pub grid_unit: String,
    #[serde(default)]
    pub steps_info: Vec<ModflowStep>,
}

/// Assignment of a spatial zone: either a HYDRUS model computes its recharge
/// or a constant recharge value is applied directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeAssignment {
    Hydrus(HydrusId),
    Recharge(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_id: ProjectId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub spin_up: u32,
    pub simulation_mode: SimulationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modflow_metadata: Option<ModflowMetadata>,
    #[serde(default)]
    pub shapes_to_hydrus: BTreeMap<ShapeId, ShapeAssignment>,
    #[serde(default)]
    pub hydrus_to_weather: BTreeMap<HydrusId, WeatherId>,
    #[serde(default)]
    pub finished: bool,
}

impl ProjectMetadata {
    pub fn is_feedback_loop(&self) -> bool {
        self.simulation_mode == SimulationMode::WithFeedback
    }

    /// Distinct HYDRUS models referenced by at least one zone, in
    /// deterministic order.
    pub fn used_hydrus_models(&self) -> Vec<HydrusId> {
        let unique: BTreeSet<&HydrusId> = self
            .shapes_to_hydrus
            .values()
            .filter_map(|assignment| match assignment {
                ShapeAssignment::Hydrus(id) => Some(id),
                ShapeAssignment::Recharge(_) => None,
            })
            .collect();
        unique.into_iter().cloned().collect()
    }

    /// Per-zone compound model ids used in feedback mode, paired with the
    /// HYDRUS model each one was cloned from.
    pub fn per_zone_hydrus_models(&self) -> Vec<(HydrusId, HydrusId)> {
        self.shapes_to_hydrus
            .iter()
            .filter_map(|(shape, assignment)| match assignment {
                ShapeAssignment::Hydrus(id) => {
                    Some((id.clone(), feedback_model_name(id, shape)))
                }
                ShapeAssignment::Recharge(_) => None,
            })
            .collect()
    }

    /// Model ids whose solver instances a HYDRUS stage has to launch.
    pub fn hydrus_models_to_run(&self) -> Vec<HydrusId> {
        match self.simulation_mode {
            SimulationMode::SimpleCoupling => self.used_hydrus_models(),
            SimulationMode::WithFeedback => self
                .per_zone_hydrus_models()
                .into_iter()
                .map(|(_, compound)| compound)
                .collect(),
        }
    }
}
