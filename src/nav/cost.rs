use serde::{Deserialize, Serialize};

use super::config::NavConfig;
use super::mesh::{CellId, NavGraph};
use super::tactical::{TacticalClass, WeightTable};

/// The edge cost shared by goal-bound preprocessing and search.
///
/// Both sides must price an edge identically, and visit neighbours in the
/// same (sorted) order with strict-improvement relaxation, or the bounds
/// stop describing the edges the search would actually take.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Floor on any single step. Keeps cover-heavy (negative) weights from
    /// producing zero or negative edges, which Dijkstra cannot handle.
    pub min_step_cost: f32,
    /// Added when stepping from a Safe cell into a Danger cell.
    pub danger_transition_penalty: f32,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::from_config(&NavConfig::default())
    }
}

impl CostModel {
    pub fn from_config(config: &NavConfig) -> Self {
        Self {
            min_step_cost: config.min_step_cost.max(f32::EPSILON),
            danger_transition_penalty: config.danger_transition_penalty.max(0.0),
        }
    }

    /// Centre-to-centre distance, plus the destination's tactical weight,
    /// plus the Safe -> Danger penalty, floored at `min_step_cost`.
    #[inline]
    pub fn edge_cost(&self, graph: &NavGraph, weights: &WeightTable, from: CellId, to: CellId) -> f32 {
        let mut cost = graph.centroid(from).distance(graph.centroid(to)) + weights.weight(to);
        if weights.class(from) == TacticalClass::Safe && weights.class(to) == TacticalClass::Danger {
            cost += self.danger_transition_penalty;
        }
        cost.max(self.min_step_cost)
    }
}
