use bevy::prelude::*;
use std::time::Duration;

use crate::nav::config::{NavConfig, NotReadyPolicy};
use crate::nav::cost::CostModel;
use crate::nav::mesh::CellId;
use crate::nav::tactical::TacticalTuning;

/// Knobs a query needs beyond the graph, weights and bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchSettings {
    pub cost_model: CostModel,
    /// How far above or below the surface a query point may be.
    pub locate_max_height: f32,
    pub not_ready_policy: NotReadyPolicy,
    /// Scale of the logistic transform behind [`SearchMetrics::tactical_score`].
    pub score_scale: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&NavConfig::default(), &TacticalTuning::default())
    }
}

impl SearchSettings {
    pub fn from_config(config: &NavConfig, tuning: &TacticalTuning) -> Self {
        Self {
            cost_model: CostModel::from_config(config),
            locate_max_height: config.locate_max_height,
            not_ready_policy: config.not_ready_policy,
            score_scale: tuning.score_scale,
        }
    }
}

/// Measurements taken while answering one query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchMetrics {
    /// Cells popped from the open set, goal included.
    pub cells_expanded: usize,
    pub elapsed: Duration,
    /// Sum of distances between consecutive path points.
    pub path_length: f32,
    /// Safety summary in (0, 1); higher is safer. 0.5 for a neutral path.
    pub tactical_score: f32,
    /// Whether goal bounds actually pruned this query.
    pub pruned: bool,
    /// Pruning used bounds built from older weights, so it acted as a
    /// heuristic rather than an exact bound.
    pub bounds_stale: bool,
}

/// A successful query.
#[derive(Clone, Debug, PartialEq)]
pub struct FoundPath {
    /// Exact start point, centres of the interior cells, exact goal point.
    pub points: Vec<Vec3>,
    /// Every cell the path crosses, start cell first.
    pub cells: Vec<CellId>,
    pub metrics: SearchMetrics,
}
