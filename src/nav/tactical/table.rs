use bevy::prelude::*;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::sync::Arc;

use crate::nav::mesh::{CellId, NavGraph};

/// Coarse reading of a tactical weight, for consumers that only need to
/// colour or gate on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TacticalClass {
    Safe,
    #[default]
    Neutral,
    Danger,
}

impl TacticalClass {
    /// `weight <= safe` is Safe, `weight >= danger` is Danger.
    pub fn from_weight(weight: f32, safe_threshold: f32, danger_threshold: f32) -> Self {
        if weight >= danger_threshold {
            TacticalClass::Danger
        } else if weight <= safe_threshold {
            TacticalClass::Safe
        } else {
            TacticalClass::Neutral
        }
    }
}

/// One immutable set of per-cell weights.
///
/// Never edited after construction. A refresh builds a new table and
/// publishes it through [`TacticalWeights`], so a search holding an
/// `Arc<WeightTable>` sees one consistent snapshot for its whole run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightTable {
    graph_fingerprint: u64,
    generation: u64,
    fingerprint: u64,
    weights: Vec<f32>,
    classes: Vec<TacticalClass>,
}

impl WeightTable {
    pub fn new(graph_fingerprint: u64, generation: u64, weights: Vec<f32>, classes: Vec<TacticalClass>) -> Self {
        debug_assert_eq!(weights.len(), classes.len());
        let fingerprint = content_fingerprint(&weights, &classes);
        Self {
            graph_fingerprint,
            generation,
            fingerprint,
            weights,
            classes,
        }
    }

    /// All-zero weights for `graph`. Search over a neutral table is pure
    /// geometric shortest path.
    pub fn neutral(graph: &NavGraph) -> Self {
        Self::new(
            graph.fingerprint(),
            0,
            vec![0.0; graph.len()],
            vec![TacticalClass::Neutral; graph.len()],
        )
    }

    /// Explicit weights, classified with the given thresholds. Handy for
    /// scripted scenarios and tests.
    pub fn from_weights(graph: &NavGraph, generation: u64, weights: Vec<f32>, safe: f32, danger: f32) -> Self {
        let mut weights = weights;
        weights.resize(graph.len(), 0.0);
        let classes = weights
            .iter()
            .map(|&w| TacticalClass::from_weight(w, safe, danger))
            .collect();
        Self::new(graph.fingerprint(), generation, weights, classes)
    }

    /// Weight of a cell; cells the table does not cover read as neutral.
    #[inline]
    pub fn weight(&self, cell: CellId) -> f32 {
        self.weights.get(cell.index()).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn class(&self, cell: CellId) -> TacticalClass {
        self.classes.get(cell.index()).copied().unwrap_or_default()
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Publication counter. Strictly increasing across refreshes of one
    /// [`TacticalWeights`] resource.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Hash of the weight values and classes, independent of `generation`.
    /// Two refreshes over identical inputs share a fingerprint.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn graph_fingerprint(&self) -> u64 {
        self.graph_fingerprint
    }

    /// Whether this table was computed for `graph`'s topology.
    pub fn matches(&self, graph: &NavGraph) -> bool {
        self.graph_fingerprint == graph.fingerprint() && self.weights.len() == graph.len()
    }
}

fn content_fingerprint(weights: &[f32], classes: &[TacticalClass]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_usize(weights.len());
    for (w, c) in weights.iter().zip(classes) {
        hasher.write_u32(w.to_bits());
        hasher.write_u8(*c as u8);
    }
    hasher.finish()
}

/// The currently published weight snapshot.
#[derive(Resource, Default, Clone)]
pub struct TacticalWeights {
    current: Arc<WeightTable>,
}

impl TacticalWeights {
    /// Cheap handle on the current snapshot.
    pub fn snapshot(&self) -> Arc<WeightTable> {
        Arc::clone(&self.current)
    }

    pub fn current(&self) -> &WeightTable {
        &self.current
    }

    /// Replace the snapshot. Readers holding the previous `Arc` are unaffected.
    pub fn publish(&mut self, table: WeightTable) {
        self.current = Arc::new(table);
    }

    pub fn next_generation(&self) -> u64 {
        self.current.generation() + 1
    }
}
