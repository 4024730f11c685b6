use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::table::{TacticalClass, WeightTable};
use crate::nav::mesh::{CellId, NavGraph};

/// Tuning for the three weight terms and the class thresholds.
///
/// Lives in a resource so the hot-reloadable tactical profile can swap it;
/// a change only shows up in paths after the next weight refresh.
#[derive(Resource, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TacticalTuning {
    // Cover
    pub cover_radius: f32,
    pub cover_strength: f32,
    pub cover_floor: f32,

    // Threat
    pub threat_strength: f32,
    pub threat_ceiling: f32,

    // Exposure
    pub exposure_scale: f32,
    pub exposure_ceiling: f32,

    // Classification and scoring
    pub safe_threshold: f32,
    pub danger_threshold: f32,
    pub score_scale: f32,
}

impl Default for TacticalTuning {
    fn default() -> Self {
        Self {
            cover_radius: 6.0,
            cover_strength: 1.5,
            cover_floor: -5.0,
            threat_strength: 10.0,
            threat_ceiling: 50.0,
            exposure_scale: 3.0,
            exposure_ceiling: 3.0,
            safe_threshold: -1.0,
            danger_threshold: 3.0,
            score_scale: 2.0,
        }
    }
}

/// A tracked hostile position and how far its danger reaches.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreatSource {
    pub position: Vec3,
    pub radius: f32,
    /// Weapon-dependent scale on the threat term.
    pub multiplier: f32,
}

/// Visibility probe result for one cell: of `sampled_directions` cardinal
/// rays cast from the cell, `open_directions` saw past the probe distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureProbe {
    pub cell: CellId,
    pub open_directions: u8,
    pub sampled_directions: u8,
}

impl ExposureProbe {
    pub fn open_fraction(&self) -> f32 {
        if self.sampled_directions == 0 {
            return 0.0;
        }
        (self.open_directions.min(self.sampled_directions) as f32) / self.sampled_directions as f32
    }
}

/// Already-sensed inputs for the weight model, written by whoever owns
/// physics queries and tag lookups.
#[derive(Resource, Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TacticalInputs {
    pub cover_sources: Vec<Vec3>,
    pub threat: Option<ThreatSource>,
    pub exposure: Vec<ExposureProbe>,
}

/// Pure weight computation over a tuning set.
pub struct TacticalModel<'a> {
    tuning: &'a TacticalTuning,
}

impl<'a> TacticalModel<'a> {
    pub fn new(tuning: &'a TacticalTuning) -> Self {
        Self { tuning }
    }

    /// Cover term: every source within `cover_radius` pulls the weight down,
    /// nearer sources harder. Clamped to `[cover_floor, 0]`.
    pub fn cover_term(&self, position: Vec3, cover_sources: &[Vec3]) -> f32 {
        let t = self.tuning;
        if t.cover_radius <= 0.0 {
            return 0.0;
        }
        let mut term = 0.0;
        for &source in cover_sources {
            let d = position.distance(source);
            if d < t.cover_radius {
                term -= t.cover_strength * (1.0 - d / t.cover_radius);
            }
        }
        term.clamp(t.cover_floor.min(0.0), 0.0)
    }

    /// Threat term: linear falloff from the threat position to its radius,
    /// scaled by the weapon multiplier. Zero at and beyond the radius.
    pub fn threat_term(&self, position: Vec3, threat: Option<&ThreatSource>) -> f32 {
        let t = self.tuning;
        let Some(threat) = threat else { return 0.0 };
        if threat.radius <= 0.0 {
            return 0.0;
        }
        let d = position.distance(threat.position);
        if d >= threat.radius {
            return 0.0;
        }
        (threat.multiplier * t.threat_strength * (1.0 - d / threat.radius))
            .clamp(0.0, t.threat_ceiling.max(0.0))
    }

    /// Exposure term: proportional to the open fraction of probed directions.
    pub fn exposure_term(&self, probe: Option<&ExposureProbe>) -> f32 {
        let t = self.tuning;
        probe.map_or(0.0, |p| {
            (p.open_fraction() * t.exposure_scale).clamp(0.0, t.exposure_ceiling.max(0.0))
        })
    }

    pub fn weight_at(&self, position: Vec3, inputs: &TacticalInputs, probe: Option<&ExposureProbe>) -> f32 {
        self.cover_term(position, &inputs.cover_sources)
            + self.threat_term(position, inputs.threat.as_ref())
            + self.exposure_term(probe)
    }

    pub fn classify(&self, weight: f32) -> TacticalClass {
        TacticalClass::from_weight(weight, self.tuning.safe_threshold, self.tuning.danger_threshold)
    }

    /// Weights for every cell of `graph`, sampled at cell centroids.
    ///
    /// A pure function of its arguments: the same graph, inputs and tuning
    /// always produce the same table contents.
    pub fn compute_table(&self, graph: &NavGraph, inputs: &TacticalInputs, generation: u64) -> WeightTable {
        let mut probes: Vec<Option<&ExposureProbe>> = vec![None; graph.len()];
        for probe in &inputs.exposure {
            // Last probe for a cell wins; probes for unknown cells are ignored.
            if let Some(slot) = probes.get_mut(probe.cell.index()) {
                *slot = Some(probe);
            }
        }

        let mut weights = Vec::with_capacity(graph.len());
        let mut classes = Vec::with_capacity(graph.len());
        for cell in graph.cells() {
            let weight = self.weight_at(cell.centroid, inputs, probes[cell.id.index()]);
            weights.push(weight);
            classes.push(self.classify(weight));
        }

        WeightTable::new(graph.fingerprint(), generation, weights, classes)
    }
}
