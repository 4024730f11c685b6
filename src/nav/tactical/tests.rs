use super::*;
use crate::nav::mesh::{build_graph, CellId, RawSurface};
use bevy::prelude::*;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1.0e-5
}

#[test]
fn test_cover_term_is_negative_and_clamped() {
    let tuning = TacticalTuning::default();
    let model = TacticalModel::new(&tuning);

    assert!(approx(model.cover_term(Vec3::ZERO, &[]), 0.0));
    let one = model.cover_term(Vec3::ZERO, &[Vec3::new(3.0, 0.0, 0.0)]);
    assert!(approx(one, -0.75), "half radius, strength 1.5 -> -0.75, got {}", one);

    let nearer = model.cover_term(Vec3::ZERO, &[Vec3::new(1.0, 0.0, 0.0)]);
    assert!(nearer < one, "nearer cover should give more negative weight");

    let crowd = vec![Vec3::ZERO; 20];
    assert!(approx(model.cover_term(Vec3::ZERO, &crowd), tuning.cover_floor));

    let far = model.cover_term(Vec3::ZERO, &[Vec3::new(10.0, 0.0, 0.0)]);
    assert!(approx(far, 0.0));
}

#[test]
fn test_threat_term_decays_to_zero_at_radius() {
    let tuning = TacticalTuning::default();
    let model = TacticalModel::new(&tuning);
    let threat = ThreatSource {
        position: Vec3::ZERO,
        radius: 10.0,
        multiplier: 2.0,
    };

    let at_source = model.threat_term(Vec3::ZERO, Some(&threat));
    let halfway = model.threat_term(Vec3::new(5.0, 0.0, 0.0), Some(&threat));
    let at_edge = model.threat_term(Vec3::new(10.0, 0.0, 0.0), Some(&threat));
    let beyond = model.threat_term(Vec3::new(25.0, 0.0, 0.0), Some(&threat));

    assert!(approx(at_source, 20.0));
    assert!(approx(halfway, 10.0));
    assert!(approx(at_edge, 0.0));
    assert!(approx(beyond, 0.0));
    assert!(approx(model.threat_term(Vec3::ZERO, None), 0.0));

    let heavy = ThreatSource { multiplier: 100.0, ..threat };
    assert!(approx(model.threat_term(Vec3::ZERO, Some(&heavy)), tuning.threat_ceiling));
}

#[test]
fn test_exposure_term_tracks_open_fraction() {
    let tuning = TacticalTuning::default();
    let model = TacticalModel::new(&tuning);
    let probe = |open, sampled| ExposureProbe {
        cell: CellId(0),
        open_directions: open,
        sampled_directions: sampled,
    };

    assert!(approx(model.exposure_term(None), 0.0));
    assert!(approx(model.exposure_term(Some(&probe(0, 4))), 0.0));
    assert!(approx(model.exposure_term(Some(&probe(2, 4))), 1.5));
    assert!(approx(model.exposure_term(Some(&probe(4, 4))), 3.0));
    assert!(approx(model.exposure_term(Some(&probe(9, 4))), 3.0), "open count is capped by samples");
    assert!(approx(model.exposure_term(Some(&probe(3, 0))), 0.0));
}

#[test]
fn test_classification_thresholds() {
    assert_eq!(TacticalClass::from_weight(-2.0, -1.0, 3.0), TacticalClass::Safe);
    assert_eq!(TacticalClass::from_weight(-1.0, -1.0, 3.0), TacticalClass::Safe);
    assert_eq!(TacticalClass::from_weight(0.0, -1.0, 3.0), TacticalClass::Neutral);
    assert_eq!(TacticalClass::from_weight(3.0, -1.0, 3.0), TacticalClass::Danger);
}

#[test]
fn test_refresh_twice_with_same_inputs_is_idempotent() {
    let graph = build_graph(&RawSurface::grid(6, 6, 1.0, Vec3::ZERO), 1.0e-4);
    let tuning = TacticalTuning::default();
    let inputs = TacticalInputs {
        cover_sources: vec![Vec3::new(1.0, 0.0, 1.0), Vec3::new(4.5, 0.0, 2.0)],
        threat: Some(ThreatSource {
            position: Vec3::new(5.0, 0.0, 5.0),
            radius: 4.0,
            multiplier: 1.5,
        }),
        exposure: vec![ExposureProbe {
            cell: CellId(3),
            open_directions: 3,
            sampled_directions: 4,
        }],
    };

    let mut weights = TacticalWeights::default();
    assert!(refresh_weights(&mut weights, &graph, &inputs, &tuning));
    let first = weights.snapshot();
    assert!(!refresh_weights(&mut weights, &graph, &inputs, &tuning), "identical inputs should not republish");
    let second = weights.snapshot();

    assert_eq!(first.weights(), second.weights());
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(first.matches(&graph));

    // Independent recomputation agrees value for value.
    let recomputed = TacticalModel::new(&tuning).compute_table(&graph, &inputs, 99);
    assert_eq!(recomputed.weights(), first.weights());
}

#[test]
fn test_publish_replaces_snapshot_without_touching_old_readers() {
    let graph = build_graph(&RawSurface::grid(2, 2, 1.0, Vec3::ZERO), 1.0e-4);
    let tuning = TacticalTuning::default();
    let mut weights = TacticalWeights::default();
    refresh_weights(&mut weights, &graph, &TacticalInputs::default(), &tuning);

    let reader = weights.snapshot();
    let threatened = TacticalInputs {
        threat: Some(ThreatSource {
            position: Vec3::new(1.0, 0.0, 1.0),
            radius: 3.0,
            multiplier: 1.0,
        }),
        ..Default::default()
    };
    assert!(refresh_weights(&mut weights, &graph, &threatened, &tuning));

    assert!(reader.weights().iter().all(|&w| w == 0.0), "old snapshot must stay as it was");
    assert!(weights.current().weights().iter().all(|&w| w > 0.0));
    assert_eq!(weights.current().generation(), reader.generation() + 1);
}
