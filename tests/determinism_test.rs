use bevy::prelude::*;
use tactinav::nav::config::NavConfig;
use tactinav::nav::goal_bounds::GoalBoundsJob;
use tactinav::nav::mesh::{BakeSurface, CellId, RawSurface};
use tactinav::nav::search::{NavPath, PathFailed, PathRequest};
use tactinav::nav::tactical::{ExposureProbe, TacticalInputs, TacticalWeights, ThreatSource};
use tactinav::nav::NavPlugin;

const GRID: usize = 16;

fn scenario_surface() -> RawSurface {
    RawSurface::grid(GRID, GRID, 1.0, Vec3::ZERO).carve_grid(GRID, GRID, |col, row| {
        (col == 5 && row < 12) || (col == 10 && row > 3) || (row == 8 && (12..15).contains(&col))
    })
}

fn scenario_inputs(seed: u64, cells: usize) -> TacticalInputs {
    let mut rng = fastrand::Rng::with_seed(seed);
    let cover_sources = (0..6)
        .map(|_| Vec3::new(rng.f32() * GRID as f32, 0.0, rng.f32() * GRID as f32))
        .collect();
    let exposure = (0..40)
        .map(|_| ExposureProbe {
            cell: CellId(rng.u32(0..cells as u32)),
            open_directions: rng.u8(0..=8),
            sampled_directions: 8,
        })
        .collect();
    TacticalInputs {
        cover_sources,
        threat: Some(ThreatSource {
            position: Vec3::new(8.0, 0.0, 8.0),
            radius: 5.0,
            multiplier: 1.5,
        }),
        exposure,
    }
}

/// Run the same script through a fresh app and collect every answer.
fn run_scenario(seed: u64) -> (Vec<(Vec<Vec3>, Vec<CellId>, usize)>, Vec<f32>) {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(NavPlugin);
    app.insert_resource(NavConfig {
        bounds_batch_size: 37,
        ..NavConfig::default()
    });

    let surface = scenario_surface();
    let cells = surface.triangle_count();
    app.insert_resource(scenario_inputs(seed, cells));
    app.world_mut().write_message(BakeSurface(surface));
    for _ in 0..200 {
        app.update();
        if app.world().resource::<GoalBoundsJob>().is_ready() {
            break;
        }
    }
    assert!(app.world().resource::<GoalBoundsJob>().is_ready());

    let mut rng = fastrand::Rng::with_seed(seed ^ 0x5eed);
    let mut entities = Vec::new();
    for i in 0..64 {
        let start = Vec3::new(rng.f32() * GRID as f32, 0.0, rng.f32() * GRID as f32);
        let goal = Vec3::new(rng.f32() * GRID as f32, 0.0, rng.f32() * GRID as f32);
        let entity = app.world_mut().spawn_empty().id();
        app.world_mut().write_message(PathRequest { entity, start, goal, pruning: i % 2 == 0 });
        entities.push(entity);
    }
    app.update();

    let answers = entities
        .iter()
        .map(|&e| match app.world().get::<NavPath>(e) {
            Some(path) => (path.points.clone(), path.cells.clone(), path.metrics.cells_expanded),
            None => {
                assert!(app.world().get::<PathFailed>(e).is_some(), "every request gets an answer");
                (Vec::new(), Vec::new(), 0)
            }
        })
        .collect();
    let weights = app.world().resource::<TacticalWeights>().current().weights().to_vec();
    (answers, weights)
}

#[test]
fn test_identical_runs_produce_identical_paths() {
    let (first, first_weights) = run_scenario(1234);
    let (second, second_weights) = run_scenario(1234);

    assert_eq!(first_weights, second_weights);
    assert_eq!(first.len(), second.len());
    for (i, (a, b)) in first.iter().zip(second.iter()).enumerate() {
        assert_eq!(a, b, "request {} diverged between runs", i);
    }
    assert!(first.iter().any(|(points, _, _)| !points.is_empty()), "scenario should find some paths");
}

#[test]
fn test_different_inputs_change_weights() {
    let (_, a) = run_scenario(1);
    let (_, b) = run_scenario(2);
    assert_ne!(a, b);
}
