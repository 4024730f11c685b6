use bevy::prelude::*;
use std::sync::Arc;
use tactinav::nav::goal_bounds::GoalBoundsJob;
use tactinav::nav::mesh::{build_graph, CellId, NavGraph, RawSurface};
use tactinav::nav::search::{NavQuery, SearchScratch, SearchSettings};
use tactinav::nav::tactical::WeightTable;
use tactinav::nav::{CostModel, NavError};

fn random_obstacle_grid(size: usize, seed: u64) -> NavGraph {
    let mut rng = fastrand::Rng::with_seed(seed);
    let blocked: Vec<bool> = (0..size * size).map(|_| rng.f32() < 0.2).collect();
    let surface = RawSurface::grid(size, size, 1.0, Vec3::ZERO)
        .carve_grid(size, size, |col, row| blocked[row * size + col]);
    build_graph(&surface, 1.0e-4)
}

fn cell_point(graph: &NavGraph, rng: &mut fastrand::Rng) -> Vec3 {
    let cell = CellId(rng.u32(0..graph.len() as u32));
    let [a, b, c] = graph.corners(cell);
    // Barycentric weights kept clear of the edges.
    let (u, v) = (0.1 + rng.f32() * 0.4, 0.1 + rng.f32() * 0.4);
    a + (b - a) * u + (c - a) * v
}

fn path_cost(graph: &NavGraph, weights: &WeightTable, cells: &[CellId]) -> f32 {
    let model = CostModel::default();
    cells.windows(2).map(|w| model.edge_cost(graph, weights, w[0], w[1])).sum()
}

/// Equal-cost corridors between the same end cells splice to lengths at most
/// this far apart.
fn splice_slack(graph: &NavGraph, start: Vec3, goal: Vec3, cells: &[CellId]) -> f32 {
    let (Some(&first), Some(&last)) = (cells.first(), cells.last()) else {
        return 0.0;
    };
    2.0 * (start.distance(graph.centroid(first)) + goal.distance(graph.centroid(last))) + 1.0e-3
}

/// Over neutral weights, pruned searches with fresh bounds return paths of the
/// same cost as the full search and never miss a path it finds. Reported
/// lengths agree up to the splice slack at both ends.
#[test]
fn test_pruned_paths_are_never_worse() {
    for seed in 0..5 {
        let graph = Arc::new(random_obstacle_grid(14, seed));
        let weights = Arc::new(WeightTable::neutral(&graph));
        let mut job = GoalBoundsJob::new(graph.clone(), weights.clone(), CostModel::default());
        while job.is_running() {
            job.step(50, true);
        }
        let bounds = job.bounds().expect("bounds ready").clone();

        let query = NavQuery::new(&graph, &weights, Some(bounds.as_ref()), SearchSettings::default());
        let mut scratch = SearchScratch::with_capacity(graph.len());
        let mut rng = fastrand::Rng::with_seed(seed + 100);
        let (mut found, mut unreachable) = (0, 0);

        for _ in 0..200 {
            let start = cell_point(&graph, &mut rng);
            let goal = cell_point(&graph, &mut rng);
            let full = query.find_path_with(&mut scratch, start, goal, false);
            let pruned = query.find_path_with(&mut scratch, start, goal, true);
            match (full, pruned) {
                (Ok(full), Ok(pruned)) => {
                    let full_cost = path_cost(&graph, &weights, &full.cells);
                    let pruned_cost = path_cost(&graph, &weights, &pruned.cells);
                    assert!(
                        (pruned_cost - full_cost).abs() <= 1.0e-3,
                        "seed {}: pruned {} vs full {} ({:?} -> {:?})",
                        seed,
                        pruned_cost,
                        full_cost,
                        start,
                        goal
                    );
                    assert_eq!(pruned.cells.first(), full.cells.first());
                    assert_eq!(pruned.cells.last(), full.cells.last());

                    let slack = splice_slack(&graph, start, goal, &full.cells);
                    assert!(
                        pruned.metrics.path_length <= full.metrics.path_length + slack,
                        "seed {}: pruned length {} > full {} + {}",
                        seed,
                        pruned.metrics.path_length,
                        full.metrics.path_length,
                        slack
                    );
                    found += 1;
                }
                (Err(NavError::NoPathFound { .. }), Err(NavError::NoPathFound { .. })) => unreachable += 1,
                (full, pruned) => panic!("seed {}: full {:?} but pruned {:?}", seed, full, pruned),
            }
        }
        println!("seed {}: {} paths, {} unreachable pairs", seed, found, unreachable);
        assert!(found > 0);
    }
}

#[test]
fn test_pruning_expands_fewer_cells_overall() {
    let graph = random_obstacle_grid(20, 77);
    let weights = WeightTable::neutral(&graph);
    let bounds = tactinav::nav::goal_bounds::GoalBounds::compute(&graph, &weights, CostModel::default());
    let query = NavQuery::new(&graph, &weights, Some(&bounds), SearchSettings::default());
    let mut rng = fastrand::Rng::with_seed(5);
    let (mut full_total, mut pruned_total) = (0usize, 0usize);

    for _ in 0..150 {
        let start = cell_point(&graph, &mut rng);
        let goal = cell_point(&graph, &mut rng);
        if let (Ok(full), Ok(pruned)) = (query.find_path(start, goal, false), query.find_path(start, goal, true)) {
            full_total += full.metrics.cells_expanded;
            pruned_total += pruned.metrics.cells_expanded;
        }
    }
    println!("expanded: {} full, {} pruned", full_total, pruned_total);
    assert!(pruned_total <= full_total);
}
