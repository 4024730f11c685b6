use bevy::math::Vec3Swizzles;
use bevy::prelude::*;

use super::metrics::{path_length, tactical_score};
use super::scratch::{OpenEntry, SearchScratch, NO_PARENT};
use super::types::{FoundPath, SearchMetrics, SearchSettings};
use crate::nav::config::NotReadyPolicy;
use crate::nav::error::{NavError, QueryEnd};
use crate::nav::goal_bounds::GoalBounds;
use crate::nav::mesh::{CellId, NavGraph};
use crate::nav::tactical::WeightTable;

/// Safety limit on expansions, well above any sane surface size.
const MAX_EXPANSIONS: usize = 4_000_000;

/// Point-to-point queries over one graph, weight snapshot and (optionally)
/// one set of goal bounds.
///
/// Borrows everything immutably, so queries can run side by side; each
/// brings its own [`SearchScratch`].
///
/// # Optimality
///
/// The heuristic is the straight-line distance between cell centres and the
/// open set is ordered by `g + h + w`, where `w` is the tactical weight of the
/// cell being entered. With any non-zero weight that ordering over-estimates
/// and the search is best-effort: it returns a good, safe path but not
/// necessarily the cheapest one. Over an all-neutral (or uniform) weight table
/// it is an exact shortest-path search.
///
/// # Pruning
///
/// Bounds current for the weight table keep every edge of some cheapest path
/// to the goal, so pruning never hides the best route and never turns a
/// reachable goal into [`NavError::NoPathFound`]. What that buys depends on
/// the ordering:
/// - neutral or uniform weights: pruned and unpruned results cost the same.
///   Equal-cost corridors may splice differently, so `path_length` can differ
///   by up to twice the distance from the query points to their cell centres.
/// - non-uniform weights: both searches are best-effort and the pruned one can
///   settle on a costlier route than the unpruned one.
pub struct NavQuery<'a> {
    graph: &'a NavGraph,
    weights: &'a WeightTable,
    bounds: Option<&'a GoalBounds>,
    settings: SearchSettings,
}

impl<'a> NavQuery<'a> {
    pub fn new(
        graph: &'a NavGraph,
        weights: &'a WeightTable,
        bounds: Option<&'a GoalBounds>,
        settings: SearchSettings,
    ) -> Self {
        Self { graph, weights, bounds, settings }
    }

    /// Bounds usable for pruning on this graph, or `None` if there are none
    /// or they were built for a different topology.
    pub fn ready_bounds(&self) -> Option<&'a GoalBounds> {
        self.bounds.filter(|b| b.matches_graph(self.graph))
    }

    /// Find a path with freshly allocated scratch storage.
    pub fn find_path(&self, start: Vec3, goal: Vec3, pruning: bool) -> Result<FoundPath, NavError> {
        let mut scratch = SearchScratch::default();
        self.find_path_with(&mut scratch, start, goal, pruning)
    }

    /// Find a path reusing `scratch`. The scratch is fully reset first.
    pub fn find_path_with(
        &self,
        scratch: &mut SearchScratch,
        start: Vec3,
        goal: Vec3,
        pruning: bool,
    ) -> Result<FoundPath, NavError> {
        let started = std::time::Instant::now();
        let graph = self.graph;
        if graph.is_empty() {
            return Err(NavError::EmptySurface);
        }

        let max_height = self.settings.locate_max_height;
        let start_cell = graph
            .locate(start, max_height)
            .ok_or(NavError::PointOffSurface { point: start, which: QueryEnd::Start })?;
        let goal_cell = graph
            .locate(goal, max_height)
            .ok_or(NavError::PointOffSurface { point: goal, which: QueryEnd::Goal })?;

        let bounds = if pruning {
            match (self.ready_bounds(), self.settings.not_ready_policy) {
                (Some(bounds), _) => Some(bounds),
                (None, NotReadyPolicy::Unpruned) => None,
                (None, NotReadyPolicy::Reject | NotReadyPolicy::Defer) => {
                    return Err(NavError::PreprocessingNotReady);
                }
            }
        } else {
            None
        };
        let bounds_stale = bounds.map_or(false, |b| !b.is_current_for(self.weights, &self.settings.cost_model));

        let goal_xz = goal.xz();
        let goal_center = graph.centroid(goal_cell);
        let cost_model = &self.settings.cost_model;

        scratch.reset(graph.len());
        let h0 = graph.centroid(start_cell).distance(goal_center);
        scratch.g[start_cell.index()] = 0.0;
        scratch.open.push(OpenEntry {
            f: h0 + self.weights.weight(start_cell),
            h: h0,
            cell: start_cell,
        });

        let mut expanded = 0;
        while let Some(OpenEntry { cell: current, .. }) = scratch.open.pop() {
            if scratch.closed.put(current.index()) {
                continue;
            }
            expanded += 1;

            if current == goal_cell {
                let cells = reconstruct_cells(scratch, current);
                let points = splice_points(graph, &cells, start, goal);
                let metrics = SearchMetrics {
                    cells_expanded: expanded,
                    elapsed: started.elapsed(),
                    path_length: path_length(&points),
                    tactical_score: tactical_score(&cells, self.weights, self.settings.score_scale),
                    pruned: bounds.is_some(),
                    bounds_stale,
                };
                return Ok(FoundPath { points, cells, metrics });
            }

            if expanded >= MAX_EXPANSIONS {
                error!(
                    "[PATHFINDING] A* exceeded max expansions ({}) - start cell {:?}, goal cell {:?}",
                    MAX_EXPANSIONS, start_cell, goal_cell
                );
                break;
            }

            let g_current = scratch.g[current.index()];
            for &next in graph.neighbors(current) {
                if scratch.closed.contains(next.index()) {
                    continue;
                }
                if let Some(bounds) = bounds {
                    if !bounds.allows(current, next, goal_xz) {
                        continue;
                    }
                }

                let tentative = g_current + cost_model.edge_cost(graph, self.weights, current, next);
                if tentative < scratch.g[next.index()] {
                    scratch.g[next.index()] = tentative;
                    scratch.parent[next.index()] = current.0;
                    let h = graph.centroid(next).distance(goal_center);
                    scratch.open.push(OpenEntry {
                        f: tentative + h + self.weights.weight(next),
                        h,
                        cell: next,
                    });
                }
            }
        }

        Err(NavError::NoPathFound { cells_expanded: expanded })
    }
}

fn reconstruct_cells(scratch: &SearchScratch, goal: CellId) -> Vec<CellId> {
    let mut cells = vec![goal];
    let mut current = goal;
    while scratch.parent[current.index()] != NO_PARENT {
        current = CellId(scratch.parent[current.index()]);
        cells.push(current);
    }
    cells.reverse();
    cells
}

/// Exact start, interior cell centres, exact goal.
fn splice_points(graph: &NavGraph, cells: &[CellId], start: Vec3, goal: Vec3) -> Vec<Vec3> {
    let mut points = Vec::with_capacity(cells.len() + 1);
    points.push(start);
    if cells.len() > 2 {
        points.extend(cells[1..cells.len() - 1].iter().map(|&c| graph.centroid(c)));
    }
    points.push(goal);
    points
}
