use bevy::prelude::*;
use std::collections::VecDeque;

use super::astar::NavQuery;
use super::scratch::SearchScratch;
use super::types::{SearchMetrics, SearchSettings};
use crate::nav::config::{NavConfig, NotReadyPolicy};
use crate::nav::error::NavError;
use crate::nav::goal_bounds::GoalBoundsJob;
use crate::nav::mesh::{CellId, NavSurface};
use crate::nav::tactical::{TacticalTuning, TacticalWeights};

/// Ask for a path for `entity`. Answered with a [`NavPath`] or a
/// [`PathFailed`] component on that entity.
#[derive(Message, Debug, Clone)]
pub struct PathRequest {
    pub entity: Entity,
    pub start: Vec3,
    pub goal: Vec3,
    pub pruning: bool,
}

/// A resolved path, ready for whatever steers the agent along it.
#[derive(Component, Debug, Clone)]
pub struct NavPath {
    pub points: Vec<Vec3>,
    pub cells: Vec<CellId>,
    pub current_index: usize,
    pub metrics: SearchMetrics,
}

impl NavPath {
    pub fn next_waypoint(&self) -> Option<Vec3> {
        self.points.get(self.current_index).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.current_index >= self.points.len()
    }
}

/// The last request for this entity failed.
#[derive(Component, Debug, Clone)]
pub struct PathFailed(pub NavError);

/// Requests carried over to a later update: over the per-tick budget, or
/// waiting for goal bounds under [`NotReadyPolicy::Defer`].
#[derive(Resource, Default)]
pub struct DeferredPathRequests(pub VecDeque<PathRequest>);

/// Running totals over every query served through the ECS.
#[derive(Resource, Default, Debug, Clone)]
pub struct PathStats {
    pub served: u64,
    pub failed: u64,
    pub deferred: u64,
    pub pruned: u64,
    pub cells_expanded: u64,
}

#[tactinav_macros::profile(2)]
pub fn process_path_requests(
    mut path_requests: MessageReader<PathRequest>,
    mut deferred: ResMut<DeferredPathRequests>,
    mut commands: Commands,
    surface: Res<NavSurface>,
    weights: Res<TacticalWeights>,
    job: Res<GoalBoundsJob>,
    config: Res<NavConfig>,
    tuning: Res<TacticalTuning>,
    mut stats: ResMut<PathStats>,
    mut scratch: Local<SearchScratch>,
) {
    if path_requests.is_empty() && deferred.0.is_empty() {
        return;
    }

    let start_time = std::time::Instant::now();
    // Oldest first: carried-over requests, then this frame's.
    let mut pending: VecDeque<PathRequest> = std::mem::take(&mut deferred.0);
    pending.extend(path_requests.read().cloned());
    let request_count = pending.len();

    if !surface.is_baked() {
        warn!("[PATHFINDING] {} request(s) waiting for a baked surface", request_count);
        deferred.0 = pending;
        return;
    }

    let snapshot = weights.snapshot();
    let bounds = job.bounds().map(|b| b.as_ref());
    let query = NavQuery::new(
        &surface.graph,
        &snapshot,
        bounds,
        SearchSettings::from_config(&config, &tuning),
    );
    let bounds_ready = query.ready_bounds().is_some();

    let budget = config.max_requests_per_tick.max(1);
    let mut handled = 0;
    while let Some(request) = pending.pop_front() {
        if handled >= budget {
            pending.push_front(request);
            break;
        }
        if request.pruning && !bounds_ready && config.not_ready_policy == NotReadyPolicy::Defer {
            deferred.0.push_back(request);
            stats.deferred += 1;
            continue;
        }
        handled += 1;

        let result = query.find_path_with(&mut scratch, request.start, request.goal, request.pruning);
        let Ok(mut entity) = commands.get_entity(request.entity) else {
            continue;
        };
        match result {
            Ok(found) => {
                stats.served += 1;
                stats.cells_expanded += found.metrics.cells_expanded as u64;
                if found.metrics.pruned {
                    stats.pruned += 1;
                }
                entity
                    .insert(NavPath {
                        points: found.points,
                        cells: found.cells,
                        current_index: 0,
                        metrics: found.metrics,
                    })
                    .remove::<PathFailed>();
            }
            Err(e) => {
                stats.failed += 1;
                debug!("[PATHFINDING] Request for {:?} failed: {}", request.entity, e);
                entity.insert(PathFailed(e)).remove::<NavPath>();
            }
        }
    }
    deferred.0.extend(pending);

    if request_count > budget {
        warn!("[PATHFINDING] High path request count: {} pending requests!", request_count);
    }
    let total_duration = start_time.elapsed();
    if total_duration.as_millis() > 100 {
        warn!("[PATHFINDING] Slow batch processing: {:?} for {} requests", total_duration, handled);
    }
}
