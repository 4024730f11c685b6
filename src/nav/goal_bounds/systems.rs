use bevy::prelude::*;

use super::cache::{cache_path, load_bounds, save_bounds};
use super::job::{GoalBoundsJob, GoalBoundsStep};
use super::preprocess::GoalBounds;
use crate::nav::config::NavConfig;
use crate::nav::cost::CostModel;
use crate::nav::mesh::{NavGraph, NavSurface, SurfaceBaked};
use crate::nav::tactical::TacticalWeights;
use crate::nav::NavTick;

/// Discard the current goal bounds and rebuild them against the weights
/// published right now. Weight drift alone never triggers this.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct RebuildGoalBounds;

/// Drive the goal-bounds job one batch per update.
///
/// Starts a job once a surface is baked and a weight table for it has been
/// published, restarts from scratch when the topology changes, and reads or
/// writes the on-disk cache when `bounds_cache_dir` is set.
#[tactinav_macros::profile]
pub fn step_goal_bounds(
    mut baked: MessageReader<SurfaceBaked>,
    mut rebuild: MessageReader<RebuildGoalBounds>,
    surface: Res<NavSurface>,
    weights: Res<TacticalWeights>,
    config: Res<NavConfig>,
    mut job: ResMut<GoalBoundsJob>,
    tick: Res<NavTick>,
) {
    let rebaked = baked.read().count() > 0;
    let rebuild_requested = rebuild.read().count() > 0;

    let graph = &surface.graph;
    let stale_topology = job.state() != GoalBoundsStep::Idle
        && job.graph_fingerprint() != Some(graph.fingerprint());
    if rebaked || stale_topology {
        if job.state() != GoalBoundsStep::Idle {
            info!("[GOAL_BOUNDS] Topology changed; discarding bounds for a full rebuild");
        }
        job.reset();
    }
    if !surface.is_baked() {
        return;
    }

    if job.state() == GoalBoundsStep::Idle || rebuild_requested {
        // The cost function needs weights for this topology first.
        if !weights.current().matches(graph) {
            return;
        }
        if !rebuild_requested {
            if let Some(bounds) = load_cached(&config, graph) {
                if job.adopt(graph.clone(), bounds) {
                    info!("[GOAL_BOUNDS] Adopted cached bounds for surface {:016x}", graph.fingerprint());
                    return;
                }
            }
        }
        job.start(graph.clone(), weights.snapshot(), CostModel::from_config(&config));
    }

    if job.is_running() {
        let state = job.step(config.bounds_batch_size, config.bounds_parallel);
        crate::profile_log!(tick, "[GOAL_BOUNDS] {:.0}% swept", job.progress() * 100.0);
        if state == GoalBoundsStep::Ready {
            store_cached(&config, &job);
        }
    }
}

fn load_cached(config: &NavConfig, graph: &NavGraph) -> Option<GoalBounds> {
    let dir = config.bounds_cache_dir.as_ref()?;
    let path = cache_path(dir, graph.fingerprint());
    if !path.exists() {
        return None;
    }
    match load_bounds(&path) {
        Ok(bounds) => Some(bounds),
        Err(e) => {
            warn!("[GOAL_BOUNDS] Ignoring unreadable cache {}: {}", path.display(), e);
            None
        }
    }
}

fn store_cached(config: &NavConfig, job: &GoalBoundsJob) {
    let (Some(dir), Some(bounds)) = (config.bounds_cache_dir.as_ref(), job.bounds()) else {
        return;
    };
    let path = cache_path(dir, bounds.graph_fingerprint());
    match save_bounds(&path, bounds) {
        Ok(()) => info!("[GOAL_BOUNDS] Cached bounds to {}", path.display()),
        Err(e) => warn!("[GOAL_BOUNDS] Failed to cache bounds to {}: {}", path.display(), e),
    }
}
