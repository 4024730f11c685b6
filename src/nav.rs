use bevy::prelude::*;

pub mod config;
pub mod cost;
pub mod error;
pub mod goal_bounds;
pub mod mesh;
pub mod search;
pub mod tactical;

use config::NavConfig;
use goal_bounds::{GoalBoundsJob, RebuildGoalBounds};
use mesh::{BakeSurface, NavSurface, SurfaceBaked};
use search::{DeferredPathRequests, PathRequest, PathStats};
use tactical::{RefreshWeights, TacticalInputs, TacticalTuning, TacticalWeights, WeightRefreshTimer};

pub use config::{NavConfigPlugin, NotReadyPolicy};
pub use cost::CostModel;
pub use error::{NavError, QueryEnd};

/// Update counter used for periodic perf logging.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct NavTick(pub u64);

/// Ordering of the navigation systems inside one update.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum NavSet {
    Bake,
    Weights,
    Bounds,
    Query,
}

/// Tactical navigation over a baked triangle surface.
///
/// # Control flow
///
/// 1. **Bake:** a [`BakeSurface`] message rebuilds [`NavSurface`] once all
///    static obstacles are placed.
/// 2. **Weights:** [`TacticalWeights`] is republished on a timer, on
///    [`RefreshWeights`] and after every bake, from [`TacticalInputs`].
/// 3. **Bounds:** [`GoalBoundsJob`] sweeps one batch of source cells per
///    update until ready; a new bake restarts it from scratch.
/// 4. **Query:** [`PathRequest`]s are answered with `NavPath`/`PathFailed`
///    components, pruned by the bounds once they are ready.
pub struct NavPlugin;

impl Plugin for NavPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<BakeSurface>();
        app.add_message::<SurfaceBaked>();
        app.add_message::<RefreshWeights>();
        app.add_message::<RebuildGoalBounds>();
        app.add_message::<PathRequest>();

        app.init_resource::<NavConfig>();
        app.init_resource::<NavTick>();
        app.init_resource::<NavSurface>();
        app.init_resource::<TacticalInputs>();
        app.init_resource::<TacticalTuning>();
        app.init_resource::<TacticalWeights>();
        app.init_resource::<WeightRefreshTimer>();
        app.init_resource::<GoalBoundsJob>();
        app.init_resource::<DeferredPathRequests>();
        app.init_resource::<PathStats>();

        app.configure_sets(
            Update,
            (NavSet::Bake, NavSet::Weights, NavSet::Bounds, NavSet::Query).chain(),
        );
        app.add_systems(
            Update,
            (
                advance_nav_tick.before(NavSet::Bake),
                mesh::bake_surface.in_set(NavSet::Bake),
                tactical::refresh_tactical_weights.in_set(NavSet::Weights),
                goal_bounds::step_goal_bounds.in_set(NavSet::Bounds),
                search::process_path_requests.in_set(NavSet::Query),
            ),
        );
    }
}

fn advance_nav_tick(mut tick: ResMut<NavTick>) {
    tick.0 = tick.0.wrapping_add(1);
}
