use bevy::prelude::*;
use std::time::Duration;

use super::model::{TacticalInputs, TacticalModel, TacticalTuning};
use super::table::TacticalWeights;
use crate::nav::config::NavConfig;
use crate::nav::mesh::{NavGraph, NavSurface, SurfaceBaked};

/// Force a weight refresh on the next update instead of waiting for the
/// timer (e.g. a threat just appeared).
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct RefreshWeights;

/// Cadence of periodic weight refreshes.
#[derive(Resource)]
pub struct WeightRefreshTimer(pub Timer);

impl Default for WeightRefreshTimer {
    fn default() -> Self {
        Self::from_secs(NavConfig::default().weight_refresh_interval_secs)
    }
}

impl WeightRefreshTimer {
    pub fn from_secs(secs: f32) -> Self {
        Self(Timer::from_seconds(secs.max(0.01), TimerMode::Repeating))
    }
}

/// Recompute every cell weight and publish the result as a new snapshot.
///
/// Returns `false` when the new table is identical to the published one, in
/// which case nothing is published and the generation does not move.
pub fn refresh_weights(
    weights: &mut TacticalWeights,
    graph: &NavGraph,
    inputs: &TacticalInputs,
    tuning: &TacticalTuning,
) -> bool {
    let table = TacticalModel::new(tuning).compute_table(graph, inputs, weights.next_generation());
    let current = weights.current();
    if current.matches(graph) && current.fingerprint() == table.fingerprint() {
        return false;
    }
    weights.publish(table);
    true
}

#[tactinav_macros::profile(2)]
pub fn refresh_tactical_weights(
    time: Res<Time>,
    config: Res<NavConfig>,
    mut timer: ResMut<WeightRefreshTimer>,
    mut forced: MessageReader<RefreshWeights>,
    mut baked: MessageReader<SurfaceBaked>,
    surface: Res<NavSurface>,
    inputs: Res<TacticalInputs>,
    tuning: Res<TacticalTuning>,
    mut weights: ResMut<TacticalWeights>,
) {
    if config.is_changed() {
        let interval = Duration::from_secs_f32(config.weight_refresh_interval_secs.max(0.01));
        timer.0.set_duration(interval);
    }
    timer.0.tick(time.delta());

    let forced = forced.read().count() > 0;
    let rebaked = baked.read().count() > 0;
    if !(forced || rebaked || timer.0.just_finished()) {
        return;
    }
    if !surface.is_baked() {
        return;
    }

    let refresh_start = std::time::Instant::now();
    if refresh_weights(&mut weights, &surface.graph, &inputs, &tuning) {
        debug!(
            "[WEIGHTS] Published generation {} for {} cells in {:?} (forced: {}, rebake: {})",
            weights.current().generation(),
            surface.graph.len(),
            refresh_start.elapsed(),
            forced,
            rebaked
        );
    }
}
