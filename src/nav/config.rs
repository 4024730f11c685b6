use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};

use super::tactical::TacticalTuning;

/// What a pruned query does while goal bounds are still being computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotReadyPolicy {
    /// Run the query without pruning. Same path, more expanded cells.
    #[default]
    Unpruned,
    /// Fail the query with `PreprocessingNotReady`.
    Reject,
    /// Keep ECS requests queued until bounds are ready. The direct query API
    /// cannot wait and reports `PreprocessingNotReady` instead.
    Defer,
}

/// Static navigation configuration loaded once at startup.
///
/// These values shape the bake and the cost function. Changing them after a
/// bake would make existing goal bounds disagree with the search, so they are
/// not hot-reloaded.
#[derive(Resource, Deserialize, Serialize, Clone, Debug)]
pub struct NavConfig {
    // Bake
    pub weld_epsilon: f32,
    pub locate_max_height: f32,

    // Cost function (shared by preprocessing and search)
    pub min_step_cost: f32,
    pub danger_transition_penalty: f32,

    // Weight refresh
    pub weight_refresh_interval_secs: f32,

    // Goal bounds
    pub bounds_batch_size: usize,
    pub bounds_parallel: bool,
    pub bounds_cache_dir: Option<String>,
    pub not_ready_policy: NotReadyPolicy,

    // Queries
    pub max_requests_per_tick: usize,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            weld_epsilon: 1.0e-4,
            locate_max_height: 2.0,
            min_step_cost: 0.05,
            danger_transition_penalty: 2.0,
            weight_refresh_interval_secs: 0.5,
            bounds_batch_size: 64,
            bounds_parallel: true,
            bounds_cache_dir: None,
            not_ready_policy: NotReadyPolicy::Unpruned,
            max_requests_per_tick: 256,
        }
    }
}

/// Hot-reloadable tactical tuning, authored as `*.tactical.ron`.
///
/// Only affects weights, which are republished on the next refresh anyway.
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug)]
pub struct TacticalProfile {
    pub tuning: TacticalTuning,
}

#[derive(Resource)]
pub struct TacticalProfileHandle(pub Handle<TacticalProfile>);

/// Loads `assets/nav_config.ron` and the hot-reloadable tactical profile.
///
/// Optional: [`NavPlugin`](super::NavPlugin) runs on defaults without it.
pub struct NavConfigPlugin;

impl Plugin for NavConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<TacticalProfile>::new(&["tactical.ron"]))
            .add_systems(Startup, (load_nav_config, setup_tactical_profile).chain())
            .add_systems(Update, apply_tactical_profile);
    }
}

pub const NAV_CONFIG_PATH: &str = "assets/nav_config.ron";

/// Parse a [`NavConfig`] from RON text.
pub fn parse_nav_config(contents: &str) -> Result<NavConfig, ron::error::SpannedError> {
    ron::from_str::<NavConfig>(contents)
}

fn load_nav_config(mut commands: Commands) {
    match std::fs::read_to_string(NAV_CONFIG_PATH) {
        Ok(contents) => match parse_nav_config(&contents) {
            Ok(config) => {
                info!("Loaded nav config from {}", NAV_CONFIG_PATH);
                commands.insert_resource(config);
            }
            Err(e) => {
                error!("Failed to parse nav config: {}", e);
                error!("Using default NavConfig");
                commands.insert_resource(NavConfig::default());
            }
        },
        Err(e) => {
            error!("Failed to read {}: {}", NAV_CONFIG_PATH, e);
            error!("Using default NavConfig");
            commands.insert_resource(NavConfig::default());
        }
    }
}

fn setup_tactical_profile(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load("default.tactical.ron");
    commands.insert_resource(TacticalProfileHandle(handle));
}

/// Copy a (re)loaded profile into the live tuning resource.
fn apply_tactical_profile(
    mut events: MessageReader<AssetEvent<TacticalProfile>>,
    handle: Option<Res<TacticalProfileHandle>>,
    profiles: Res<Assets<TacticalProfile>>,
    mut tuning: ResMut<TacticalTuning>,
) {
    let Some(handle) = handle else { return };
    for event in events.read() {
        if event.is_loaded_with_dependencies(&handle.0) || event.is_modified(&handle.0) {
            if let Some(profile) = profiles.get(&handle.0) {
                info!("[WEIGHTS] Tactical profile applied: {:?}", profile.tuning);
                *tuning = profile.tuning.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_is_rejected_and_full_config_parses() {
        assert!(parse_nav_config("(weld_epsilon: 0.01)").is_err());

        let text = r#"(
            weld_epsilon: 0.001,
            locate_max_height: 1.5,
            min_step_cost: 0.1,
            danger_transition_penalty: 3.0,
            weight_refresh_interval_secs: 1.0,
            bounds_batch_size: 8,
            bounds_parallel: false,
            bounds_cache_dir: Some("cache"),
            not_ready_policy: Reject,
            max_requests_per_tick: 32,
        )"#;
        let config = parse_nav_config(text).expect("config should parse");
        assert_eq!(config.bounds_batch_size, 8);
        assert_eq!(config.not_ready_policy, NotReadyPolicy::Reject);
        assert_eq!(config.bounds_cache_dir.as_deref(), Some("cache"));
    }

    #[test]
    fn shipped_assets_parse() {
        parse_nav_config(include_str!("../../assets/nav_config.ron")).expect("nav_config.ron");
        let profile: TacticalProfile =
            ron::from_str(include_str!("../../assets/default.tactical.ron")).expect("default.tactical.ron");
        assert_eq!(profile.tuning, TacticalTuning::default());
    }
}
