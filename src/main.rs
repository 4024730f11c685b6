use bevy::prelude::*;

use tactinav::nav::goal_bounds::GoalBoundsJob;
use tactinav::nav::mesh::{BakeSurface, NavSurface, RawSurface};
use tactinav::nav::search::{NavPath, PathFailed, PathRequest, PathStats};
use tactinav::nav::tactical::{TacticalInputs, ThreatSource};
use tactinav::nav::{NavConfigPlugin, NavPlugin};

use rand::Rng;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const DEMO_GRID: usize = 48;
const DEMO_QUERIES: usize = 200;
const MAX_WARMUP_UPDATES: usize = 10_000;

const LOG_DIR: &str = "logs";
const LOG_PREFIX: &str = "tactinav_";
const KEPT_DEMO_LOGS: usize = 25;

/// Route demo output to stdout and to a per-run file under `logs/`.
/// `RUST_LOG` overrides the default filter.
fn setup_file_logging() -> Result<PathBuf, std::io::Error> {
    let log_dir = Path::new(LOG_DIR);
    fs::create_dir_all(log_dir)?;
    prune_demo_logs(log_dir, KEPT_DEMO_LOGS);

    let file_name = format!("{}{}.log", LOG_PREFIX, chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let file_layer = fmt::layer()
        .with_writer(RollingFileAppender::new(Rotation::NEVER, log_dir, &file_name))
        .with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,bevy_asset=warn,tactinav=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_dir.join(file_name))
}

/// Delete all but the newest `keep` demo logs.
fn prune_demo_logs(log_dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    let mut runs: Vec<(Option<SystemTime>, PathBuf)> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_PREFIX) && n.ends_with(".log"))
        })
        .map(|path| (fs::metadata(&path).and_then(|m| m.modified()).ok(), path))
        .collect();
    if runs.len() <= keep {
        return;
    }

    runs.sort();
    let stale = runs.len() - keep;
    for (_, path) in runs.into_iter().take(stale) {
        if let Err(e) = fs::remove_file(&path) {
            eprintln!("Could not remove old demo log {}: {}", path.display(), e);
        }
    }
}

/// A walled compound: two long walls with gaps and a block of crates.
fn demo_surface() -> RawSurface {
    let n = DEMO_GRID;
    RawSurface::grid(n, n, 1.0, Vec3::new(-(n as f32) / 2.0, 0.0, -(n as f32) / 2.0)).carve_grid(
        n,
        n,
        |col, row| {
            let wall_a = col == n / 3 && row != n / 4 && row != 3 * n / 4;
            let wall_b = row == 2 * n / 3 && col > n / 3 && col < n - 4;
            let crates = (n / 2..n / 2 + 4).contains(&col) && (n / 3..n / 3 + 3).contains(&row);
            wall_a || wall_b || crates
        },
    )
}

fn demo_inputs() -> TacticalInputs {
    TacticalInputs {
        cover_sources: vec![
            Vec3::new(-8.0, 0.0, -6.0),
            Vec3::new(2.0, 0.0, -4.0),
            Vec3::new(6.0, 0.0, 10.0),
        ],
        threat: Some(ThreatSource {
            position: Vec3::new(10.0, 0.0, -12.0),
            radius: 14.0,
            multiplier: 1.0,
        }),
        exposure: Vec::new(),
    }
}

fn main() {
    let log_file = match setup_file_logging() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Failed to set up file logging: {}", e);
            return;
        }
    };
    println!("tactinav demo - logging to {}", log_file.display());

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(AssetPlugin::default())
        .add_plugins(NavConfigPlugin)
        .add_plugins(NavPlugin)
        .insert_resource(demo_inputs());
    app.finish();
    app.cleanup();

    app.world_mut().write_message(BakeSurface(demo_surface()));
    let mut warmup = 0;
    while !app.world().resource::<GoalBoundsJob>().is_ready() {
        app.update();
        warmup += 1;
        if warmup >= MAX_WARMUP_UPDATES {
            error!("[DEMO] Goal bounds not ready after {} updates; giving up", warmup);
            return;
        }
    }
    let cells = app.world().resource::<NavSurface>().graph.len();
    info!("[DEMO] {} cells baked, goal bounds ready after {} updates", cells, warmup);

    let half = DEMO_GRID as f32 / 2.0;
    let mut rng = rand::rng();
    let mut entities = Vec::with_capacity(DEMO_QUERIES);
    for i in 0..DEMO_QUERIES {
        let start = Vec3::new(rng.random_range(-half..half), 0.0, rng.random_range(-half..half));
        let goal = Vec3::new(rng.random_range(-half..half), 0.0, rng.random_range(-half..half));
        let entity = app.world_mut().spawn_empty().id();
        app.world_mut().write_message(PathRequest { entity, start, goal, pruning: i % 4 != 0 });
        entities.push(entity);
    }
    app.update();

    let (mut pruned_expanded, mut pruned_count) = (0usize, 0usize);
    let (mut full_expanded, mut full_count) = (0usize, 0usize);
    let mut score_sum = 0.0;
    for &entity in &entities {
        if let Some(path) = app.world().get::<NavPath>(entity) {
            let m = &path.metrics;
            if m.pruned {
                pruned_expanded += m.cells_expanded;
                pruned_count += 1;
            } else {
                full_expanded += m.cells_expanded;
                full_count += 1;
            }
            score_sum += m.tactical_score;
        } else if let Some(PathFailed(e)) = app.world().get::<PathFailed>(entity) {
            debug!("[DEMO] {:?}: {}", entity, e);
        }
    }

    let stats = app.world().resource::<PathStats>();
    info!(
        "[DEMO] served {}, failed {}, deferred {} ({} pruned)",
        stats.served, stats.failed, stats.deferred, stats.pruned
    );
    if pruned_count > 0 && full_count > 0 {
        info!(
            "[DEMO] avg cells expanded: {:.1} pruned vs {:.1} unpruned",
            pruned_expanded as f32 / pruned_count as f32,
            full_expanded as f32 / full_count as f32
        );
    }
    if stats.served > 0 {
        info!("[DEMO] avg tactical score: {:.3}", score_sum / stats.served as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn prune_demo_logs_keeps_newest_runs_only() {
        let dir = std::env::temp_dir().join(format!("tactinav_logs_{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        for (i, name) in ["tactinav_1.log", "tactinav_2.log", "tactinav_3.log"].iter().enumerate() {
            let file = fs::File::create(dir.join(name)).expect("create log");
            file.set_modified(UNIX_EPOCH + Duration::from_secs(1_000 + i as u64)).expect("set mtime");
        }
        fs::write(dir.join("notes.txt"), "unrelated").expect("create other file");

        prune_demo_logs(&dir, 1);

        let mut left: Vec<String> = fs::read_dir(&dir)
            .expect("read dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["notes.txt".to_string(), "tactinav_3.log".to_string()]);

        let _ = fs::remove_dir_all(&dir);
    }
}
