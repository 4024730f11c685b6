use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use flate2::write::ZlibEncoder;
use flate2::read::ZlibDecoder;
use flate2::Compression;

use super::preprocess::GoalBounds;

pub const BOUNDS_CACHE_VERSION: u32 = 1;

#[derive(Deserialize)]
struct BoundsCacheFile {
    version: u32,
    bounds: GoalBounds,
}

/// Write-side twin of [`BoundsCacheFile`]; same layout, borrows the bounds.
#[derive(Serialize)]
struct BoundsCacheRef<'a> {
    version: u32,
    bounds: &'a GoalBounds,
}

/// File name for the bounds of one baked topology.
pub fn cache_path(dir: impl AsRef<Path>, graph_fingerprint: u64) -> PathBuf {
    dir.as_ref().join(format!("goal_bounds_{:016x}.bin", graph_fingerprint))
}

pub fn save_bounds(path: impl AsRef<Path>, bounds: &GoalBounds) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    let file = BoundsCacheRef {
        version: BOUNDS_CACHE_VERSION,
        bounds,
    };
    bincode::serialize_into(&mut encoder, &file)?;
    encoder.finish()?;
    Ok(())
}

pub fn load_bounds(path: impl AsRef<Path>) -> Result<GoalBounds, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut decoder = ZlibDecoder::new(reader);
    let file: BoundsCacheFile = bincode::deserialize_from(&mut decoder)?;
    if file.version != BOUNDS_CACHE_VERSION {
        return Err(format!(
            "goal bounds cache version {} (expected {})",
            file.version, BOUNDS_CACHE_VERSION
        )
        .into());
    }
    Ok(file.bounds)
}
