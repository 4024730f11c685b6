use bevy::prelude::*;
use std::sync::Arc;

use super::build::build_graph;
use super::graph::NavGraph;
use super::surface::RawSurface;
use crate::nav::config::NavConfig;
use crate::nav::error::MalformedTriangle;

/// Request a (re)bake of the walkable surface. Sent by whatever places the
/// static obstacles, once they are all in.
#[derive(Message, Debug, Clone)]
pub struct BakeSurface(pub RawSurface);

/// Emitted after a bake replaced [`NavSurface`].
#[derive(Message, Debug, Clone)]
pub struct SurfaceBaked {
    pub fingerprint: u64,
    pub cells: usize,
    pub skipped: Vec<MalformedTriangle>,
}

/// The current baked graph, shared read-only with every query.
///
/// Replaced wholesale on rebake; holders of an older `Arc` keep a
/// consistent (if outdated) graph until they drop it.
#[derive(Resource, Default, Clone)]
pub struct NavSurface {
    pub graph: Arc<NavGraph>,
}

impl NavSurface {
    pub fn new(graph: NavGraph) -> Self {
        Self { graph: Arc::new(graph) }
    }

    pub fn is_baked(&self) -> bool {
        !self.graph.is_empty()
    }
}

/// Bake the most recent [`BakeSurface`] request of this frame.
///
/// Older requests in the same frame are superseded, not baked.
#[tactinav_macros::profile(4)]
pub fn bake_surface(
    mut requests: MessageReader<BakeSurface>,
    mut baked: MessageWriter<SurfaceBaked>,
    mut surface: ResMut<NavSurface>,
    config: Res<NavConfig>,
) {
    let Some(BakeSurface(raw)) = requests.read().last() else {
        return;
    };

    info!("=== SURFACE BAKE START ===");
    let graph = build_graph(raw, config.weld_epsilon);
    if let Err(report) = graph.topology_report() {
        warn!("[BAKE] Surface baked with degraded topology: {}", report);
    }

    baked.write(SurfaceBaked {
        fingerprint: graph.fingerprint(),
        cells: graph.len(),
        skipped: graph.skipped().to_vec(),
    });
    *surface = NavSurface::new(graph);
    info!("=== SURFACE BAKE COMPLETE ===");
}
