use bevy::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::graph::{Cell, CellId, NavGraph};
use super::surface::RawSurface;
use super::weld::weld_vertices;
use crate::nav::error::{MalformedReason, MalformedTriangle};

/// Twice the triangle area below which a welded triangle counts as degenerate.
const DEGENERATE_AREA: f32 = 1.0e-10;

/// Unordered welded-vertex pair identifying an edge.
type EdgeKey = (u32, u32);

#[inline]
fn edge_key(a: u32, b: u32) -> EdgeKey {
    if a < b { (a, b) } else { (b, a) }
}

/// Turn a raw triangle soup into a welded, adjacency-linked [`NavGraph`].
///
/// Never fails: triangles that cannot be part of a 2-manifold walkable
/// surface are skipped and listed in [`NavGraph::skipped`].
pub fn build_graph(surface: &RawSurface, weld_epsilon: f32) -> NavGraph {
    let build_start = std::time::Instant::now();
    let weld = weld_vertices(&surface.vertices, weld_epsilon);
    let mut skipped = Vec::new();

    // 1. Validate and remap triangles onto welded vertices.
    let mut candidates: Vec<(usize, [u32; 3])> = Vec::with_capacity(surface.triangle_count());
    for (triangle, corners) in surface.indices.chunks_exact(3).enumerate() {
        let in_range = corners.iter().all(|&i| (i as usize) < weld.remap.len());
        if !in_range {
            skipped.push(MalformedTriangle { triangle, reason: MalformedReason::IndexOutOfRange });
            continue;
        }
        let welded = [
            weld.remap[corners[0] as usize],
            weld.remap[corners[1] as usize],
            weld.remap[corners[2] as usize],
        ];
        if is_degenerate(&weld.vertices, welded) {
            skipped.push(MalformedTriangle { triangle, reason: MalformedReason::Degenerate });
            continue;
        }
        candidates.push((triangle, welded));
    }
    if surface.indices.len() % 3 != 0 {
        skipped.push(MalformedTriangle {
            triangle: surface.triangle_count(),
            reason: MalformedReason::TruncatedIndices,
        });
    }

    // 2. Register edges in input order. A triangle that would become the
    //    third owner of any edge is dropped whole.
    let mut edges: FxHashMap<EdgeKey, SmallVec<[u32; 2]>> = FxHashMap::default();
    let mut kept: Vec<[u32; 3]> = Vec::with_capacity(candidates.len());
    for (triangle, [a, b, c]) in candidates {
        let keys = [edge_key(a, b), edge_key(b, c), edge_key(c, a)];
        let overfull = keys
            .iter()
            .any(|key| edges.get(key).map_or(false, |owners| owners.len() >= 2));
        if overfull {
            skipped.push(MalformedTriangle { triangle, reason: MalformedReason::NonManifoldEdge });
            continue;
        }
        let cell_index = kept.len() as u32;
        for key in keys {
            edges.entry(key).or_default().push(cell_index);
        }
        kept.push([a, b, c]);
    }

    // 3. Cells with centroids.
    let mut cells: Vec<Cell> = kept
        .iter()
        .enumerate()
        .map(|(i, &corners)| {
            let centroid = corners
                .iter()
                .map(|&v| weld.vertices[v as usize])
                .sum::<Vec3>()
                / 3.0;
            Cell {
                id: CellId(i as u32),
                centroid,
                vertices: corners,
                neighbors: SmallVec::new(),
            }
        })
        .collect();

    // 4. Edges shared by exactly two cells become symmetric links.
    for owners in edges.values() {
        if let [first, second] = owners.as_slice() {
            link(&mut cells, *first, *second);
        }
    }
    for cell in &mut cells {
        cell.neighbors.sort_unstable();
    }

    skipped.sort_by_key(|s| s.triangle);
    if !skipped.is_empty() {
        warn!(
            "[BAKE] Skipped {} malformed triangle(s); first: {:?}",
            skipped.len(),
            skipped[0]
        );
    }

    let graph = NavGraph::from_parts(weld.vertices, cells, skipped);
    let links: usize = graph.cells().iter().map(|c| c.neighbors.len()).sum();
    info!(
        "[BAKE] {} input vertices -> {} welded, {} cells, {} links in {:?}",
        surface.vertices.len(),
        graph.vertices().len(),
        graph.len(),
        links / 2,
        build_start.elapsed()
    );
    graph
}

fn link(cells: &mut [Cell], a: u32, b: u32) {
    let (ia, ib) = (CellId(a), CellId(b));
    // Duplicate triangles share all three edges; link them only once.
    if !cells[a as usize].neighbors.contains(&ib) {
        cells[a as usize].neighbors.push(ib);
    }
    if !cells[b as usize].neighbors.contains(&ia) {
        cells[b as usize].neighbors.push(ia);
    }
}

fn is_degenerate(vertices: &[Vec3], [a, b, c]: [u32; 3]) -> bool {
    if a == b || b == c || a == c {
        return true;
    }
    let (pa, pb, pc) = (vertices[a as usize], vertices[b as usize], vertices[c as usize]);
    (pb - pa).cross(pc - pa).length_squared() <= DEGENERATE_AREA * DEGENERATE_AREA
}
