use bevy::math::Vec3Swizzles;
use bevy::prelude::*;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::hash::Hasher;

use super::locate::CellLocator;
use crate::nav::error::{MalformedTriangle, NavError};

/// Dense index of a cell, assigned in bake order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, PartialOrd, Ord)]
pub struct CellId(pub u32);

impl CellId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One triangle of the walkable surface.
///
/// Per-search bookkeeping (g, h, parent) is deliberately not stored here;
/// searches keep it in their own scratch storage so the graph can be shared.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub centroid: Vec3,
    /// Indices into [`NavGraph::vertices`].
    pub vertices: [u32; 3],
    /// Adjacent cells across shared edges, sorted by id. At most three.
    pub neighbors: SmallVec<[CellId; 3]>,
}

/// Immutable, adjacency-linked cell graph produced by one bake.
///
/// Topology never changes after construction. Weights and goal bounds are
/// computed against it and replaced wholesale; a new surface means a new
/// `NavGraph` with a new [`fingerprint`](NavGraph::fingerprint).
#[derive(Clone, Debug, Default)]
pub struct NavGraph {
    vertices: Vec<Vec3>,
    cells: Vec<Cell>,
    locator: CellLocator,
    skipped: Vec<MalformedTriangle>,
    fingerprint: u64,
}

impl NavGraph {
    pub(super) fn from_parts(
        vertices: Vec<Vec3>,
        cells: Vec<Cell>,
        skipped: Vec<MalformedTriangle>,
    ) -> Self {
        let locator = CellLocator::build(&vertices, &cells);
        let fingerprint = topology_fingerprint(&vertices, &cells);
        Self {
            vertices,
            cells,
            locator,
            skipped,
            fingerprint,
        }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    #[inline]
    pub fn neighbors(&self, id: CellId) -> &[CellId] {
        &self.cells[id.index()].neighbors
    }

    #[inline]
    pub fn centroid(&self, id: CellId) -> Vec3 {
        self.cells[id.index()].centroid
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// World positions of a cell's three corners.
    pub fn corners(&self, id: CellId) -> [Vec3; 3] {
        let [a, b, c] = self.cells[id.index()].vertices;
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Min/max of the cell's corners projected onto the XZ plane.
    pub fn footprint(&self, id: CellId) -> (Vec2, Vec2) {
        let corners = self.corners(id);
        let mut min = corners[0].xz();
        let mut max = min;
        for corner in &corners[1..] {
            min = min.min(corner.xz());
            max = max.max(corner.xz());
        }
        (min, max)
    }

    /// Triangles the bake skipped. Empty for well-formed input.
    pub fn skipped(&self) -> &[MalformedTriangle] {
        &self.skipped
    }

    /// `Err(MalformedTopology)` if the bake had to skip anything.
    pub fn topology_report(&self) -> Result<(), NavError> {
        if self.skipped.is_empty() {
            Ok(())
        } else {
            Err(NavError::MalformedTopology {
                skipped: self.skipped.clone(),
            })
        }
    }

    /// Content hash of the welded vertices and cell corners.
    ///
    /// Two bakes of the same surface share a fingerprint; goal bounds and
    /// cached bounds files are only valid for the fingerprint they were built on.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Resolve a world point to the cell underneath it.
    ///
    /// A point on an edge shared by several cells always resolves to the same
    /// one (vertically closest plane, then lowest id).
    pub fn locate(&self, point: Vec3, max_height: f32) -> Option<CellId> {
        self.locator.locate(point, max_height, &self.vertices, &self.cells)
    }
}

fn topology_fingerprint(vertices: &[Vec3], cells: &[Cell]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_usize(vertices.len());
    for v in vertices {
        hasher.write_u32(v.x.to_bits());
        hasher.write_u32(v.y.to_bits());
        hasher.write_u32(v.z.to_bits());
    }
    hasher.write_usize(cells.len());
    for cell in cells {
        for &index in &cell.vertices {
            hasher.write_u32(index);
        }
    }
    hasher.finish()
}
