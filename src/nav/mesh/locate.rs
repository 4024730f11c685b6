use bevy::math::Vec3Swizzles;
use bevy::prelude::*;
use smallvec::SmallVec;

use super::graph::{Cell, CellId};

/// Slack for the inclusive point-in-triangle test, in world units measured
/// perpendicular to an edge. Points this close to an edge count as inside.
const EDGE_TOLERANCE: f32 = 1.0e-4;

/// Height differences below this are treated as a tie between stacked cells.
const HEIGHT_TIE: f32 = 1.0e-5;

/// Upper bound on buckets per cell so huge, sparse surfaces stay small.
const MAX_BUCKETS_PER_CELL: usize = 4;

/// Uniform XZ bucket grid over the baked cells for point location.
///
/// Each bucket lists every cell whose footprint overlaps it, in ascending id
/// order, which is what makes edge points resolve consistently.
#[derive(Clone, Debug, Default)]
pub(super) struct CellLocator {
    origin: Vec2,
    extent: Vec2,
    bucket_size: f32,
    cols: usize,
    rows: usize,
    buckets: Vec<SmallVec<[CellId; 8]>>,
}

impl CellLocator {
    pub(super) fn build(vertices: &[Vec3], cells: &[Cell]) -> Self {
        if cells.is_empty() {
            return Self::default();
        }

        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        let mut extent_sum = 0.0;
        for cell in cells {
            let (cmin, cmax) = footprint(vertices, cell);
            min = min.min(cmin);
            max = max.max(cmax);
            extent_sum += (cmax - cmin).max_element();
        }

        let extent = (max - min).max(Vec2::splat(EDGE_TOLERANCE));
        let mut bucket_size = (extent_sum / cells.len() as f32).max(EDGE_TOLERANCE);

        // Grow buckets until the grid stays proportional to the cell count.
        let budget = cells.len() * MAX_BUCKETS_PER_CELL;
        loop {
            let cols = (extent.x / bucket_size).ceil().max(1.0) as usize;
            let rows = (extent.y / bucket_size).ceil().max(1.0) as usize;
            if cols.saturating_mul(rows) <= budget {
                break;
            }
            bucket_size *= 2.0;
        }

        let cols = (extent.x / bucket_size).ceil().max(1.0) as usize;
        let rows = (extent.y / bucket_size).ceil().max(1.0) as usize;
        let mut locator = Self {
            origin: min,
            extent,
            bucket_size,
            cols,
            rows,
            buckets: vec![SmallVec::new(); cols * rows],
        };

        for cell in cells {
            let (cmin, cmax) = footprint(vertices, cell);
            let (c0, r0) = locator.bucket_coords(cmin - Vec2::splat(EDGE_TOLERANCE));
            let (c1, r1) = locator.bucket_coords(cmax + Vec2::splat(EDGE_TOLERANCE));
            for row in r0..=r1 {
                for col in c0..=c1 {
                    locator.buckets[row * cols + col].push(cell.id);
                }
            }
        }

        locator
    }

    fn bucket_coords(&self, p: Vec2) -> (usize, usize) {
        let local = (p - self.origin) / self.bucket_size;
        let col = (local.x.floor().max(0.0) as usize).min(self.cols - 1);
        let row = (local.y.floor().max(0.0) as usize).min(self.rows - 1);
        (col, row)
    }

    pub(super) fn locate(
        &self,
        point: Vec3,
        max_height: f32,
        vertices: &[Vec3],
        cells: &[Cell],
    ) -> Option<CellId> {
        if self.buckets.is_empty() || !point.is_finite() {
            return None;
        }

        let p = point.xz();
        let lo = self.origin - Vec2::splat(EDGE_TOLERANCE);
        let hi = self.origin + self.extent + Vec2::splat(EDGE_TOLERANCE);
        if p.x < lo.x || p.y < lo.y || p.x > hi.x || p.y > hi.y {
            return None;
        }

        let (col, row) = self.bucket_coords(p);
        let mut best: Option<(f32, CellId)> = None;

        for &id in &self.buckets[row * self.cols + col] {
            let cell = &cells[id.index()];
            let corners = cell.vertices.map(|i| vertices[i as usize]);
            let Some(height) = surface_height(&corners, p) else {
                continue;
            };
            let gap = (point.y - height).abs();
            if gap > max_height {
                continue;
            }
            // Clearly closer only: near-equal gaps keep the lower id seen first.
            if best.map_or(true, |(best_gap, _)| gap + HEIGHT_TIE < best_gap) {
                best = Some((gap, id));
            }
        }

        best.map(|(_, id)| id)
    }
}

fn footprint(vertices: &[Vec3], cell: &Cell) -> (Vec2, Vec2) {
    let mut min = Vec2::splat(f32::MAX);
    let mut max = Vec2::splat(f32::MIN);
    for &i in &cell.vertices {
        let v = vertices[i as usize].xz();
        min = min.min(v);
        max = max.max(v);
    }
    (min, max)
}

/// Height of the triangle's plane above `p`, or `None` when `p` lies outside
/// the triangle in XZ (with [`EDGE_TOLERANCE`] slack) or the triangle is
/// vertical.
pub(crate) fn surface_height(corners: &[Vec3; 3], p: Vec2) -> Option<f32> {
    let a = corners[0].xz();
    let b = corners[1].xz();
    let c = corners[2].xz();

    let area = (b - a).perp_dot(c - a);
    if area.abs() <= f32::EPSILON {
        return None;
    }
    let sign = area.signum();

    for (u, v) in [(a, b), (b, c), (c, a)] {
        let edge = v - u;
        let len = edge.length();
        if len <= f32::EPSILON {
            return None;
        }
        let signed_distance = sign * edge.perp_dot(p - u) / len;
        if signed_distance < -EDGE_TOLERANCE {
            return None;
        }
    }

    let wb = (p - a).perp_dot(c - a) / area;
    let wc = (b - a).perp_dot(p - a) / area;
    let wa = 1.0 - wb - wc;
    Some(wa * corners[0].y + wb * corners[1].y + wc * corners[2].y)
}
