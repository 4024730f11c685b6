use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// An unwelded triangle soup as handed over by whatever produced the
/// walkable surface. Every three entries of `indices` form one triangle.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawSurface {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl RawSurface {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat grid of `cols x rows` quads on the XZ plane, each split into two
    /// triangles along the same diagonal.
    ///
    /// Every quad gets its own four corners, so neighbouring quads only
    /// connect after welding. That keeps the grid honest as a bake input.
    pub fn grid(cols: usize, rows: usize, cell_size: f32, origin: Vec3) -> Self {
        let mut vertices = Vec::with_capacity(cols * rows * 4);
        let mut indices = Vec::with_capacity(cols * rows * 6);

        for row in 0..rows {
            for col in 0..cols {
                let x0 = origin.x + col as f32 * cell_size;
                let z0 = origin.z + row as f32 * cell_size;
                let x1 = x0 + cell_size;
                let z1 = z0 + cell_size;
                let base = vertices.len() as u32;

                vertices.push(Vec3::new(x0, origin.y, z0));
                vertices.push(Vec3::new(x1, origin.y, z0));
                vertices.push(Vec3::new(x1, origin.y, z1));
                vertices.push(Vec3::new(x0, origin.y, z1));

                indices.extend_from_slice(&[base, base + 1, base + 2]);
                indices.extend_from_slice(&[base, base + 2, base + 3]);
            }
        }

        Self { vertices, indices }
    }

    /// Remove every quad of a [`RawSurface::grid`] for which `blocked(col, row)`
    /// holds. Used to carve static obstacles out of a test or demo grid.
    pub fn carve_grid(mut self, cols: usize, rows: usize, blocked: impl Fn(usize, usize) -> bool) -> Self {
        let mut kept = Vec::with_capacity(self.indices.len());
        for row in 0..rows {
            for col in 0..cols {
                if blocked(col, row) {
                    continue;
                }
                let start = (row * cols + col) * 6;
                if let Some(quad) = self.indices.get(start..start + 6) {
                    kept.extend_from_slice(quad);
                }
            }
        }
        self.indices = kept;
        self
    }
}
