use bevy::math::I64Vec3;
use bevy::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Result of welding: the unique vertex list plus, for every input vertex,
/// the index of the welded vertex it collapsed onto.
#[derive(Debug, Clone, Default)]
pub struct Weld {
    pub vertices: Vec<Vec3>,
    pub remap: Vec<u32>,
}

/// Merge input vertices that lie within `epsilon` of an already kept vertex.
///
/// Positions are bucketed on a grid with `epsilon` spacing, and a candidate
/// is compared against the 27 buckets around it, so two points closer than
/// `epsilon` always meet regardless of where the bucket boundaries fall.
/// The first vertex seen in a cluster is the one kept, so the output only
/// depends on input order.
///
/// Bucket keys are computed in `f64` and stored as `i64`, so coordinates far
/// from the origin keep their precision and the neighbour lookup saturates
/// instead of overflowing.
///
/// `epsilon <= 0` welds on exact bit equality.
pub fn weld_vertices(input: &[Vec3], epsilon: f32) -> Weld {
    if epsilon <= 0.0 || !epsilon.is_finite() {
        return weld_exact(input);
    }

    let inv = 1.0 / epsilon as f64;
    let eps_sq = epsilon * epsilon;
    let mut buckets: FxHashMap<I64Vec3, SmallVec<[u32; 4]>> = FxHashMap::default();
    let mut vertices: Vec<Vec3> = Vec::with_capacity(input.len());
    let mut remap = Vec::with_capacity(input.len());

    for &pos in input {
        let key = quantize(pos, inv);
        let mut found: Option<u32> = None;

        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let Some(bucket) = buckets.get(&key.saturating_add(I64Vec3::new(dx, dy, dz))) else {
                        continue;
                    };
                    for &candidate in bucket {
                        if vertices[candidate as usize].distance_squared(pos) <= eps_sq {
                            // Lowest index wins so the choice is order-stable.
                            found = Some(found.map_or(candidate, |f| f.min(candidate)));
                        }
                    }
                }
            }
        }

        let index = match found {
            Some(index) => index,
            None => {
                let index = vertices.len() as u32;
                vertices.push(pos);
                buckets.entry(key).or_default().push(index);
                index
            }
        };
        remap.push(index);
    }

    Weld { vertices, remap }
}

fn weld_exact(input: &[Vec3]) -> Weld {
    let mut seen: FxHashMap<[u32; 3], u32> = FxHashMap::default();
    let mut vertices = Vec::with_capacity(input.len());
    let mut remap = Vec::with_capacity(input.len());

    for &pos in input {
        let key = [pos.x.to_bits(), pos.y.to_bits(), pos.z.to_bits()];
        let index = *seen.entry(key).or_insert_with(|| {
            vertices.push(pos);
            (vertices.len() - 1) as u32
        });
        remap.push(index);
    }

    Weld { vertices, remap }
}

#[inline]
fn quantize(pos: Vec3, inv_cell: f64) -> I64Vec3 {
    (pos.as_dvec3() * inv_cell).floor().as_i64vec3()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_positions_collapse() {
        let input = [Vec3::ZERO, Vec3::X, Vec3::ZERO, Vec3::X, Vec3::Z];
        let weld = weld_vertices(&input, 1.0e-4);

        assert_eq!(weld.vertices.len(), 3);
        assert_eq!(weld.remap, vec![0, 1, 0, 1, 2]);
    }

    #[test]
    fn noise_below_epsilon_collapses_across_bucket_boundary() {
        // Straddles a quantization boundary at x = 0.
        let input = [Vec3::new(-0.00001, 0.0, 0.0), Vec3::new(0.00001, 0.0, 0.0)];
        let weld = weld_vertices(&input, 1.0e-4);

        assert_eq!(weld.vertices.len(), 1);
        assert_eq!(weld.remap, vec![0, 0]);
    }

    #[test]
    fn points_further_than_epsilon_stay_apart() {
        let input = [Vec3::ZERO, Vec3::new(0.01, 0.0, 0.0)];
        let weld = weld_vertices(&input, 1.0e-4);

        assert_eq!(weld.vertices.len(), 2);
    }

    #[test]
    fn zero_epsilon_is_exact() {
        let input = [Vec3::ZERO, Vec3::new(1.0e-7, 0.0, 0.0), Vec3::ZERO];
        let weld = weld_vertices(&input, 0.0);

        assert_eq!(weld.vertices.len(), 2);
        assert_eq!(weld.remap, vec![0, 1, 0]);
    }

    #[test]
    fn far_coordinates_weld_without_overflow() {
        // 3e5 / 1e-4 is past i32 range.
        let offset = Vec3::new(3.0e5, 0.0, 3.0e5);
        let input = [
            offset,
            offset + Vec3::X,
            offset + Vec3::new(0.00002, 0.0, 0.0),
            offset + Vec3::X,
            offset + Vec3::Z,
        ];
        let weld = weld_vertices(&input, 1.0e-4);

        assert_eq!(weld.vertices.len(), 3);
        assert_eq!(weld.remap, vec![0, 1, 0, 1, 2]);

        let huge = [Vec3::splat(1.0e30), Vec3::splat(-1.0e30), Vec3::splat(1.0e30)];
        let weld = weld_vertices(&huge, 1.0e-4);
        assert_eq!(weld.remap, vec![0, 1, 0]);
    }

    #[test]
    fn welded_count_never_exceeds_input() {
        let mut rng = fastrand::Rng::with_seed(7);
        let input: Vec<Vec3> = (0..500)
            .map(|_| Vec3::new(rng.u8(0..10) as f32, 0.0, rng.u8(0..10) as f32))
            .collect();
        let weld = weld_vertices(&input, 1.0e-3);

        assert!(weld.vertices.len() <= input.len());
        assert!(weld.vertices.len() <= 100);
        for (i, &target) in weld.remap.iter().enumerate() {
            assert_eq!(weld.vertices[target as usize], input[i]);
        }
    }
}
