use bevy::prelude::*;

use crate::nav::mesh::CellId;
use crate::nav::tactical::WeightTable;

/// Sum of straight-line distances between consecutive points.
pub fn path_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Average tactical weight over `cells`, squashed into (0, 1) with a
/// logistic curve: `1 / (1 + exp(avg / scale))`.
///
/// Higher is safer. A neutral path scores 0.5, cover pushes towards 1 and
/// danger towards 0. An empty cell list scores as neutral.
pub fn tactical_score(cells: &[CellId], weights: &WeightTable, scale: f32) -> f32 {
    if cells.is_empty() {
        return 0.5;
    }
    let average = cells.iter().map(|&c| weights.weight(c)).sum::<f32>() / cells.len() as f32;
    let scale = if scale > 0.0 { scale } else { 1.0 };
    1.0 / (1.0 + (average / scale).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::mesh::{build_graph, RawSurface};

    #[test]
    fn length_sums_segments() {
        let points = [Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 4.0)];
        assert!((path_length(&points) - 7.0).abs() < 1.0e-6);
        assert_eq!(path_length(&points[..1]), 0.0);
    }

    #[test]
    fn score_orders_by_safety() {
        let graph = build_graph(&RawSurface::grid(2, 1, 1.0, Vec3::ZERO), 1.0e-4);
        let weights = WeightTable::from_weights(&graph, 1, vec![-4.0, 0.0, 6.0, 0.0], -1.0, 3.0);

        let covered = tactical_score(&[CellId(0)], &weights, 2.0);
        let neutral = tactical_score(&[CellId(1)], &weights, 2.0);
        let exposed = tactical_score(&[CellId(2)], &weights, 2.0);

        assert!((neutral - 0.5).abs() < 1.0e-6);
        assert!(covered > neutral && neutral > exposed);
        assert!(exposed > 0.0 && covered < 1.0);
    }
}
