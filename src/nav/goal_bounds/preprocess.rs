use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::rect::BoundingRect;
use crate::nav::cost::CostModel;
use crate::nav::mesh::{CellId, NavGraph};
use crate::nav::tactical::WeightTable;

/// Marker for "not reached" in the first-hop table.
const NO_HOP: u8 = u8::MAX;

/// Goal rectangle for one outgoing edge of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeBound {
    pub neighbor: CellId,
    pub rect: BoundingRect,
}

/// All edge rectangles of one source cell, in the cell's neighbour order.
pub type SourceBounds = SmallVec<[EdgeBound; 3]>;

/// Frontier entry for the per-source Dijkstra sweep.
///
/// Ordered for a min-heap on cost, then cell id, so equal-cost nodes are
/// settled in a fixed order and first-hop ties always break the same way.
#[derive(Clone, Copy, Debug)]
struct Frontier {
    cost: f32,
    cell: CellId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

/// Reusable buffers for [`sweep_source`]. One per worker.
#[derive(Default)]
pub struct SweepScratch {
    dist: Vec<f32>,
    first_hop: Vec<u8>,
    settled: FixedBitSet,
    heap: BinaryHeap<Frontier>,
}

impl SweepScratch {
    fn reset(&mut self, cells: usize) {
        self.dist.clear();
        self.dist.resize(cells, f32::INFINITY);
        self.first_hop.clear();
        self.first_hop.resize(cells, NO_HOP);
        self.settled.clear();
        self.settled.grow(cells);
        self.heap.clear();
    }
}

/// Single-source shortest paths from `source`, grouping every reached cell
/// by the neighbour of `source` its best path leaves through.
///
/// Returns one rectangle per neighbour of `source`, covering the XZ
/// footprints of all cells in that group. A neighbour no best path uses gets
/// [`BoundingRect::EMPTY`].
///
/// Relaxation is strict (`<`) and neighbours are visited in sorted order, the
/// same as the search does, so on equal cost the first hop discovered first
/// keeps the node.
pub fn sweep_source(
    graph: &NavGraph,
    weights: &WeightTable,
    cost: &CostModel,
    source: CellId,
    scratch: &mut SweepScratch,
) -> SourceBounds {
    let neighbors = graph.neighbors(source);
    let mut bounds: SourceBounds = neighbors
        .iter()
        .map(|&neighbor| EdgeBound { neighbor, rect: BoundingRect::EMPTY })
        .collect();
    if neighbors.is_empty() {
        return bounds;
    }

    scratch.reset(graph.len());
    scratch.dist[source.index()] = 0.0;
    scratch.heap.push(Frontier { cost: 0.0, cell: source });

    while let Some(Frontier { cost: d, cell: current }) = scratch.heap.pop() {
        if scratch.settled.put(current.index()) {
            continue;
        }

        for (slot, &next) in graph.neighbors(current).iter().enumerate() {
            if scratch.settled.contains(next.index()) {
                continue;
            }
            let candidate = d + cost.edge_cost(graph, weights, current, next);
            if candidate < scratch.dist[next.index()] {
                scratch.dist[next.index()] = candidate;
                scratch.first_hop[next.index()] = if current == source {
                    slot as u8
                } else {
                    scratch.first_hop[current.index()]
                };
                scratch.heap.push(Frontier { cost: candidate, cell: next });
            }
        }
    }

    for cell in scratch.settled.ones() {
        let hop = scratch.first_hop[cell];
        if hop == NO_HOP {
            continue; // the source itself
        }
        let (min, max) = graph.footprint(CellId(cell as u32));
        bounds[hop as usize].rect.include(min, max);
    }

    bounds
}

/// Goal-bounding data for a whole graph.
///
/// Built against one weight snapshot and cost model. When weights later
/// drift, the rectangles still prune but are no longer guaranteed to keep a
/// shortest path; [`GoalBounds::is_current_for`] tells the two cases apart.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalBounds {
    graph_fingerprint: u64,
    weights_fingerprint: u64,
    cost_model: CostModel,
    per_cell: Vec<SourceBounds>,
}

impl GoalBounds {
    pub fn new(graph: &NavGraph, weights: &WeightTable, cost_model: CostModel, per_cell: Vec<SourceBounds>) -> Self {
        Self {
            graph_fingerprint: graph.fingerprint(),
            weights_fingerprint: weights.fingerprint(),
            cost_model,
            per_cell,
        }
    }

    /// Build everything in one go. Fine for tests and offline tools; live
    /// code goes through the steppable [`GoalBoundsJob`](super::GoalBoundsJob).
    pub fn compute(graph: &NavGraph, weights: &WeightTable, cost_model: CostModel) -> Self {
        let mut scratch = SweepScratch::default();
        let per_cell = graph
            .cells()
            .iter()
            .map(|cell| sweep_source(graph, weights, &cost_model, cell.id, &mut scratch))
            .collect();
        Self::new(graph, weights, cost_model, per_cell)
    }

    pub fn graph_fingerprint(&self) -> u64 {
        self.graph_fingerprint
    }

    pub fn weights_fingerprint(&self) -> u64 {
        self.weights_fingerprint
    }

    pub fn cost_model(&self) -> CostModel {
        self.cost_model
    }

    pub fn cell_count(&self) -> usize {
        self.per_cell.len()
    }

    /// Built for this exact topology.
    pub fn matches_graph(&self, graph: &NavGraph) -> bool {
        self.graph_fingerprint == graph.fingerprint() && self.per_cell.len() == graph.len()
    }

    /// Built with these exact weights and costs, so pruning is exact rather
    /// than heuristic.
    pub fn is_current_for(&self, weights: &WeightTable, cost_model: &CostModel) -> bool {
        self.weights_fingerprint == weights.fingerprint() && self.cost_model == *cost_model
    }

    pub fn edges(&self, cell: CellId) -> &[EdgeBound] {
        self.per_cell.get(cell.index()).map(|b| b.as_slice()).unwrap_or(&[])
    }

    pub fn region(&self, cell: CellId, neighbor: CellId) -> Option<&BoundingRect> {
        self.edges(cell)
            .iter()
            .find(|e| e.neighbor == neighbor)
            .map(|e| &e.rect)
    }

    /// Average XZ size of the non-empty edge regions. Smaller means tighter
    /// pruning.
    pub fn mean_region_size(&self) -> Vec2 {
        let (sum, count) = self
            .per_cell
            .iter()
            .flat_map(|edges| edges.iter())
            .filter(|e| !e.rect.is_empty())
            .fold((Vec2::ZERO, 0u32), |(sum, n), e| (sum + Vec2::new(e.rect.width(), e.rect.height()), n + 1));
        if count == 0 { Vec2::ZERO } else { sum / count as f32 }
    }

    /// Whether the edge `cell -> neighbor` may lie on a best path to `goal`.
    /// Edges without a recorded region are never pruned.
    #[inline]
    pub fn allows(&self, cell: CellId, neighbor: CellId, goal: Vec2) -> bool {
        self.region(cell, neighbor).map_or(true, |rect| rect.contains(goal))
    }
}
