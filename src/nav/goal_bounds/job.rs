use bevy::prelude::*;
use bevy::tasks::{ComputeTaskPool, ParallelSlice, TaskPool};
use std::sync::Arc;

use super::preprocess::{sweep_source, GoalBounds, SourceBounds, SweepScratch};
use crate::nav::cost::CostModel;
use crate::nav::mesh::{CellId, NavGraph};
use crate::nav::tactical::WeightTable;

#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
pub enum GoalBoundsStep {
    /// Nothing to do: no graph yet, or the last bake was reset.
    #[default]
    Idle,
    Preparing,
    Sweeping,
    Ready,
}

/// Goal-bound preprocessing spread over many small steps.
///
/// One sweep per source cell makes the whole job O(N² log N); each call to
/// [`step`](GoalBoundsJob::step) handles at most one batch of sources so the
/// caller keeps control of its frame budget. Results become visible only
/// once every source is done ([`is_ready`](GoalBoundsJob::is_ready)); a
/// half-built table is never handed to a search.
#[derive(Resource, Default)]
pub struct GoalBoundsJob {
    step: GoalBoundsStep,
    graph: Option<Arc<NavGraph>>,
    weights: Option<Arc<WeightTable>>,
    cost_model: CostModel,
    next_source: usize,
    partial: Vec<SourceBounds>,
    bounds: Option<Arc<GoalBounds>>,
    from_cache: bool,
    started: Option<std::time::Instant>,
}

impl GoalBoundsJob {
    /// A job ready to sweep `graph` with the given weight snapshot.
    pub fn new(graph: Arc<NavGraph>, weights: Arc<WeightTable>, cost_model: CostModel) -> Self {
        let mut job = Self::default();
        job.start(graph, weights, cost_model);
        job
    }

    /// Throw away any previous result and begin a full rebuild.
    pub fn start(&mut self, graph: Arc<NavGraph>, weights: Arc<WeightTable>, cost_model: CostModel) {
        self.reset();
        self.graph = Some(graph);
        self.weights = Some(weights);
        self.cost_model = cost_model;
        self.step = GoalBoundsStep::Preparing;
    }

    /// Install finished bounds (e.g. from the on-disk cache) for `graph`.
    /// Returns `false` and leaves the job untouched if they belong to a
    /// different topology.
    pub fn adopt(&mut self, graph: Arc<NavGraph>, bounds: GoalBounds) -> bool {
        if !bounds.matches_graph(&graph) {
            return false;
        }
        self.reset();
        self.cost_model = bounds.cost_model();
        self.graph = Some(graph);
        self.bounds = Some(Arc::new(bounds));
        self.from_cache = true;
        self.step = GoalBoundsStep::Ready;
        true
    }

    /// Drop all state. Used when the topology changes: bounds are rebuilt
    /// from scratch, never patched.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn state(&self) -> GoalBoundsStep {
        self.step
    }

    pub fn is_ready(&self) -> bool {
        self.step == GoalBoundsStep::Ready
    }

    pub fn is_running(&self) -> bool {
        matches!(self.step, GoalBoundsStep::Preparing | GoalBoundsStep::Sweeping)
    }

    /// Whether the current result was adopted rather than computed.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Finished bounds, or `None` while preprocessing is incomplete.
    pub fn bounds(&self) -> Option<&Arc<GoalBounds>> {
        if self.is_ready() { self.bounds.as_ref() } else { None }
    }

    /// Fingerprint of the graph this job is (or was) working on.
    pub fn graph_fingerprint(&self) -> Option<u64> {
        self.graph.as_ref().map(|g| g.fingerprint())
    }

    /// Fraction of source cells swept, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        match self.step {
            GoalBoundsStep::Idle | GoalBoundsStep::Preparing => 0.0,
            GoalBoundsStep::Ready => 1.0,
            GoalBoundsStep::Sweeping => {
                let total = self.graph.as_ref().map_or(0, |g| g.len());
                if total == 0 { 1.0 } else { self.next_source as f32 / total as f32 }
            }
        }
    }

    /// Advance by at most `batch` source cells. With `parallel`, the batch is
    /// split across Bevy's compute task pool.
    pub fn step(&mut self, batch: usize, parallel: bool) -> GoalBoundsStep {
        match self.step {
            GoalBoundsStep::Idle | GoalBoundsStep::Ready => {}
            GoalBoundsStep::Preparing => {
                let cells = self.graph.as_ref().map_or(0, |g| g.len());
                info!("[GOAL_BOUNDS] Preprocessing {} source cells (batch size: {})", cells, batch);
                self.partial = Vec::with_capacity(cells);
                self.next_source = 0;
                self.started = Some(std::time::Instant::now());
                self.step = GoalBoundsStep::Sweeping;
            }
            GoalBoundsStep::Sweeping => self.sweep_batch(batch.max(1), parallel),
        }
        self.step
    }

    /// Step until ready. Blocks; meant for tests and offline baking.
    pub fn run_to_completion(&mut self, batch: usize) -> Option<&Arc<GoalBounds>> {
        while self.is_running() {
            self.step(batch, false);
        }
        self.bounds()
    }

    fn sweep_batch(&mut self, batch: usize, parallel: bool) {
        let (Some(graph), Some(weights)) = (self.graph.clone(), self.weights.clone()) else {
            warn!("[GOAL_BOUNDS] Sweep requested without a graph; going idle");
            self.reset();
            return;
        };

        let total = graph.len();
        let end = (self.next_source + batch).min(total);
        let sources: Vec<CellId> = (self.next_source..end).map(|i| CellId(i as u32)).collect();
        let cost_model = self.cost_model;

        if parallel && sources.len() > 1 {
            let pool = ComputeTaskPool::get_or_init(TaskPool::default);
            let chunk_size = sources.len().div_ceil(pool.thread_num().max(1)).max(1);
            let chunks = sources.par_chunk_map(pool, chunk_size, |_, chunk| {
                let mut scratch = SweepScratch::default();
                chunk
                    .iter()
                    .map(|&source| sweep_source(&graph, &weights, &cost_model, source, &mut scratch))
                    .collect::<Vec<_>>()
            });
            for chunk in chunks {
                self.partial.extend(chunk);
            }
        } else {
            let mut scratch = SweepScratch::default();
            for &source in &sources {
                self.partial
                    .push(sweep_source(&graph, &weights, &cost_model, source, &mut scratch));
            }
        }
        self.next_source = end;

        if self.next_source >= total {
            let per_cell = std::mem::take(&mut self.partial);
            let bounds = GoalBounds::new(&graph, &weights, cost_model, per_cell);
            let size = bounds.mean_region_size();
            info!(
                "[GOAL_BOUNDS] Preprocessing complete: {} cells in {:?}, mean region {:.2} x {:.2}",
                total,
                self.started.map(|s| s.elapsed()).unwrap_or_default(),
                size.x,
                size.y
            );
            self.bounds = Some(Arc::new(bounds));
            self.step = GoalBoundsStep::Ready;
        }
    }
}
