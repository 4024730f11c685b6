use fixedbitset::FixedBitSet;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::nav::mesh::CellId;

pub(super) const NO_PARENT: u32 = u32::MAX;

/// Open-set entry. Pops lowest `f`, then lowest `h`, then lowest cell id,
/// so runs over the same inputs always expand cells in the same order.
#[derive(Clone, Copy, Debug)]
pub(super) struct OpenEntry {
    pub f: f32,
    pub h: f32,
    pub cell: CellId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

/// Per-query g/parent/closed storage, indexed by cell id.
///
/// Kept out of the graph so any number of queries can share one graph.
/// Reusing a scratch across queries is fine: every search starts with a
/// full [`reset`](SearchScratch::reset).
#[derive(Default)]
pub struct SearchScratch {
    pub(super) g: Vec<f32>,
    pub(super) parent: Vec<u32>,
    pub(super) closed: FixedBitSet,
    pub(super) open: BinaryHeap<OpenEntry>,
}

impl SearchScratch {
    pub fn with_capacity(cells: usize) -> Self {
        let mut scratch = Self::default();
        scratch.reset(cells);
        scratch
    }

    pub fn reset(&mut self, cells: usize) {
        self.g.clear();
        self.g.resize(cells, f32::INFINITY);
        self.parent.clear();
        self.parent.resize(cells, NO_PARENT);
        self.closed.clear();
        self.closed.grow(cells);
        self.open.clear();
    }
}
