use crate::entropy::Entropy;
use crate::grid::Cell;
use wfc_rules::{CandidateSet, TileId};

/// One reversible collapse, captured before the cell was mutated so undo
/// is a plain restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStep {
    pub cell_index: usize,
    pub previous_collapsed_tile: Option<TileId>,
    pub previous_entropy: Entropy,
    pub previous_candidates: CandidateSet,
}

impl HistoryStep {
    /// Records the current state of `cell`.
    #[must_use]
    pub fn capture(cell: &Cell) -> Self {
        Self {
            cell_index: cell.index(),
            previous_collapsed_tile: cell.collapsed_tile(),
            previous_entropy: cell.entropy(),
            previous_candidates: cell.candidates().clone(),
        }
    }
}

/// Stack of committed collapses, manual seeds included. Its length is the
/// current collapse depth.
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    steps: Vec<HistoryStep>,
}

impl HistoryStack {
    #[must_use]
    pub const fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn push(&mut self, step: HistoryStep) {
        self.steps.push(step);
    }

    pub fn pop(&mut self) -> Option<HistoryStep> {
        self.steps.pop()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }
}
