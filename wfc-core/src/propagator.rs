use crate::grid::CellGrid;
use std::fmt::Debug;
use thiserror::Error;
use wfc_rules::{RuleSet, TileId};

pub mod cpu;

pub use cpu::CpuConstraintPropagator;

/// Errors that can occur during the constraint propagation phase of WFC.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropagationError {
    /// A cell's candidate set became empty: no tile satisfies every
    /// collapsed neighbor. Recoverable by backtracking.
    #[error("Contradiction detected during propagation at cell {index}")]
    Contradiction { index: usize },
    /// A collapsed cell holds a tile the rule set does not define.
    #[error("Collapsed cell holds tile {0} which is not in the rule set")]
    UnknownTile(TileId),
}

/// Trait defining the interface for a constraint propagation algorithm.
///
/// Implementors bring every uncollapsed cell's candidate set in line with
/// its collapsed neighbors after any collapse or undo.
pub trait ConstraintPropagator: Send + Sync + Debug {
    /// Recomputes constraints over the whole grid.
    ///
    /// Contradicted cells are left marked in the grid; the first one found is
    /// also reported so the driver can backtrack.
    ///
    /// # Errors
    ///
    /// * `PropagationError::Contradiction` with the lowest contradicted index.
    /// * `PropagationError::UnknownTile` if a collapsed cell has no rule.
    fn propagate(&mut self, grid: &mut CellGrid, rules: &RuleSet) -> Result<(), PropagationError>;
}
