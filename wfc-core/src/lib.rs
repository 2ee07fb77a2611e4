//! Core library for the Wave Function Collapse algorithm implementation.
//! Defines the 2D cell grid, constraint propagation, backtracking and the
//! step/run driver. Rendering and rule authoring live elsewhere.

#[cfg(feature = "serde")] // Guard serde imports
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wfc_rules::RuleSetError;

// Module declarations (keep public if they contain public items)
/// Entropy bookkeeping and lowest-entropy cell selection.
pub mod entropy;
/// Generic 2D grid structure and the WFC cell grid.
pub mod grid;
/// Undo records for committed collapses.
pub mod history;
/// Collapse notifications for hosts.
pub mod observer;
/// Constraint propagation logic and traits.
pub mod propagator;
/// Deterministic random source.
pub mod rng;
/// The core WFC algorithm runner.
pub mod runner;
/// Owned copies of cell and grid state handed to callers.
pub mod snapshot;

// Re-export core public items

pub use crate::entropy::Entropy;
pub use crate::grid::{Cell, CellGrid, Grid};
pub use crate::history::{HistoryStack, HistoryStep};
pub use crate::observer::{CellCollapsed, CollapseObserver, FnObserver, WfcEvent};
pub use crate::propagator::{ConstraintPropagator, CpuConstraintPropagator, PropagationError};
pub use crate::rng::{SeededRng, SelectionError};
pub use crate::runner::{
    RunOutcome, StepStatus, Wfc, WfcConfig, WfcConfigBuilder, DEFAULT_MAX_BACKTRACKS,
};
pub use crate::snapshot::{CellSnapshot, GridSnapshot};
pub use wfc_rules::{CandidateSet, Direction, RuleSet, TileId, TileRule};

/// Configuration problems. These are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `initialize` was called with a rule set that defines no tiles.
    #[error("rule set is empty")]
    EmptyRuleSet,
    /// A tile id not present in the rule set was referenced.
    #[error("unknown tile id {0}")]
    UnknownTile(TileId),
    /// Run, step, seed or query before `initialize`.
    #[error("engine is not initialized")]
    NotInitialized,
    /// A cell index outside the grid was referenced.
    #[error("cell index {index} is out of bounds for a grid of {cells} cells")]
    CellOutOfBounds { index: usize, cells: usize },
    /// Width or height is zero, or the cell count overflows.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The rule set failed validation.
    #[error("invalid rules: {0}")]
    InvalidRules(String),
}

/// Errors that can occur during the Wave Function Collapse algorithm.
///
/// Each fatal condition has its own variant so callers can choose between
/// fixing the rule set, retrying with another seed, or stopping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WfcError {
    /// Invalid setup or API misuse.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// Too many consecutive backtracks without a successful forward step.
    #[error(
        "Backtrack budget exhausted ({max_backtracks} consecutive backtracks); \
         rule set likely over-constrained for this grid size"
    )]
    BacktrackBudgetExhausted { max_backtracks: usize },
    /// A contradiction was found but there is nothing left to undo.
    #[error("No steps to backtrack: contradiction at cell {cell} with empty history")]
    EmptyHistory { cell: usize },
    /// Weighted or uniform selection could not produce a choice.
    #[error("Weighted selection error: {0}")]
    WeightedChoice(#[from] SelectionError),
    /// A propagation failure other than a recoverable contradiction.
    #[error("Propagation error: {0}")]
    Propagation(#[from] PropagationError),
    /// The engine failed earlier and must be reset or re-initialized.
    #[error("Run already failed; reset or re-initialize before stepping")]
    RunFailed,
    /// `run` exceeded the configured step limit.
    #[error("Maximum steps ({0}) reached")]
    MaxStepsReached(u64),
}

impl WfcError {
    /// True for errors caused by setup or API misuse.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// True when generation itself failed and a different seed or looser
    /// rules might succeed.
    #[must_use]
    pub const fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            Self::BacktrackBudgetExhausted { .. } | Self::EmptyHistory { .. }
        )
    }
}

impl From<RuleSetError> for WfcError {
    fn from(error: RuleSetError) -> Self {
        match error {
            RuleSetError::UnknownTile(tile) => ConfigError::UnknownTile(tile).into(),
            other => ConfigError::InvalidRules(other.to_string()).into(),
        }
    }
}

/// Lifecycle of one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RunState {
    /// No grid allocated.
    #[default]
    Uninitialized,
    /// Grid allocated, no driver step taken yet.
    Ready,
    /// At least one step taken, grid not complete.
    Collapsing,
    /// Every cell collapsed.
    Collapsed,
    /// A fatal error stopped the run.
    Failed,
}

/// Information about the current state of the WFC algorithm execution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressInfo {
    /// The total number of cells that have been collapsed.
    pub collapsed_cells: usize,
    /// The total number of cells in the grid.
    pub total_cells: usize,
    /// Successful driver steps since initialization.
    pub steps: u64,
    /// Backtracks performed since initialization.
    pub backtracks: u64,
    /// Current length of the undo history.
    pub history_depth: usize,
    /// Lifecycle state at the time of the report.
    pub state: RunState,
}

impl ProgressInfo {
    /// Fraction of collapsed cells in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total_cells == 0 {
            0.0
        } else {
            self.collapsed_cells as f64 / self.total_cells as f64
        }
    }
}
