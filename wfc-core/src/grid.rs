use crate::entropy::Entropy;
use crate::history::HistoryStep;
use wfc_rules::{CandidateSet, Direction, TileId};

/// Row-major 2D grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    pub(crate) data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Creates a new grid with the given dimensions, initialized with default values.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Creates a grid by calling `init` with each flattened index.
    pub fn from_fn(width: usize, height: usize, init: impl FnMut(usize) -> T) -> Self {
        Self {
            width,
            height,
            data: (0..width * height).map(init).collect(),
        }
    }

    /// Calculates the flattened index `y * width + x`.
    /// Returns None if the coordinates are out of bounds.
    pub const fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Converts a flattened index back to `(x, y)`.
    pub const fn coords(&self, index: usize) -> Option<(usize, usize)> {
        if index < self.width * self.height {
            Some((index % self.width, index / self.width))
        } else {
            None
        }
    }

    /// Flattened index of the neighbor in `direction`, or None at the edge.
    pub fn neighbor(&self, index: usize, direction: Direction) -> Option<usize> {
        let (x, y) = self.coords(index)?;
        let (dx, dy) = direction.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        self.index_of(nx, ny)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }
}

/// One grid position.
///
/// A cell is unconstrained until a neighbor collapses, constrained while
/// it has a finite candidate set, and collapsed once a tile is committed.
/// An uncollapsed cell with zero entropy is a contradiction, and so is a
/// cell committed to a tile its candidates did not allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    index: usize,
    collapsed_tile: Option<TileId>,
    candidates: CandidateSet,
    entropy: Entropy,
    conflicted: bool,
}

impl Cell {
    /// A fresh cell that no constraint has touched.
    #[must_use]
    pub fn unconstrained(index: usize) -> Self {
        Self {
            index,
            collapsed_tile: None,
            candidates: CandidateSet::default(),
            entropy: Entropy::Unconstrained,
            conflicted: false,
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn collapsed_tile(&self) -> Option<TileId> {
        self.collapsed_tile
    }

    /// Remaining tiles; only meaningful while uncollapsed.
    #[must_use]
    pub const fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    #[must_use]
    pub const fn entropy(&self) -> Entropy {
        self.entropy
    }

    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        self.collapsed_tile.is_some()
    }

    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.collapsed_tile.is_none() && matches!(self.entropy, Entropy::Unconstrained)
    }

    #[must_use]
    pub const fn is_contradiction(&self) -> bool {
        self.conflicted || (self.collapsed_tile.is_none() && self.entropy.is_zero())
    }

    /// Commits a tile. Collapsed cells report zero entropy.
    pub fn collapse(&mut self, tile: TileId) {
        self.conflicted = false;
        self.collapsed_tile = Some(tile);
        self.candidates.clear();
        self.entropy = Entropy::Finite(0);
    }

    /// Replaces the candidate set with one computed by propagation.
    pub fn constrain(&mut self, candidates: CandidateSet) {
        self.entropy = Entropy::Finite(candidates.len());
        self.candidates = candidates;
    }

    /// Drops all constraint information.
    pub fn mark_unconstrained(&mut self) {
        self.candidates.clear();
        self.entropy = Entropy::Unconstrained;
    }

    /// Flags a committed tile that clashes with the neighbors.
    pub fn mark_conflict(&mut self) {
        self.conflicted = true;
    }

    /// Records that no tile satisfies the neighbors.
    pub fn mark_contradiction(&mut self) {
        self.candidates.clear();
        self.entropy = Entropy::Finite(0);
    }

    /// Puts back the state captured in `step`.
    pub fn restore(&mut self, step: &HistoryStep) {
        self.conflicted = false;
        self.collapsed_tile = step.previous_collapsed_tile;
        self.candidates = step.previous_candidates.clone();
        self.entropy = step.previous_entropy;
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::unconstrained(0)
    }
}

/// The solver's grid of cells.
pub type CellGrid = Grid<Cell>;

impl CellGrid {
    /// Allocates `width * height` unconstrained cells.
    #[must_use]
    pub fn new_unconstrained(width: usize, height: usize) -> Self {
        Self::from_fn(width, height, Cell::unconstrained)
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.data.get(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.data.get_mut(index)
    }

    /// Number of cells without a committed tile.
    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.data.iter().filter(|cell| !cell.is_collapsed()).count()
    }

    #[must_use]
    pub fn collapsed_count(&self) -> usize {
        self.len() - self.remaining_count()
    }

    /// Lowest index of a cell that is out of candidates or holds a clashing tile.
    #[must_use]
    pub fn first_contradiction(&self) -> Option<usize> {
        self.data
            .iter()
            .find(|cell| cell.is_contradiction())
            .map(Cell::index)
    }
}
