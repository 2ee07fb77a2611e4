use crate::entropy::Entropy;
use crate::grid::{Cell, CellGrid};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use wfc_rules::TileId;

/// Owned copy of one cell, safe to hand to a host.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellSnapshot {
    pub index: usize,
    pub x: usize,
    pub y: usize,
    pub collapsed_tile: Option<TileId>,
    pub entropy: Entropy,
    pub candidates: Vec<TileId>,
}

impl CellSnapshot {
    pub(crate) fn capture(grid: &CellGrid, cell: &Cell) -> Self {
        let (x, y) = grid.coords(cell.index()).unwrap_or_default();
        Self {
            index: cell.index(),
            x,
            y,
            collapsed_tile: cell.collapsed_tile(),
            entropy: cell.entropy(),
            candidates: cell.candidates().to_vec(),
        }
    }

    /// Collapsed tile id, or `-1` when the cell is unresolved.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn tile_value(&self) -> i64 {
        self.collapsed_tile.map_or(-1, |tile| tile.0 as i64)
    }
}

/// Owned copy of the whole grid in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridSnapshot {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<CellSnapshot>,
}

impl GridSnapshot {
    #[must_use]
    pub fn capture(grid: &CellGrid) -> Self {
        Self {
            width: grid.width,
            height: grid.height,
            cells: grid
                .iter()
                .map(|cell| CellSnapshot::capture(grid, cell))
                .collect(),
        }
    }

    /// Flattened tile ids, `-1` for unresolved cells.
    #[must_use]
    pub fn tiles(&self) -> Vec<i64> {
        self.cells.iter().map(CellSnapshot::tile_value).collect()
    }

    #[must_use]
    pub fn tile_at(&self, x: usize, y: usize) -> Option<TileId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get(y * self.width + x)
            .and_then(|cell| cell.collapsed_tile)
    }

    /// Rows of tile ids, `-1` for unresolved cells.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<i64>> {
        if self.width == 0 {
            return Vec::new();
        }
        self.tiles()
            .chunks(self.width)
            .map(<[i64]>::to_vec)
            .collect()
    }

    /// True when every cell holds a tile.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|cell| cell.collapsed_tile.is_some())
    }
}
