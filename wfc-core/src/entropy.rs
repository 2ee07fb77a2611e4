use crate::grid::CellGrid;
use crate::rng::SeededRng;
use log::trace;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remaining-choice count of a cell.
///
/// `Unconstrained` means no collapsed neighbor has touched the cell yet. It
/// is distinct from "constrained but with many options" and orders above
/// every finite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Entropy {
    Finite(usize),
    Unconstrained,
}

impl Entropy {
    /// True for collapsed cells and for contradictions.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Finite(0))
    }
}

impl fmt::Display for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(count) => write!(f, "{count}"),
            Self::Unconstrained => f.write_str("inf"),
        }
    }
}

/// All uncollapsed cells sharing the lowest finite, positive entropy.
///
/// Unconstrained cells are never eligible.
#[must_use]
pub fn lowest_entropy_cells(grid: &CellGrid) -> Vec<usize> {
    let mut min_entropy = usize::MAX;
    let mut lowest_cells = Vec::new();
    for cell in grid.iter() {
        if cell.is_collapsed() {
            continue;
        }
        let Entropy::Finite(count) = cell.entropy() else {
            continue;
        };
        if count == 0 {
            continue;
        }
        if count < min_entropy {
            min_entropy = count;
            lowest_cells.clear();
        }
        if count == min_entropy {
            lowest_cells.push(cell.index());
        }
    }
    lowest_cells
}

/// Selects the cell to collapse next: the lowest entropy, ties broken by a
/// uniform draw rather than scan order.
pub fn select_lowest_entropy_cell(grid: &CellGrid, rng: &mut SeededRng) -> Option<usize> {
    let lowest_cells = lowest_entropy_cells(grid);
    let chosen = rng.pick_one(&lowest_cells).ok().copied();
    trace!(
        "Lowest entropy tie set has {} cells, chose {:?}",
        lowest_cells.len(),
        chosen
    );
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfc_rules::{CandidateSet, TileId};

    fn set(ids: &[usize]) -> CandidateSet {
        ids.iter().copied().map(TileId).collect()
    }

    #[test]
    fn ordering_puts_unconstrained_last() {
        assert!(Entropy::Finite(0) < Entropy::Finite(3));
        assert!(Entropy::Finite(usize::MAX) < Entropy::Unconstrained);
        assert_eq!(Entropy::Finite(2).to_string(), "2");
        assert_eq!(Entropy::Unconstrained.to_string(), "inf");
    }

    #[test]
    fn unconstrained_grid_has_no_candidates() {
        let grid = CellGrid::new_unconstrained(3, 3);
        assert!(lowest_entropy_cells(&grid).is_empty());
        let mut rng = SeededRng::new(0);
        assert_eq!(select_lowest_entropy_cell(&grid, &mut rng), None);
    }

    #[test]
    fn finds_all_tied_minimum_cells() {
        let mut grid = CellGrid::new_unconstrained(4, 1);
        grid.cell_mut(0).unwrap().constrain(set(&[0, 1, 2]));
        grid.cell_mut(1).unwrap().constrain(set(&[0, 1]));
        grid.cell_mut(2).unwrap().collapse(TileId(0));
        grid.cell_mut(3).unwrap().constrain(set(&[1, 2]));
        assert_eq!(lowest_entropy_cells(&grid), vec![1, 3]);
    }

    #[test]
    fn contradictions_are_not_selected() {
        let mut grid = CellGrid::new_unconstrained(2, 1);
        grid.cell_mut(0).unwrap().mark_contradiction();
        grid.cell_mut(1).unwrap().constrain(set(&[4]));
        assert_eq!(lowest_entropy_cells(&grid), vec![1]);
    }

    #[test]
    fn tie_break_is_not_scan_order() {
        let mut grid = CellGrid::new_unconstrained(8, 1);
        for index in 0..8 {
            grid.cell_mut(index).unwrap().constrain(set(&[0, 1]));
        }
        let mut rng = SeededRng::new(11);
        let picks: std::collections::BTreeSet<usize> = (0..200)
            .filter_map(|_| select_lowest_entropy_cell(&grid, &mut rng))
            .collect();
        assert!(picks.len() > 1, "tie-break always picked {picks:?}");
    }
}
