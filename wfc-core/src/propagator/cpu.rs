use crate::{
    grid::CellGrid,
    propagator::{ConstraintPropagator, PropagationError},
};
use log::trace;
use wfc_rules::{CandidateSet, Direction, RuleSet};

/// Global, non-incremental propagator.
///
/// Each pass recomputes every uncollapsed cell from its collapsed neighbors
/// only. A cell with no collapsed neighbor goes back to unconstrained, which
/// also clears contradictions left behind once backtracking has removed
/// their cause.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuConstraintPropagator;

impl CpuConstraintPropagator {
    pub const fn new() -> Self {
        Self
    }

    /// Recomputes a single cell. Collapsed cells are left alone.
    ///
    /// # Errors
    ///
    /// Returns `PropagationError::Contradiction` if the intersection of the
    /// neighbor constraints is empty. The cell is marked as a contradiction
    /// first.
    pub fn recompute_cell(
        &self,
        grid: &mut CellGrid,
        rules: &RuleSet,
        index: usize,
    ) -> Result<(), PropagationError> {
        match grid.cell(index) {
            Some(cell) if !cell.is_collapsed() => {}
            _ => return Ok(()),
        }

        let mut constraint: Option<CandidateSet> = None;
        for direction in Direction::ALL {
            let Some(neighbor_index) = grid.neighbor(index, direction) else {
                continue;
            };
            let Some(tile) = grid.cell(neighbor_index).and_then(|n| n.collapsed_tile()) else {
                continue;
            };
            // The neighbor sits in `direction` from us, so its list toward us
            // is the opposite side.
            let allowed = rules
                .neighbors(tile, direction.opposite())
                .ok_or(PropagationError::UnknownTile(tile))?;
            match constraint.as_mut() {
                Some(current) => current.intersect_with(allowed),
                None => constraint = Some(allowed.clone()),
            }
        }

        let Some(cell) = grid.cell_mut(index) else {
            return Ok(());
        };
        match constraint {
            None => cell.mark_unconstrained(),
            Some(candidates) if candidates.is_empty() => {
                cell.mark_contradiction();
                return Err(PropagationError::Contradiction { index });
            }
            Some(candidates) => {
                trace!("Cell {} constrained to {} candidates", index, candidates.len());
                cell.constrain(candidates);
            }
        }
        Ok(())
    }
}

impl ConstraintPropagator for CpuConstraintPropagator {
    fn propagate(&mut self, grid: &mut CellGrid, rules: &RuleSet) -> Result<(), PropagationError> {
        let mut first_contradiction = None;
        for index in 0..grid.len() {
            match self.recompute_cell(grid, rules, index) {
                Ok(()) => {}
                Err(PropagationError::Contradiction { index }) => {
                    first_contradiction.get_or_insert(index);
                }
                Err(other) => return Err(other),
            }
        }
        match first_contradiction {
            Some(index) => Err(PropagationError::Contradiction { index }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::Entropy;
    use wfc_rules::{TileId, TileRule};

    // 0 and 1 may touch each other; 2 only touches 1.
    fn chain_rules() -> RuleSet {
        RuleSet::new([
            (TileId(0), TileRule::new(1).allow_all_sides([0, 1])),
            (TileId(1), TileRule::new(1).allow_all_sides([0, 1, 2])),
            (TileId(2), TileRule::new(1).allow_all_sides([1])),
        ])
        .unwrap()
    }

    #[test]
    fn untouched_cells_stay_unconstrained() {
        let rules = chain_rules();
        let mut grid = CellGrid::new_unconstrained(3, 3);
        let mut propagator = CpuConstraintPropagator::new();
        propagator.propagate(&mut grid, &rules).unwrap();
        assert!(grid.iter().all(|cell| cell.is_unconstrained()));
    }

    #[test]
    fn neighbors_of_collapsed_cell_are_constrained() {
        let rules = chain_rules();
        let mut grid = CellGrid::new_unconstrained(3, 3);
        grid.cell_mut(4).unwrap().collapse(TileId(2));
        let mut propagator = CpuConstraintPropagator::new();
        propagator.propagate(&mut grid, &rules).unwrap();

        for index in [1, 3, 5, 7] {
            let cell = grid.cell(index).unwrap();
            assert_eq!(cell.entropy(), Entropy::Finite(1));
            assert_eq!(cell.candidates().to_vec(), vec![TileId(1)]);
        }
        // corners have no collapsed neighbor
        for index in [0, 2, 6, 8] {
            assert!(grid.cell(index).unwrap().is_unconstrained());
        }
    }

    #[test]
    fn constraints_from_several_sides_intersect() {
        let rules = chain_rules();
        let mut grid = CellGrid::new_unconstrained(3, 1);
        grid.cell_mut(0).unwrap().collapse(TileId(0));
        grid.cell_mut(2).unwrap().collapse(TileId(1));
        let mut propagator = CpuConstraintPropagator::new();
        propagator.propagate(&mut grid, &rules).unwrap();
        // {0, 1} from the left, {0, 1, 2} from the right
        assert_eq!(
            grid.cell(1).unwrap().candidates().to_vec(),
            vec![TileId(0), TileId(1)]
        );
    }

    #[test]
    fn direction_is_taken_from_the_neighbor() {
        // tile 0 only allows 1 on its right; everything else is open
        let rules = RuleSet::new([
            (
                TileId(0),
                TileRule::new(1)
                    .allow(Direction::Up, [0, 1])
                    .allow(Direction::Down, [0, 1])
                    .allow(Direction::Left, [0, 1])
                    .allow(Direction::Right, [1]),
            ),
            (TileId(1), TileRule::new(1).allow_all_sides([0, 1])),
        ])
        .unwrap();
        let mut grid = CellGrid::new_unconstrained(3, 1);
        grid.cell_mut(1).unwrap().collapse(TileId(0));
        let mut propagator = CpuConstraintPropagator::new();
        propagator.propagate(&mut grid, &rules).unwrap();
        assert_eq!(grid.cell(2).unwrap().candidates().to_vec(), vec![TileId(1)]);
        assert_eq!(grid.cell(0).unwrap().entropy(), Entropy::Finite(2));
    }

    // Each tile only tolerates itself.
    fn isolated_rules() -> RuleSet {
        RuleSet::new([
            (TileId(0), TileRule::new(1).allow_all_sides([0])),
            (TileId(1), TileRule::new(1).allow_all_sides([1])),
        ])
        .unwrap()
    }

    #[test]
    fn reports_lowest_contradiction_and_marks_all() {
        let rules = isolated_rules();
        let mut grid = CellGrid::new_unconstrained(5, 1);
        grid.cell_mut(0).unwrap().collapse(TileId(0));
        grid.cell_mut(2).unwrap().collapse(TileId(1));
        grid.cell_mut(4).unwrap().collapse(TileId(0));
        let mut propagator = CpuConstraintPropagator::new();
        let result = propagator.propagate(&mut grid, &rules);
        assert_eq!(result, Err(PropagationError::Contradiction { index: 1 }));
        assert!(grid.cell(1).unwrap().is_contradiction());
        assert!(grid.cell(3).unwrap().is_contradiction());
    }

    #[test]
    fn contradiction_clears_when_cause_is_removed() {
        let rules = isolated_rules();
        let mut grid = CellGrid::new_unconstrained(3, 1);
        grid.cell_mut(0).unwrap().collapse(TileId(0));
        grid.cell_mut(2).unwrap().collapse(TileId(1));
        let mut propagator = CpuConstraintPropagator::new();
        assert!(propagator.propagate(&mut grid, &rules).is_err());

        *grid.cell_mut(2).unwrap() = crate::grid::Cell::unconstrained(2);
        propagator.propagate(&mut grid, &rules).unwrap();
        assert_eq!(grid.cell(1).unwrap().candidates().to_vec(), vec![TileId(0)]);
        assert!(grid.cell(2).unwrap().is_unconstrained());
    }

    #[test]
    fn unknown_collapsed_tile_is_an_error() {
        let rules = chain_rules();
        let mut grid = CellGrid::new_unconstrained(2, 1);
        grid.cell_mut(0).unwrap().collapse(TileId(9));
        let mut propagator = CpuConstraintPropagator::new();
        assert_eq!(
            propagator.propagate(&mut grid, &rules),
            Err(PropagationError::UnknownTile(TileId(9)))
        );
    }
}
