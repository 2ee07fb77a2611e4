// wave-weaver-app/src/progress.rs

use log::Level;
use std::time::{Duration, Instant};
use wfc_core::{CellCollapsed, CellSnapshot, CollapseObserver, GridSnapshot};

/// Observer that logs how far the run has come, at most once per interval.
///
/// Reports go through this module's logger target so `--progress-log-level`
/// can tune them separately from the rest of the output.
#[derive(Debug)]
pub struct ProgressLogger {
    interval: Duration,
    level: Level,
    total_cells: usize,
    collapsed_cells: usize,
    backtracks: usize,
    last_report: Instant,
}

impl ProgressLogger {
    pub fn new(interval: Duration, level: Level, total_cells: usize, already_collapsed: usize) -> Self {
        Self {
            interval,
            level,
            total_cells,
            collapsed_cells: already_collapsed,
            backtracks: 0,
            last_report: Instant::now(),
        }
    }

    pub const fn collapsed_cells(&self) -> usize {
        self.collapsed_cells
    }

    pub const fn backtracks(&self) -> usize {
        self.backtracks
    }

    #[allow(clippy::cast_precision_loss)]
    fn percentage(&self) -> f64 {
        if self.total_cells == 0 {
            return 100.0;
        }
        self.collapsed_cells as f64 / self.total_cells as f64 * 100.0
    }

    fn report_if_due(&mut self) {
        if self.last_report.elapsed() < self.interval {
            return;
        }
        log::log!(
            self.level,
            "Progress: collapsed {}/{} ({:.1}%), {} backtracks",
            self.collapsed_cells,
            self.total_cells,
            self.percentage(),
            self.backtracks
        );
        self.last_report = Instant::now();
    }
}

impl CollapseObserver for ProgressLogger {
    fn on_cell_collapsed(&mut self, _event: CellCollapsed) {
        self.collapsed_cells += 1;
        self.report_if_due();
    }

    fn on_backtrack(&mut self, restored: &CellSnapshot) {
        self.backtracks += 1;
        if restored.collapsed_tile.is_none() {
            self.collapsed_cells = self.collapsed_cells.saturating_sub(1);
        }
    }

    fn on_run_complete(&mut self, grid: &GridSnapshot) {
        self.collapsed_cells = grid.cells.len();
        log::log!(
            self.level,
            "Progress: all {} cells collapsed, {} backtracks",
            self.total_cells,
            self.backtracks
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfc_core::{Entropy, TileId};

    fn open_cell(index: usize) -> CellSnapshot {
        CellSnapshot {
            index,
            x: index,
            y: 0,
            collapsed_tile: None,
            entropy: Entropy::Unconstrained,
            candidates: Vec::new(),
        }
    }

    #[test]
    fn counts_follow_collapses_and_undos() {
        let mut logger = ProgressLogger::new(Duration::from_secs(3600), Level::Info, 4, 1);
        logger.on_cell_collapsed(CellCollapsed {
            index: 1,
            tile: TileId(0),
        });
        logger.on_cell_collapsed(CellCollapsed {
            index: 2,
            tile: TileId(0),
        });
        assert_eq!(logger.collapsed_cells(), 3);

        logger.on_backtrack(&open_cell(2));
        assert_eq!(logger.collapsed_cells(), 2);
        assert_eq!(logger.backtracks(), 1);
    }

    #[test]
    fn completion_snaps_to_total() {
        let mut logger = ProgressLogger::new(Duration::ZERO, Level::Debug, 2, 0);
        logger.on_run_complete(&GridSnapshot {
            width: 2,
            height: 1,
            cells: vec![open_cell(0), open_cell(1)],
        });
        assert_eq!(logger.collapsed_cells(), 2);
        assert!((logger.percentage() - 100.0).abs() < f64::EPSILON);
    }
}
