use crate::snapshot::{CellSnapshot, GridSnapshot};
use std::sync::mpsc::Sender;
use wfc_rules::TileId;

/// A committed collapse, reported at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellCollapsed {
    pub index: usize,
    pub tile: TileId,
}

/// Notifications emitted by one engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WfcEvent {
    CellCollapsed(CellCollapsed),
    /// A history step was undone; `restored` is the cell after the undo.
    Backtracked { restored: CellSnapshot },
    RunComplete(GridSnapshot),
}

/// Receives engine notifications.
///
/// Notifications are informational; the engine behaves the same with or
/// without an observer attached. All methods default to doing nothing.
pub trait CollapseObserver: Send {
    fn on_cell_collapsed(&mut self, _event: CellCollapsed) {}

    fn on_backtrack(&mut self, _restored: &CellSnapshot) {}

    fn on_run_complete(&mut self, _grid: &GridSnapshot) {}
}

/// Adapts a closure over [`WfcEvent`] into an observer.
pub struct FnObserver<F>(pub F);

impl<F> std::fmt::Debug for FnObserver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnObserver")
    }
}

impl<F> CollapseObserver for FnObserver<F>
where
    F: FnMut(&WfcEvent) + Send,
{
    fn on_cell_collapsed(&mut self, event: CellCollapsed) {
        (self.0)(&WfcEvent::CellCollapsed(event));
    }

    fn on_backtrack(&mut self, restored: &CellSnapshot) {
        (self.0)(&WfcEvent::Backtracked {
            restored: restored.clone(),
        });
    }

    fn on_run_complete(&mut self, grid: &GridSnapshot) {
        (self.0)(&WfcEvent::RunComplete(grid.clone()));
    }
}

// A dropped receiver just means nobody is listening any more.
impl CollapseObserver for Sender<WfcEvent> {
    fn on_cell_collapsed(&mut self, event: CellCollapsed) {
        let _ = self.send(WfcEvent::CellCollapsed(event));
    }

    fn on_backtrack(&mut self, restored: &CellSnapshot) {
        let _ = self.send(WfcEvent::Backtracked {
            restored: restored.clone(),
        });
    }

    fn on_run_complete(&mut self, grid: &GridSnapshot) {
        let _ = self.send(WfcEvent::RunComplete(grid.clone()));
    }
}

/// Fans every notification out to each observer in order.
impl CollapseObserver for Vec<Box<dyn CollapseObserver>> {
    fn on_cell_collapsed(&mut self, event: CellCollapsed) {
        for observer in self.iter_mut() {
            observer.on_cell_collapsed(event);
        }
    }

    fn on_backtrack(&mut self, restored: &CellSnapshot) {
        for observer in self.iter_mut() {
            observer.on_backtrack(restored);
        }
    }

    fn on_run_complete(&mut self, grid: &GridSnapshot) {
        for observer in self.iter_mut() {
            observer.on_run_complete(grid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn closure_observer_sees_events() {
        let mut seen = Vec::new();
        {
            let mut observer = FnObserver(|event: &WfcEvent| seen.push(event.clone()));
            observer.on_cell_collapsed(CellCollapsed {
                index: 2,
                tile: TileId(1),
            });
        }
        assert_eq!(
            seen,
            vec![WfcEvent::CellCollapsed(CellCollapsed {
                index: 2,
                tile: TileId(1)
            })]
        );
    }

    #[test]
    fn observer_list_fans_out() {
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        let mut observers: Vec<Box<dyn CollapseObserver>> = vec![Box::new(tx_a), Box::new(tx_b)];
        observers.on_cell_collapsed(CellCollapsed {
            index: 1,
            tile: TileId(0),
        });
        assert_eq!(rx_a.try_iter().count(), 1);
        assert_eq!(rx_b.try_iter().count(), 1);
    }

    #[test]
    fn channel_observer_ignores_closed_receiver() {
        let (mut tx, rx) = mpsc::channel();
        tx.on_cell_collapsed(CellCollapsed {
            index: 0,
            tile: TileId(3),
        });
        assert!(matches!(rx.recv(), Ok(WfcEvent::CellCollapsed(_))));
        drop(rx);
        tx.on_run_complete(&GridSnapshot {
            width: 0,
            height: 0,
            cells: Vec::new(),
        });
    }
}
