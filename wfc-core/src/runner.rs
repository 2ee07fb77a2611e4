use crate::{
    entropy::select_lowest_entropy_cell,
    grid::{Cell, CellGrid},
    history::{HistoryStack, HistoryStep},
    observer::{CellCollapsed, CollapseObserver},
    propagator::{ConstraintPropagator, CpuConstraintPropagator, PropagationError},
    rng::SeededRng,
    snapshot::{CellSnapshot, GridSnapshot},
    ConfigError, ProgressInfo, RunState, WfcError,
};
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use wfc_rules::{Direction, RuleSet, TileId};

/// Backtracks allowed in a row before a run is declared over-constrained.
pub const DEFAULT_MAX_BACKTRACKS: usize = 100;

/// Configuration options for the WFC engine.
#[derive(Debug, Clone)]
pub struct WfcConfig {
    pub width: usize,
    pub height: usize,
    /// `None` derives a seed from the clock once, at engine construction.
    pub seed: Option<u64>,
    /// Cell used to bootstrap propagation. `None` picks one at random.
    pub starting_index: Option<usize>,
    pub max_backtracks: usize,
    /// Upper bound on forward steps taken by one `run` call.
    pub max_steps: Option<u64>,
    /// Set to request a cooperative stop between steps.
    pub cancel_signal: Arc<AtomicBool>,
}

impl WfcConfig {
    /// Creates a new builder for `WfcConfig`.
    pub fn builder() -> WfcConfigBuilder {
        WfcConfigBuilder::default()
    }
}

impl Default for WfcConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            seed: None,
            starting_index: None,
            max_backtracks: DEFAULT_MAX_BACKTRACKS,
            max_steps: None,
            cancel_signal: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Builder for `WfcConfig`.
#[derive(Debug, Default)]
pub struct WfcConfigBuilder {
    width: Option<usize>,
    height: Option<usize>,
    seed: Option<u64>,
    starting_index: Option<usize>,
    max_backtracks: Option<usize>,
    max_steps: Option<u64>,
    cancel_signal: Option<Arc<AtomicBool>>, // a fresh flag is created if None
}

impl WfcConfigBuilder {
    #[must_use]
    pub const fn dimensions(mut self, width: usize, height: usize) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Sets the seed for the random number generator.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn starting_index(mut self, index: usize) -> Self {
        self.starting_index = Some(index);
        self
    }

    #[must_use]
    pub const fn max_backtracks(mut self, max: usize) -> Self {
        self.max_backtracks = Some(max);
        self
    }

    /// Sets the maximum number of forward steps a single `run` may take.
    #[must_use]
    pub const fn max_steps(mut self, max: u64) -> Self {
        self.max_steps = Some(max);
        self
    }

    /// Provides an external cancellation flag.
    /// If not provided, a new flag will be created.
    #[must_use]
    pub fn cancel_signal(mut self, signal: Arc<AtomicBool>) -> Self {
        self.cancel_signal = Some(signal);
        self
    }

    /// Builds the `WfcConfig` instance.
    pub fn build(self) -> WfcConfig {
        let defaults = WfcConfig::default();
        WfcConfig {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            seed: self.seed,
            starting_index: self.starting_index,
            max_backtracks: self.max_backtracks.unwrap_or(defaults.max_backtracks),
            max_steps: self.max_steps,
            cancel_signal: self.cancel_signal.unwrap_or(defaults.cancel_signal),
        }
    }
}

/// Result of a single `step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// One cell was committed and the grid is not complete yet.
    Progressed(CellCollapsed),
    /// Every cell is collapsed.
    Complete,
}

impl StepStatus {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Terminal outcome of `run` / `run_async` that is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(GridSnapshot),
    /// The cancel signal was seen between steps. The grid is left as the
    /// last completed step made it.
    Cancelled(ProgressInfo),
}

/// A Wave Function Collapse engine over one 2D grid.
///
/// The engine owns its grid, history and random source; the rule set is
/// read-only apart from per-tile weights. Drive it one cell at a time with
/// [`Wfc::step`] or to completion with [`Wfc::run`] / [`Wfc::run_async`].
///
/// A single `step` call retries internally through backtracking, so its
/// worst-case latency is bounded by `max_backtracks`, not by a constant.
pub struct Wfc {
    config: WfcConfig,
    rules: RuleSet,
    rng: SeededRng,
    grid: Option<CellGrid>,
    history: HistoryStack,
    state: RunState,
    propagator: Box<dyn ConstraintPropagator>,
    observer: Option<Box<dyn CollapseObserver>>,
    consecutive_backtracks: usize,
    total_backtracks: u64,
    steps: u64,
    bootstrapped: bool,
}

impl fmt::Debug for Wfc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wfc")
            .field("config", &self.config)
            .field("seed", &self.rng.seed())
            .field("tiles", &self.rules.len())
            .field("state", &self.state)
            .field("history_depth", &self.history.len())
            .field("steps", &self.steps)
            .field("backtracks", &self.total_backtracks)
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Wfc {
    /// Creates an uninitialized engine using the CPU propagator.
    pub fn new(config: WfcConfig, rules: RuleSet) -> Self {
        let seed = config.seed.unwrap_or_else(SeededRng::time_seed);
        Self {
            config,
            rules,
            rng: SeededRng::new(seed),
            grid: None,
            history: HistoryStack::new(),
            state: RunState::Uninitialized,
            propagator: Box::new(CpuConstraintPropagator::new()),
            observer: None,
            consecutive_backtracks: 0,
            total_backtracks: 0,
            steps: 0,
            bootstrapped: false,
        }
    }

    /// Replaces the constraint propagator.
    #[must_use]
    pub fn with_propagator(mut self, propagator: Box<dyn ConstraintPropagator>) -> Self {
        self.propagator = propagator;
        self
    }

    /// Attaches an observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl CollapseObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Allocates a fresh unconstrained grid and rewinds the random source.
    ///
    /// Allowed from any state. Clears the cancel signal.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the rule set is empty, a dimension is
    /// zero, or the starting index is outside the grid. The engine is left
    /// `Uninitialized` in that case.
    pub fn initialize(&mut self) -> Result<(), WfcError> {
        self.reset();

        if self.rules.is_empty() {
            error!("Cannot initialize WFC: rule set is empty");
            return Err(ConfigError::EmptyRuleSet.into());
        }
        let (width, height) = (self.config.width, self.config.height);
        let cells = match width.checked_mul(height) {
            Some(cells) if cells > 0 => cells,
            _ => {
                error!("Cannot initialize WFC: invalid dimensions {width}x{height}");
                return Err(ConfigError::InvalidDimensions { width, height }.into());
            }
        };
        if let Some(index) = self.config.starting_index {
            if index >= cells {
                return Err(ConfigError::CellOutOfBounds { index, cells }.into());
            }
        }

        self.rng.reseed();
        self.config.cancel_signal.store(false, Ordering::Relaxed);
        self.grid = Some(CellGrid::new_unconstrained(width, height));
        self.state = RunState::Ready;
        info!(
            "Initialized {}x{} grid with {} tiles (seed {})",
            width,
            height,
            self.rules.len(),
            self.rng.seed()
        );
        Ok(())
    }

    /// Drops the grid and history and returns to `Uninitialized`.
    pub fn reset(&mut self) {
        self.grid = None;
        self.history.clear();
        self.state = RunState::Uninitialized;
        self.consecutive_backtracks = 0;
        self.total_backtracks = 0;
        self.steps = 0;
        self.bootstrapped = false;
    }

    /// Changes the grid size. The engine must be initialized again.
    pub fn set_dimensions(&mut self, width: usize, height: usize) {
        self.config.width = width;
        self.config.height = height;
        self.reset();
    }

    /// Replaces the rule set. The engine must be initialized again.
    pub fn load_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
        self.reset();
    }

    /// Changes one tile's selection weight. Affects later draws only.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownTile` if the tile is not defined.
    pub fn set_weight(&mut self, tile: TileId, weight: u32) -> Result<(), WfcError> {
        self.rules.set_weight(tile, weight)?;
        debug!("Weight of tile {tile} set to {weight}");
        Ok(())
    }

    /// Pins a cell to a tile, exactly like a driver commit: the previous
    /// state goes on the history stack, so backtracking can undo it.
    ///
    /// A contradiction caused by the seed is left in the grid and resolved
    /// by the next step.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown tile, an out-of-range
    /// index, or an uninitialized engine, and `WfcError::RunFailed` if the
    /// engine already failed.
    pub fn set_collapsed(&mut self, index: usize, tile: TileId) -> Result<(), WfcError> {
        if !self.rules.contains(tile) {
            return Err(ConfigError::UnknownTile(tile).into());
        }
        let grid = self.grid.as_ref().ok_or(ConfigError::NotInitialized)?;
        if index >= grid.len() {
            return Err(ConfigError::CellOutOfBounds {
                index,
                cells: grid.len(),
            }
            .into());
        }
        if self.state == RunState::Failed {
            return Err(WfcError::RunFailed);
        }

        match self.commit(index, tile) {
            Ok(()) => info!("Manually seeded cell {index} with tile {tile}"),
            Err(WfcError::Propagation(PropagationError::Contradiction { index: cell })) => {
                warn!("Seeding cell {index} with tile {tile} contradicts cell {cell}");
            }
            Err(e) => return Err(e),
        }
        if self.state == RunState::Collapsed && !self.grid_is_complete() {
            self.state = RunState::Collapsing;
        }
        Ok(())
    }

    /// Collapses one cell, backtracking internally as often as needed.
    ///
    /// # Errors
    ///
    /// * `ConfigError::NotInitialized` before `initialize`.
    /// * `WfcError::RunFailed` after an earlier fatal error.
    /// * `WfcError::BacktrackBudgetExhausted` / `WfcError::EmptyHistory` when
    ///   generation fails; the engine moves to `RunState::Failed`.
    pub fn step(&mut self) -> Result<StepStatus, WfcError> {
        match self.state {
            RunState::Uninitialized => return Err(ConfigError::NotInitialized.into()),
            RunState::Collapsed => return Ok(StepStatus::Complete),
            RunState::Failed => return Err(WfcError::RunFailed),
            RunState::Ready | RunState::Collapsing => {}
        }
        self.state = RunState::Collapsing;
        self.advance().map_err(|e| {
            error!("WFC step failed: {e}");
            self.state = RunState::Failed;
            e
        })
    }

    /// Steps until the grid is complete, a fatal error occurs, or the cancel
    /// signal is set.
    ///
    /// # Errors
    ///
    /// Any error from [`Wfc::step`], plus `WfcError::MaxStepsReached` when
    /// `max_steps` forward steps did not finish the grid.
    pub fn run(&mut self) -> Result<RunOutcome, WfcError> {
        let started = self.begin_run()?;
        let mut steps_this_run = 0;
        loop {
            if let Some(outcome) = self.drive_once(&mut steps_this_run, started)? {
                return Ok(outcome);
            }
        }
    }

    /// Like [`Wfc::run`], yielding to the tokio scheduler between steps.
    ///
    /// # Errors
    ///
    /// Same as [`Wfc::run`].
    pub async fn run_async(&mut self) -> Result<RunOutcome, WfcError> {
        let started = self.begin_run()?;
        let mut steps_this_run = 0;
        loop {
            if let Some(outcome) = self.drive_once(&mut steps_this_run, started)? {
                return Ok(outcome);
            }
            tokio::task::yield_now().await;
        }
    }

    /// Copy of one cell.
    ///
    /// # Errors
    ///
    /// `ConfigError::NotInitialized` or `ConfigError::CellOutOfBounds`.
    pub fn cell(&self, index: usize) -> Result<CellSnapshot, WfcError> {
        let grid = self.grid.as_ref().ok_or(ConfigError::NotInitialized)?;
        let cell = grid.cell(index).ok_or(ConfigError::CellOutOfBounds {
            index,
            cells: grid.len(),
        })?;
        Ok(CellSnapshot::capture(grid, cell))
    }

    /// Copy of the whole grid.
    ///
    /// # Errors
    ///
    /// `ConfigError::NotInitialized` before `initialize`.
    pub fn snapshot(&self) -> Result<GridSnapshot, WfcError> {
        let grid = self.grid.as_ref().ok_or(ConfigError::NotInitialized)?;
        Ok(GridSnapshot::capture(grid))
    }

    /// Uncollapsed cells, or `None` before `initialize`.
    #[must_use]
    pub fn remaining_count(&self) -> Option<usize> {
        self.grid.as_ref().map(CellGrid::remaining_count)
    }

    pub fn progress(&self) -> ProgressInfo {
        ProgressInfo {
            collapsed_cells: self.grid.as_ref().map_or(0, CellGrid::collapsed_count),
            total_cells: self.grid.as_ref().map_or(0, CellGrid::len),
            steps: self.steps,
            backtracks: self.total_backtracks,
            history_depth: self.history.len(),
            state: self.state,
        }
    }

    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// The seed in use, resolved once at construction.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.rng.seed()
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    #[must_use]
    pub const fn config(&self) -> &WfcConfig {
        &self.config
    }

    #[must_use]
    pub fn history_depth(&self) -> usize {
        self.history.len()
    }

    /// Shared handle to the cancel signal.
    #[must_use]
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.config.cancel_signal)
    }

    fn begin_run(&self) -> Result<Instant, WfcError> {
        if self.state == RunState::Uninitialized {
            return Err(ConfigError::NotInitialized.into());
        }
        info!(
            "Starting WFC run on {}x{} grid (seed {}, max backtracks {})",
            self.config.width,
            self.config.height,
            self.rng.seed(),
            self.config.max_backtracks
        );
        Ok(Instant::now())
    }

    /// One iteration of the run loop. `Some` ends the run.
    fn drive_once(
        &mut self,
        steps_this_run: &mut u64,
        started: Instant,
    ) -> Result<Option<RunOutcome>, WfcError> {
        if self.config.cancel_signal.load(Ordering::Relaxed) {
            warn!("Cancel signal received, stopping WFC run");
            return Ok(Some(RunOutcome::Cancelled(self.progress())));
        }
        if self.step()?.is_complete() {
            info!(
                "WFC run finished in {:?} after {} steps and {} backtracks",
                started.elapsed(),
                self.steps,
                self.total_backtracks
            );
            return Ok(Some(RunOutcome::Completed(self.snapshot()?)));
        }
        *steps_this_run += 1;
        if let Some(limit) = self.config.max_steps {
            if *steps_this_run >= limit {
                error!("Maximum steps ({limit}) reached before the grid was complete");
                return Err(WfcError::MaxStepsReached(limit));
            }
        }
        Ok(None)
    }

    fn advance(&mut self) -> Result<StepStatus, WfcError> {
        loop {
            let grid = self.grid.as_ref().ok_or(ConfigError::NotInitialized)?;
            if let Some(cell) = grid.first_contradiction() {
                warn!("Contradiction at cell {cell}, backtracking");
                self.backtrack(cell)?;
                continue;
            }

            let Some(index) = self.choose_cell()? else {
                return Ok(self.finish());
            };
            let tile = self.choose_tile(index)?;
            match self.commit(index, tile) {
                Ok(()) => {
                    self.consecutive_backtracks = 0;
                    self.steps += 1;
                    if self.grid_is_complete() {
                        return Ok(self.finish());
                    }
                    return Ok(StepStatus::Progressed(CellCollapsed { index, tile }));
                }
                Err(WfcError::Propagation(PropagationError::Contradiction { index: cell })) => {
                    warn!("Collapsing cell {index} to tile {tile} contradicts cell {cell}");
                    self.backtrack(cell)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Next cell to collapse, or `None` once the grid is complete.
    fn choose_cell(&mut self) -> Result<Option<usize>, WfcError> {
        let grid = self.grid.as_ref().ok_or(ConfigError::NotInitialized)?;
        let is_open = |index: usize| grid.cell(index).is_some_and(|c| !c.is_collapsed());

        if !self.bootstrapped {
            self.bootstrapped = true;
            let start = match self.config.starting_index {
                Some(index) => Some(index),
                None => self.rng.next_index(grid.len()),
            };
            if let Some(index) = start.filter(|&index| is_open(index)) {
                debug!("Bootstrapping propagation from cell {index}");
                return Ok(Some(index));
            }
        }

        if let Some(index) = select_lowest_entropy_cell(grid, &mut self.rng) {
            return Ok(Some(index));
        }
        if grid.remaining_count() == 0 {
            return Ok(None);
        }

        // Nothing is constrained, e.g. backtracking undid every collapse.
        if let Some(index) = self.config.starting_index.filter(|&index| is_open(index)) {
            return Ok(Some(index));
        }
        let open: Vec<usize> = grid
            .iter()
            .filter(|cell| !cell.is_collapsed())
            .map(Cell::index)
            .collect();
        Ok(self.rng.pick_one(&open).ok().copied())
    }

    /// Unconstrained cells draw uniformly from the whole rule set; others
    /// draw from their candidates by weight.
    fn choose_tile(&mut self, index: usize) -> Result<TileId, WfcError> {
        let grid = self.grid.as_ref().ok_or(ConfigError::NotInitialized)?;
        let cell = grid.cell(index).ok_or(ConfigError::CellOutOfBounds {
            index,
            cells: grid.len(),
        })?;
        if cell.is_unconstrained() {
            let tiles: Vec<TileId> = self.rules.tile_ids().collect();
            return Ok(*self.rng.pick_one(&tiles)?);
        }
        let candidates = cell.candidates().to_vec();
        let rules = &self.rules;
        let tile = self
            .rng
            .pick_weighted(&candidates, |tile| rules.weight_of(*tile).unwrap_or(0))?;
        Ok(*tile)
    }

    fn commit(&mut self, index: usize, tile: TileId) -> Result<(), WfcError> {
        let grid = self.grid.as_mut().ok_or(ConfigError::NotInitialized)?;
        let cells = grid.len();
        let fits = fits_collapsed_neighbors(grid, &self.rules, index, tile);
        let cell = grid
            .cell_mut(index)
            .ok_or(ConfigError::CellOutOfBounds { index, cells })?;
        self.history.push(HistoryStep::capture(cell));
        cell.collapse(tile);
        if !fits {
            cell.mark_conflict();
        }
        debug!(
            "Collapsed cell {} to tile {} (depth {})",
            index,
            tile,
            self.history.len()
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.on_cell_collapsed(CellCollapsed { index, tile });
        }
        self.propagator.propagate(grid, &self.rules)?;
        if fits {
            Ok(())
        } else {
            Err(PropagationError::Contradiction { index }.into())
        }
    }

    fn backtrack(&mut self, contradiction: usize) -> Result<(), WfcError> {
        let Some(step) = self.history.pop() else {
            error!("Contradiction at cell {contradiction} with nothing left to undo");
            return Err(WfcError::EmptyHistory {
                cell: contradiction,
            });
        };
        self.consecutive_backtracks += 1;
        self.total_backtracks += 1;

        let grid = self.grid.as_mut().ok_or(ConfigError::NotInitialized)?;
        if let Some(cell) = grid.cell_mut(step.cell_index) {
            cell.restore(&step);
        }
        match self.propagator.propagate(grid, &self.rules) {
            // A remaining contradiction is handled by the next loop iteration.
            Ok(()) | Err(PropagationError::Contradiction { .. }) => {}
            Err(e) => return Err(e.into()),
        }
        debug!(
            "Backtracked cell {} (depth {}, {} consecutive)",
            step.cell_index,
            self.history.len(),
            self.consecutive_backtracks
        );
        if let (Some(observer), Some(cell)) = (self.observer.as_mut(), grid.cell(step.cell_index))
        {
            observer.on_backtrack(&CellSnapshot::capture(grid, cell));
        }

        if self.consecutive_backtracks > self.config.max_backtracks {
            error!(
                "Backtrack budget of {} exhausted",
                self.config.max_backtracks
            );
            return Err(WfcError::BacktrackBudgetExhausted {
                max_backtracks: self.config.max_backtracks,
            });
        }
        Ok(())
    }

    fn finish(&mut self) -> StepStatus {
        self.state = RunState::Collapsed;
        info!("All cells collapsed after {} steps", self.steps);
        if let (Some(observer), Some(grid)) = (self.observer.as_mut(), self.grid.as_ref()) {
            observer.on_run_complete(&GridSnapshot::capture(grid));
        }
        StepStatus::Complete
    }

    fn grid_is_complete(&self) -> bool {
        self.grid
            .as_ref()
            .is_some_and(|grid| grid.remaining_count() == 0 && grid.first_contradiction().is_none())
    }
}

/// Whether every collapsed neighbor lists `tile` on its side facing `index`.
fn fits_collapsed_neighbors(
    grid: &CellGrid,
    rules: &RuleSet,
    index: usize,
    tile: TileId,
) -> bool {
    Direction::ALL.into_iter().all(|direction| {
        let Some(tile_there) = grid
            .neighbor(index, direction)
            .and_then(|n| grid.cell(n))
            .and_then(Cell::collapsed_tile)
        else {
            return true;
        };
        rules
            .neighbors(tile_there, direction.opposite())
            .is_some_and(|allowed| allowed.contains(tile))
    })
}
