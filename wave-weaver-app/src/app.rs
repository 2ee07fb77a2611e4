// wave-weaver-app/src/app.rs

use crate::config::{AppConfig, GenerationSettings, VisualizationMode};
use crate::error::AppError;
use crate::logging::init_logger;
use crate::output::save_grid_to_file;
use crate::progress::ProgressLogger;
use crate::visualization::{TerminalVisualizer, Visualizer};
use anyhow::Context;
use clap::Parser;
use log::Level;
use std::sync::atomic::Ordering;
use std::time::Instant;
use wfc_core::{CollapseObserver, GridSnapshot, RunOutcome, Wfc, WfcError};
use wfc_rules::loader::load_from_file;

/// Parses the command line, sets up logging and drives one generation on a
/// fresh tokio runtime.
///
/// # Errors
///
/// Any [`AppError`]; [`AppError::exit_code`] maps it to a process status.
pub fn main() -> Result<(), AppError> {
    let config = AppConfig::parse();
    init_logger(&config);
    log::debug!("Parsed command line: {:?}", config);

    let settings = config.settings()?;
    log::debug!("Resolved settings: {:?}", settings);

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    runtime.block_on(run(settings, config.progress_log_level.into()))
}

/// Loads the rules, runs the engine and saves the grid.
///
/// The grid is written even when the run is cancelled or fails, with `-1`
/// for cells that never collapsed.
///
/// # Errors
///
/// Rule loading, engine setup, generation failures, output I/O, and
/// [`AppError::Cancelled`] after Ctrl+C.
pub async fn run(settings: GenerationSettings, progress_level: Level) -> Result<(), AppError> {
    log::info!("Wave Weaver starting");
    let start_time = Instant::now();

    let rule_file = settings
        .rule_file
        .as_deref()
        .ok_or_else(|| AppError::Config("No rule file given".to_string()))?;
    log::info!("Loading rules from: {:?}", rule_file);
    let rules = load_from_file(rule_file)?;
    log::info!("Rules loaded: {} tiles", rules.len());

    let mut wfc = Wfc::new(settings.wfc_config(), rules);
    wfc.initialize()?;
    log::info!(
        "Grid initialized: {}x{}, seed {}",
        settings.width,
        settings.height,
        wfc.seed()
    );

    let cancel = wfc.cancel_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl+C received, stopping after the current step");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let mut observers: Vec<Box<dyn CollapseObserver>> = Vec::new();
    if let Some(interval) = settings.progress_interval()? {
        observers.push(Box::new(ProgressLogger::new(
            interval,
            progress_level,
            settings.width * settings.height,
            wfc.progress().collapsed_cells,
        )));
    }
    if !observers.is_empty() {
        wfc.set_observer(observers);
    }

    let outcome = match settings.visualization_mode {
        VisualizationMode::Terminal => {
            let mut visualizer = TerminalVisualizer::new();
            run_with_preview(&mut wfc, &mut visualizer).await
        }
        VisualizationMode::None => wfc.run_async().await.map_err(AppError::from),
    };
    ctrl_c.abort();

    let seed = wfc.seed();
    let save = |grid: &GridSnapshot| {
        save_grid_to_file(
            grid,
            seed,
            settings.output_format,
            &settings.output_path,
        )
    };

    match outcome {
        Ok(RunOutcome::Completed(grid)) => {
            save(&grid)?;
            let progress = wfc.progress();
            log::info!(
                "Generated {} cells in {:?} ({} steps, {} backtracks)",
                progress.total_cells,
                start_time.elapsed(),
                progress.steps,
                progress.backtracks
            );
            Ok(())
        }
        Ok(RunOutcome::Cancelled(progress)) => {
            save(&wfc.snapshot()?)?;
            log::warn!(
                "Run cancelled at {:.1}% collapsed; partial grid saved to {:?}",
                progress.fraction() * 100.0,
                settings.output_path
            );
            Err(AppError::Cancelled {
                collapsed_cells: progress.collapsed_cells,
                total_cells: progress.total_cells,
            })
        }
        Err(e) => {
            log::error!("WFC failed: {}", e);
            if let Ok(grid) = wfc.snapshot() {
                if let Err(save_err) = save(&grid) {
                    log::warn!("Could not save partial grid: {save_err:#}");
                }
            }
            Err(e)
        }
    }
}

/// Steps the engine one collapse at a time, drawing a frame after each step.
async fn run_with_preview<V: Visualizer>(
    wfc: &mut Wfc,
    visualizer: &mut V,
) -> Result<RunOutcome, AppError> {
    let cancel = wfc.cancel_handle();
    let max_steps = wfc.config().max_steps;
    let mut steps = 0_u64;

    visualizer.display_state(&wfc.snapshot()?)?;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Ok(RunOutcome::Cancelled(wfc.progress()));
        }
        let status = wfc.step()?;
        let grid = wfc.snapshot()?;
        visualizer.display_state(&grid)?;
        if status.is_complete() {
            return Ok(RunOutcome::Completed(grid));
        }
        steps += 1;
        if let Some(limit) = max_steps {
            if steps >= limit {
                return Err(WfcError::MaxStepsReached(limit).into());
            }
        }
        tokio::task::yield_now().await;
    }
}
