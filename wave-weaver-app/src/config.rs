use crate::error::AppError;
use clap::{Parser, ValueEnum};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use wfc_core::{WfcConfig, DEFAULT_MAX_BACKTRACKS};

/// Prefix for environment overrides, e.g. `WAVE_WEAVER_WIDTH=32`.
pub const ENV_PREFIX: &str = "WAVE_WEAVER_";

/// Represents the different visualization modes available.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationMode {
    #[default]
    None,
    /// Colored text grid redrawn after every step.
    Terminal,
}

/// Format of the generated grid file.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One row per line, space-separated tile ids, `-1` for open cells.
    #[default]
    Text,
    /// Full grid snapshot as JSON.
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GlobalLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Level used for periodic progress reports.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProgressLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
}

/// Command line for the Wave Weaver generator.
///
/// Generation settings given here override the `--config` file and
/// `WAVE_WEAVER_*` environment variables. Options left out fall back to
/// those layers and then to built-in defaults.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Path to the RON or JSON rule file defining tiles and adjacencies.
    #[arg(short, long, value_name = "FILE")]
    pub rule_file: Option<PathBuf>,

    /// Optional TOML file with generation settings.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Width of the output grid.
    #[arg(long)]
    pub width: Option<usize>,

    /// Height of the output grid.
    #[arg(long)]
    pub height: Option<usize>,

    /// Optional seed for the random number generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Flattened index of the cell that bootstraps the run.
    #[arg(long)]
    pub start_index: Option<usize>,

    /// Consecutive backtracks allowed before giving up.
    #[arg(long)]
    pub max_backtracks: Option<usize>,

    /// Upper bound on forward steps.
    #[arg(long)]
    pub max_steps: Option<u64>,

    /// Path to save the generated output grid.
    #[arg(short, long, value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Report progress updates every specified interval (e.g., "1s", "500ms").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub report_progress_interval: Option<Duration>,

    /// Choose the visualization mode.
    #[arg(long, value_enum)]
    pub visualization_mode: Option<VisualizationMode>,

    #[arg(long, value_enum, default_value_t = GlobalLogLevel::Info)]
    pub global_log_level: GlobalLogLevel,

    #[arg(long, value_enum, default_value_t = ProgressLogLevel::Info)]
    pub progress_log_level: ProgressLogLevel,
}

/// Fully resolved settings for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub rule_file: Option<PathBuf>,
    pub width: usize,
    pub height: usize,
    pub seed: Option<u64>,
    pub start_index: Option<usize>,
    pub max_backtracks: usize,
    pub max_steps: Option<u64>,
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
    /// Humantime string such as `"2s"`.
    pub report_progress_interval: Option<String>,
    pub visualization_mode: VisualizationMode,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            rule_file: None,
            width: 10,
            height: 10,
            seed: None,
            start_index: None,
            max_backtracks: DEFAULT_MAX_BACKTRACKS,
            max_steps: None,
            output_path: PathBuf::from("output.txt"),
            output_format: OutputFormat::Text,
            report_progress_interval: None,
            visualization_mode: VisualizationMode::None,
        }
    }
}

// Only explicitly given CLI values; `None` must not mask lower layers.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    rule_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_backtracks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_steps: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report_progress_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visualization_mode: Option<VisualizationMode>,
}

impl AppConfig {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            rule_file: self.rule_file.clone(),
            width: self.width,
            height: self.height,
            seed: self.seed,
            start_index: self.start_index,
            max_backtracks: self.max_backtracks,
            max_steps: self.max_steps,
            output_path: self.output_path.clone(),
            output_format: self.output_format,
            report_progress_interval: self
                .report_progress_interval
                .map(|interval| humantime::format_duration(interval).to_string()),
            visualization_mode: self.visualization_mode,
        }
    }

    /// Merges defaults, the TOML file, environment and CLI, in that order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the config file is missing or any layer
    /// holds a value of the wrong type.
    pub fn settings(&self) -> Result<GenerationSettings, AppError> {
        let mut figment = Figment::from(Serialized::defaults(GenerationSettings::default()));
        if let Some(path) = &self.config {
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        let settings: GenerationSettings = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(self.overrides()))
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

impl GenerationSettings {
    fn validate(&self) -> Result<(), AppError> {
        if self.rule_file.is_none() {
            return Err(AppError::Config(
                "No rule file given (use --rule-file, the config file or WAVE_WEAVER_RULE_FILE)"
                    .to_string(),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(AppError::Config(format!(
                "Grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        self.progress_interval().map(|_| ())
    }

    /// Parsed progress interval.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a malformed duration string.
    pub fn progress_interval(&self) -> Result<Option<Duration>, AppError> {
        self.report_progress_interval
            .as_deref()
            .map(|raw| {
                humantime::parse_duration(raw)
                    .map_err(|e| AppError::Config(format!("Invalid progress interval '{raw}': {e}")))
            })
            .transpose()
    }

    /// Engine configuration for these settings.
    pub fn wfc_config(&self) -> WfcConfig {
        let mut builder = WfcConfig::builder()
            .dimensions(self.width, self.height)
            .max_backtracks(self.max_backtracks);
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        if let Some(index) = self.start_index {
            builder = builder.starting_index(index);
        }
        if let Some(max) = self.max_steps {
            builder = builder.max_steps(max);
        }
        builder.build()
    }
}
