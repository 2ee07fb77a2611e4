//! Wave Weaver Application Library
//!
//! Command line host for the `wfc-core` engine: configuration layering,
//! logging, progress reporting, terminal preview and grid output.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod visualization;

pub use config::{AppConfig, GenerationSettings};
pub use error::AppError;

// Re-export the main function so it can be called from the root crate
pub use crate::app::main;
