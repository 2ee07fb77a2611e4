//! Tile rule definitions for the Wave Function Collapse engine.
//!
//! A [`RuleSet`] maps tile ids to a selection weight and to the tiles allowed
//! on each of the four sides. Rule files can be read from RON or JSON.

use thiserror::Error;

#[cfg(feature = "serde")]
pub mod formats;
#[cfg(feature = "serde")]
pub mod loader;
pub mod types;

pub use types::{CandidateSet, Direction, RuleSet, RuleSetError, TileId, TileRule, MAX_TILE_ID};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rules format (e.g., RON/JSON): {0}")]
    ParseError(String),
    #[error("Invalid rule data: {0}")]
    InvalidData(String),
    #[error("Unsupported rule file extension: {0}")]
    UnsupportedFormat(String),
}

impl From<RuleSetError> for LoadError {
    fn from(error: RuleSetError) -> Self {
        Self::InvalidData(error.to_string())
    }
}
