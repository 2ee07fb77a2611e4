//! Module defining parsers for different rule file formats.

use crate::types::{RuleSet, TileId, TileRule};
use crate::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// Export the core parser trait
pub mod parser;
pub use parser::FormatParser;

// Format-specific implementations
pub mod json_format;
pub mod ron_format;

/// One tile definition as it appears in a rule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileEntry {
    /// Tile identifier used in adjacency lists and in generated grids.
    pub id: TileId,
    /// Relative selection weight.
    pub weight: u32,
    #[serde(default)]
    pub up: BTreeSet<TileId>,
    #[serde(default)]
    pub down: BTreeSet<TileId>,
    #[serde(default)]
    pub left: BTreeSet<TileId>,
    #[serde(default)]
    pub right: BTreeSet<TileId>,
}

/// Top-level structure shared by every textual rule format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFile {
    /// A list defining all available tiles.
    pub tiles: Vec<TileEntry>,
}

impl RuleFile {
    /// Validates the file contents and compiles them into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidData` for duplicate ids or adjacency lists
    /// that reference undefined tiles.
    pub fn into_rule_set(self) -> Result<RuleSet, LoadError> {
        let rules = self.tiles.into_iter().map(|entry| {
            (
                entry.id,
                TileRule {
                    weight: entry.weight,
                    up: entry.up,
                    down: entry.down,
                    left: entry.left,
                    right: entry.right,
                },
            )
        });
        let rule_set = RuleSet::new(rules)?;
        let asymmetric = rule_set.asymmetries();
        if !asymmetric.is_empty() {
            log::debug!(
                "Rule set has {} asymmetric adjacency entries (first: {:?})",
                asymmetric.len(),
                asymmetric.first()
            );
        }
        Ok(rule_set)
    }
}

impl From<&RuleSet> for RuleFile {
    fn from(rules: &RuleSet) -> Self {
        let tiles = rules
            .to_tile_rules()
            .into_iter()
            .map(|(id, rule)| TileEntry {
                id,
                weight: rule.weight,
                up: rule.up,
                down: rule.down,
                left: rule.left,
                right: rule.right,
            })
            .collect();
        Self { tiles }
    }
}
