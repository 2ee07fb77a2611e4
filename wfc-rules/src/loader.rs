use crate::formats::{json_format::JsonFormatParser, ron_format::RonFormatParser, FormatParser};
use crate::{LoadError, RuleSet};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Picks a parser from the file extension (`.ron` or `.json`).
///
/// # Errors
///
/// Returns `LoadError::UnsupportedFormat` for any other extension.
pub fn parser_for_path(path: &Path) -> Result<Box<dyn FormatParser>, LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("ron") => Ok(Box::new(RonFormatParser::new())),
        Some("json") => Ok(Box::new(JsonFormatParser::new())),
        other => Err(LoadError::UnsupportedFormat(
            other.unwrap_or("<none>").to_owned(),
        )),
    }
}

/// Loads and validates a rule set from a specified file.
///
/// # Arguments
///
/// * `path` - The path to the rule definition file (a RON or JSON file).
///
/// # Returns
///
/// A `Result` containing the loaded `RuleSet` on success, or a `LoadError`
/// on failure.
pub fn load_from_file(path: &Path) -> Result<RuleSet, LoadError> {
    let parser = parser_for_path(path)?;
    let content = fs::read_to_string(path)?;
    debug!(
        "Parsing {} bytes from {:?} as {}",
        content.len(),
        path,
        parser.format_name()
    );
    let rules = parser.parse(&content)?;
    info!("Loaded {} tile rules from {:?}", rules.len(), path);
    Ok(rules)
}

/// Writes a rule set to `path`, choosing the format from the extension.
pub fn save_to_file(rules: &RuleSet, path: &Path) -> Result<(), LoadError> {
    let parser = parser_for_path(path)?;
    let text = parser.render(rules)?;
    fs::write(path, text)?;
    info!("Saved {} tile rules to {:?}", rules.len(), path);
    Ok(())
}
