use crate::{LoadError, RuleSet};

/// Trait defining the interface for format-specific rule parsers.
///
/// Implementors of this trait can parse WFC rules from different file formats
/// (e.g., RON or JSON).
pub trait FormatParser {
    /// Parses rule content into a validated `RuleSet`.
    ///
    /// # Arguments
    ///
    /// * `content` - A string slice containing the rule content
    ///
    /// # Returns
    ///
    /// * `Ok(RuleSet)` - Successfully parsed rules
    /// * `Err(LoadError)` - Error encountered during parsing or validation
    fn parse(&self, content: &str) -> Result<RuleSet, LoadError>;

    /// Renders a rule set back into this format.
    fn render(&self, rules: &RuleSet) -> Result<String, LoadError>;

    /// Returns a descriptive name for this parser format.
    ///
    /// This can be used for debugging, logging, or user-facing error messages.
    fn format_name(&self) -> &'static str;
}
