use super::{FormatParser, RuleFile};
use crate::{LoadError, RuleSet};

/// A parser implementation for RON (Rusty Object Notation) format rules.
///
/// ```text
/// (
///     tiles: [
///         (id: 0, weight: 1, up: [0], down: [0], left: [0, 1], right: [0, 1]),
///         (id: 1, weight: 3, left: [0, 1], right: [0, 1]),
///     ],
/// )
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct RonFormatParser;

impl RonFormatParser {
    /// Creates a new RON format parser
    pub const fn new() -> Self {
        Self
    }
}

impl FormatParser for RonFormatParser {
    fn format_name(&self) -> &'static str {
        "Rusty Object Notation (RON)"
    }

    fn parse(&self, ron_content: &str) -> Result<RuleSet, LoadError> {
        let rule_file: RuleFile = ron::from_str(ron_content)
            .map_err(|e| LoadError::ParseError(format!("RON deserialization failed: {e}")))?;
        rule_file.into_rule_set()
    }

    fn render(&self, rules: &RuleSet) -> Result<String, LoadError> {
        ron::ser::to_string_pretty(&RuleFile::from(rules), ron::ser::PrettyConfig::default())
            .map_err(|e| LoadError::ParseError(format!("RON serialization failed: {e}")))
    }
}

/// Parses WFC rules defined in a RON string.
pub fn parse_ron_rules(ron_content: &str) -> Result<RuleSet, LoadError> {
    RonFormatParser::new().parse(ron_content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, TileId};

    #[test]
    fn parses_minimal_file() {
        let rules = parse_ron_rules(
            r"(
                tiles: [
                    (id: 0, weight: 1, right: [0, 1]),
                    (id: 1, weight: 3, left: [0, 1]),
                ],
            )",
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.weight_of(TileId(1)), Some(3));
        assert!(rules
            .neighbors(TileId(0), Direction::Right)
            .unwrap()
            .contains(TileId(1)));
        assert!(rules.neighbors(TileId(0), Direction::Up).unwrap().is_empty());
    }

    #[test]
    fn render_then_parse_preserves_rules() {
        let original = parse_ron_rules(
            "(tiles: [(id: 4, weight: 2, up: [4], down: [4], left: [4], right: [4])])",
        )
        .unwrap();
        let parser = RonFormatParser::new();
        let text = parser.render(&original).unwrap();
        assert_eq!(parser.parse(&text).unwrap(), original);
    }

    #[test]
    fn reports_syntax_errors_as_parse_errors() {
        let err = parse_ron_rules("(tiles: [ (id: 0, weight: ").unwrap_err();
        assert!(matches!(err, LoadError::ParseError(msg) if msg.contains("RON deserialization failed")));
    }
}
