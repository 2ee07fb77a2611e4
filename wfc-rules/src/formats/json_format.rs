use super::{FormatParser, RuleFile};
use crate::{LoadError, RuleSet};

/// A parser implementation for JSON format rules.
///
/// Uses the same schema as the RON format:
/// `{"tiles": [{"id": 0, "weight": 1, "up": [0], ...}]}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatParser;

impl JsonFormatParser {
    pub const fn new() -> Self {
        Self
    }
}

impl FormatParser for JsonFormatParser {
    fn format_name(&self) -> &'static str {
        "JSON"
    }

    fn parse(&self, json_content: &str) -> Result<RuleSet, LoadError> {
        let rule_file: RuleFile = serde_json::from_str(json_content)
            .map_err(|e| LoadError::ParseError(format!("JSON deserialization failed: {e}")))?;
        rule_file.into_rule_set()
    }

    fn render(&self, rules: &RuleSet) -> Result<String, LoadError> {
        serde_json::to_string_pretty(&RuleFile::from(rules))
            .map_err(|e| LoadError::ParseError(format!("JSON serialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, TileId};

    #[test]
    fn parses_json_rules() {
        let rules = JsonFormatParser::new()
            .parse(r#"{"tiles": [{"id": 0, "weight": 2, "down": [0]}]}"#)
            .unwrap();
        assert_eq!(rules.weight_of(TileId(0)), Some(2));
        assert!(rules
            .neighbors(TileId(0), Direction::Down)
            .unwrap()
            .contains(TileId(0)));
    }

    #[test]
    fn unknown_neighbor_is_invalid_data() {
        let err = JsonFormatParser::new()
            .parse(r#"{"tiles": [{"id": 0, "weight": 1, "left": [9]}]}"#)
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidData(msg) if msg.contains("unknown tile 9")));
    }
}
