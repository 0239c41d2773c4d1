//! JSON format: the whole [Highlight] through serde_json, pretty printed.

use super::registry::{FormatError, Formatter};
use crate::token::Highlight;

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(&self, highlight: &Highlight) -> Result<String, FormatError> {
        serde_json::to_string_pretty(highlight)
            .map_err(|e| FormatError::SerializationError(e.to_string()))
    }

    fn description(&self) -> &str {
        "Tokens, relevance and flags as pretty-printed JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};
    use serde_json::Value;

    #[test]
    fn test_json_shape() {
        let highlight = Highlight {
            language: "mini".to_string(),
            tokens: vec![
                Token::new(TokenKind::BuiltIn, "now()", 0..5),
                Token::new(TokenKind::Plain, " x", 5..7),
            ],
            relevance: 1,
            incomplete: false,
            illegal: true,
            depth_limited: false,
        };
        let out = JsonFormatter.serialize(&highlight).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["language"], "mini");
        assert_eq!(value["illegal"], true);
        assert_eq!(value["tokens"][0]["kind"], "built_in");
        assert_eq!(value["tokens"][0]["range"]["start"], 0);
        assert_eq!(value["tokens"][0]["range"]["end"], 5);
        assert_eq!(value["tokens"][1]["text"], " x");
    }
}
