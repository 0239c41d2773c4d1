//! YAML format through serde_yaml.

use super::registry::{FormatError, Formatter};
use crate::token::Highlight;

pub struct YamlFormatter;

impl Formatter for YamlFormatter {
    fn name(&self) -> &str {
        "yaml"
    }

    fn serialize(&self, highlight: &Highlight) -> Result<String, FormatError> {
        serde_yaml::to_string(highlight).map_err(|e| FormatError::SerializationError(e.to_string()))
    }

    fn description(&self) -> &str {
        "Tokens, relevance and flags as YAML"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};

    #[test]
    fn test_yaml_lists_tokens() {
        let highlight = Highlight {
            language: "mini".to_string(),
            tokens: vec![Token::new(TokenKind::Comment, "-- hi", 0..5)],
            relevance: 0,
            incomplete: false,
            illegal: false,
            depth_limited: false,
        };
        let out = YamlFormatter.serialize(&highlight).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        assert_eq!(value["language"].as_str(), Some("mini"));
        assert_eq!(value["tokens"][0]["kind"].as_str(), Some("comment"));
        assert_eq!(value["tokens"][0]["text"].as_str(), Some("-- hi"));
    }
}
