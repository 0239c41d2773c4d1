//! Format registry for highlight serialization
//!
//! Each format implements the `Formatter` trait and is registered with `FormatRegistry`
//! under its name.

use crate::token::Highlight;
use std::collections::HashMap;
use thiserror::Error;

/// Error that can occur while formatting a highlight
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// No formatter registered under this name
    #[error("format '{0}' not found")]
    FormatNotFound(String),
    /// The serializer rejected the highlight
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Serializes a [Highlight] to one textual representation.
pub trait Formatter: Send + Sync {
    /// The name of this format (e.g., "tag", "json")
    fn name(&self) -> &str;

    /// Serialize tokens, score and flags to this format
    fn serialize(&self, highlight: &Highlight) -> Result<String, FormatError>;

    /// One-line summary shown by `--list-formats`
    fn description(&self) -> &str {
        ""
    }
}

/// Registry of highlight formatters, looked up by name.
pub struct FormatRegistry {
    formatters: HashMap<String, Box<dyn Formatter>>,
}

impl FormatRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Register a formatter, replacing any formatter of the same name.
    pub fn register<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    /// Get a formatter by name
    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    /// Check if a format exists
    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    /// Serialize a highlight with the named format
    pub fn serialize(&self, highlight: &Highlight, format: &str) -> Result<String, FormatError> {
        let formatter = self
            .get(format)
            .ok_or_else(|| FormatError::FormatNotFound(format.to_string()))?;
        formatter.serialize(highlight)
    }

    /// Sorted format names.
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formatters.keys().cloned().collect();
        names.sort();
        names
    }

    /// (name, description) pairs, sorted by name.
    pub fn describe(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .formatters
            .values()
            .map(|f| (f.name(), f.description()))
            .collect();
        entries.sort();
        entries
    }

    /// Create a registry holding `tag`, `json` and `yaml`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(super::TagFormatter);
        registry.register(super::JsonFormatter);
        registry.register(super::YamlFormatter);

        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};

    struct TestFormatter;
    impl Formatter for TestFormatter {
        fn name(&self) -> &str {
            "test"
        }
        fn serialize(&self, _highlight: &Highlight) -> Result<String, FormatError> {
            Ok("test output".to_string())
        }
        fn description(&self) -> &str {
            "Test formatter"
        }
    }

    fn sample() -> Highlight<'static> {
        Highlight {
            language: "test".to_string(),
            tokens: vec![Token::new(TokenKind::Keyword, "GO", 0..2)],
            relevance: 1,
            incomplete: false,
            illegal: false,
            depth_limited: false,
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.formatters.len(), 0);
    }

    #[test]
    fn test_registry_register() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormatter);
        assert!(registry.has("test"));
        assert_eq!(registry.get("test").unwrap().description(), "Test formatter");
    }

    #[test]
    fn test_registry_replaces_same_name() {
        let mut registry = FormatRegistry::with_defaults();
        let before = registry.list_formats().len();
        registry.register(super::super::TagFormatter);
        assert_eq!(registry.list_formats().len(), before);
    }

    #[test]
    fn test_registry_serialize() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormatter);
        assert_eq!(registry.serialize(&sample(), "test").unwrap(), "test output");
    }

    #[test]
    fn test_registry_serialize_not_found() {
        let registry = FormatRegistry::new();
        let err = registry.serialize(&sample(), "nonexistent").unwrap_err();
        assert_eq!(err, FormatError::FormatNotFound("nonexistent".to_string()));
        assert_eq!(err.to_string(), "format 'nonexistent' not found");
    }

    #[test]
    fn test_registry_defaults() {
        let registry = FormatRegistry::default();
        assert_eq!(registry.list_formats(), vec!["json", "tag", "yaml"]);
        assert!(registry.describe().iter().all(|(_, d)| !d.is_empty()));
    }
}
