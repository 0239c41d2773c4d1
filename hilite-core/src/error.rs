//! Errors raised while loading grammars and resolving languages.
//!
//! Everything that can go wrong with a grammar is detected when it is compiled or
//! registered. Tokenization itself has no failure mode: unterminated constructs and
//! illegal input are reported as flags on the result.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("grammar has an empty name")]
    EmptyName,

    #[error("grammar '{grammar}': pattern fragment '{name}' is not defined")]
    UndefinedFragment { grammar: String, name: String },

    #[error("grammar '{grammar}': pattern fragment '{name}' expands recursively")]
    RecursiveFragment { grammar: String, name: String },

    #[error("grammar '{grammar}': included rule '{name}' is not defined")]
    UndefinedRule { grammar: String, name: String },

    #[error("grammar '{grammar}': rule {path} {reason}")]
    MalformedRule {
        grammar: String,
        path: String,
        reason: String,
    },

    #[error("grammar '{grammar}': invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        grammar: String,
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("grammar name or alias '{0}' is already registered")]
    DuplicateName(String),

    #[error("grammar '{grammar}' is declared a superset of unknown grammar '{target}'")]
    UnknownSuperset { grammar: String, target: String },

    #[error("grammar '{grammar}' embeds unknown sub-language '{target}'")]
    UnknownSubLanguage { grammar: String, target: String },

    #[error("could not parse grammar data: {0}")]
    Parse(String),

    #[error("could not read grammar file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GrammarError {
    pub(crate) fn invalid_pattern(grammar: &str, pattern: &str, source: regex::Error) -> Self {
        GrammarError::InvalidPattern {
            grammar: grammar.to_string(),
            pattern: pattern.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn malformed(grammar: &str, path: &str, reason: impl Into<String>) -> Self {
        GrammarError::MalformedRule {
            grammar: grammar.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("no grammar registered for language '{0}'")]
    UnknownLanguage(String),
}
