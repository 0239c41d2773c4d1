//! Token kinds and classified spans.
//!
//!     A token is a classified substring of the scanned input. The tokenizer guarantees that
//!     the tokens it yields for one input are contiguous, non-overlapping and non-empty, so
//!     concatenating their texts gives the input back.
//!
//!     The kind is the only classification this crate produces. Mapping kinds to colors or
//!     markup is the renderer's business.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Classification label carried by rules, keyword categories and tokens.
///
/// Declaration order is also the keyword lookup precedence: a word present in several
/// keyword categories takes the first one listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Text no rule or keyword claimed, including generic identifiers.
    Plain,
    Keyword,
    BuiltIn,
    Literal,
    Type,
    Number,
    String,
    Comment,
    Symbol,
    Variable,
    Operator,
    Punctuation,
    Title,
    Meta,
}

impl TokenKind {
    pub const ALL: [TokenKind; 14] = [
        TokenKind::Plain,
        TokenKind::Keyword,
        TokenKind::BuiltIn,
        TokenKind::Literal,
        TokenKind::Type,
        TokenKind::Number,
        TokenKind::String,
        TokenKind::Comment,
        TokenKind::Symbol,
        TokenKind::Variable,
        TokenKind::Operator,
        TokenKind::Punctuation,
        TokenKind::Title,
        TokenKind::Meta,
    ];

    /// The snake_case label used in grammar files and output formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Plain => "plain",
            TokenKind::Keyword => "keyword",
            TokenKind::BuiltIn => "built_in",
            TokenKind::Literal => "literal",
            TokenKind::Type => "type",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Comment => "comment",
            TokenKind::Symbol => "symbol",
            TokenKind::Variable => "variable",
            TokenKind::Operator => "operator",
            TokenKind::Punctuation => "punctuation",
            TokenKind::Title => "title",
            TokenKind::Meta => "meta",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified span of the input. `range` is in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<'t> {
    pub kind: TokenKind,
    pub text: &'t str,
    pub range: Range<usize>,
}

impl<'t> Token<'t> {
    pub fn new(kind: TokenKind, text: &'t str, range: Range<usize>) -> Self {
        Self { kind, text, range }
    }

    pub fn is_plain(&self) -> bool {
        self.kind == TokenKind::Plain
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}..{} {:?}",
            self.kind, self.range.start, self.range.end, self.text
        )
    }
}

/// Everything one tokenization produced.
///
/// `relevance` is a score for callers ranking grammars against each other; the tokenizer
/// itself never acts on it. The flags are best-effort diagnostics, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight<'t> {
    pub language: String,
    pub tokens: Vec<Token<'t>>,
    pub relevance: u32,
    /// A begin/end construct was still open at end of input.
    pub incomplete: bool,
    /// The grammar's illegal pattern matched somewhere in the input.
    pub illegal: bool,
    /// Nesting hit the configured depth cap at least once.
    pub depth_limited: bool,
}

impl<'t> Highlight<'t> {
    /// Concatenation of every token text. Equals the tokenized input.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text).collect()
    }

    pub fn kinds(&self) -> Vec<(TokenKind, &'t str)> {
        self.tokens.iter().map(|t| (t.kind, t.text)).collect()
    }

    /// Drop plain tokens, keeping only classified spans.
    pub fn without_plain(mut self) -> Self {
        self.tokens.retain(|t| !t.is_plain());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels_match_serde_names() {
        for kind in TokenKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_kind_order_is_lookup_precedence() {
        assert!(TokenKind::Keyword < TokenKind::BuiltIn);
        assert!(TokenKind::BuiltIn < TokenKind::Literal);
        assert!(TokenKind::Literal < TokenKind::Type);
    }

    #[test]
    fn test_token_display() {
        let token = Token::new(TokenKind::Keyword, "SELECT", 0..6);
        assert_eq!(token.to_string(), "keyword 0..6 \"SELECT\"");
    }

    #[test]
    fn test_without_plain() {
        let highlight = Highlight {
            language: "test".to_string(),
            tokens: vec![
                Token::new(TokenKind::Keyword, "a", 0..1),
                Token::new(TokenKind::Plain, " ", 1..2),
            ],
            relevance: 0,
            incomplete: false,
            illegal: false,
            depth_limited: false,
        };
        assert_eq!(highlight.text(), "a ");
        let classified = highlight.without_plain();
        assert_eq!(classified.kinds(), vec![(TokenKind::Keyword, "a")]);
    }
}
