//! Testing utilities for token assertions
//!
//!     Every tokenization must cover its input exactly: tokens are contiguous, start at 0,
//!     end at the input length, and never carry empty text. [assert_covers] checks that
//!     property and should back any test that produces tokens from ad-hoc input.
//!
//!     For the bundled grammars use [builtins], which compiles them once per test binary,
//!     and compare with [assert_kinds] so failures print the whole stream:
//!
//!     ```rust,ignore
//!     use hilite_core::testing::{assert_kinds, builtins};
//!
//!     let highlight = builtins().tokenize("cocosql", "SELECT 1").unwrap();
//!     assert_kinds(&highlight, &[(Keyword, "SELECT"), (Plain, " "), (Number, "1")]);
//!     ```

use crate::grammar::GrammarRegistry;
use crate::token::{Highlight, Token, TokenKind};
use once_cell::sync::Lazy;

static BUILTINS: Lazy<GrammarRegistry> = Lazy::new(|| {
    GrammarRegistry::with_builtins().unwrap_or_else(|e| panic!("bundled grammars: {e}"))
});

/// Shared registry holding the bundled grammars.
pub fn builtins() -> &'static GrammarRegistry {
    &BUILTINS
}

/// Panics unless `tokens` partition `text` exactly.
#[track_caller]
pub fn assert_covers(text: &str, tokens: &[Token]) {
    let mut at = 0;
    for (i, token) in tokens.iter().enumerate() {
        assert_eq!(
            token.range.start, at,
            "token #{i} ({token}) does not start where the previous one ended"
        );
        assert!(!token.text.is_empty(), "token #{i} ({token}) is empty");
        assert_eq!(
            &text[token.range.clone()],
            token.text,
            "token #{i} text does not match its range"
        );
        at = token.range.end;
    }
    assert_eq!(at, text.len(), "tokens stop at byte {at} of {}", text.len());
}

/// Panics with both streams printed one token per line when they differ.
#[track_caller]
pub fn assert_kinds(highlight: &Highlight, expected: &[(TokenKind, &str)]) {
    let actual = highlight.kinds();
    if actual != expected {
        let render = |items: &[(TokenKind, &str)]| {
            items
                .iter()
                .map(|(kind, text)| format!("  {kind} {text:?}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        panic!(
            "token streams differ\nexpected:\n{}\nactual:\n{}",
            render(expected),
            render(&actual)
        );
    }
}

/// Only the classified tokens, as (kind, text).
pub fn classified<'t>(highlight: &Highlight<'t>) -> Vec<(TokenKind, &'t str)> {
    highlight
        .tokens
        .iter()
        .filter(|t| !t.is_plain())
        .map(|t| (t.kind, t.text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_covers_accepts_partition() {
        let tokens = vec![
            Token::new(TokenKind::Keyword, "ab", 0..2),
            Token::new(TokenKind::Plain, "c", 2..3),
        ];
        assert_covers("abc", &tokens);
    }

    #[test]
    #[should_panic(expected = "does not start where the previous one ended")]
    fn test_assert_covers_rejects_gap() {
        let tokens = vec![
            Token::new(TokenKind::Keyword, "a", 0..1),
            Token::new(TokenKind::Plain, "c", 2..3),
        ];
        assert_covers("abc", &tokens);
    }

    #[test]
    #[should_panic(expected = "tokens stop at byte 1 of 3")]
    fn test_assert_covers_rejects_short() {
        assert_covers("abc", &[Token::new(TokenKind::Plain, "a", 0..1)]);
    }

    #[test]
    fn test_builtins_are_loaded() {
        assert!(builtins().has("cocosql"));
        assert!(builtins().has("coco-sql-old"));
    }
}
