//! Tag format
//!
//! A header line with the language, score and any raised flags, then one line per token:
//!
//!     # cocosql relevance=2
//!     keyword 0..6 "SELECT"
//!     plain 6..7 " "
//!     number 7..8 "1"

use super::registry::{FormatError, Formatter};
use crate::token::Highlight;
use std::fmt::Write;

pub struct TagFormatter;

impl Formatter for TagFormatter {
    fn name(&self) -> &str {
        "tag"
    }

    fn serialize(&self, highlight: &Highlight) -> Result<String, FormatError> {
        Ok(serialize_highlight(highlight))
    }

    fn description(&self) -> &str {
        "One line per token: kind, byte range and quoted text"
    }
}

pub fn serialize_highlight(highlight: &Highlight) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write!(out, "# {} relevance={}", highlight.language, highlight.relevance);
    for (flag, raised) in [
        ("incomplete", highlight.incomplete),
        ("illegal", highlight.illegal),
        ("depth_limited", highlight.depth_limited),
    ] {
        if raised {
            out.push(' ');
            out.push_str(flag);
        }
    }
    out.push('\n');
    for token in &highlight.tokens {
        let _ = writeln!(out, "{token}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::spec::{GrammarSpec, RuleSpec};
    use crate::grammar::Grammar;
    use crate::token::TokenKind;

    #[test]
    fn test_tag_output() {
        let grammar = Grammar::compile(
            &GrammarSpec::new("mini")
                .keywords(TokenKind::Keyword, "SELECT")
                .rule(RuleSpec::include("single_quoted_string")),
        )
        .unwrap();
        let highlight = grammar.tokenize("SELECT 'a\"b");
        insta::assert_snapshot!(serialize_highlight(&highlight), @r###"
        # mini relevance=2 incomplete
        keyword 0..6 "SELECT"
        plain 6..7 " "
        string 7..11 "'a\"b"
        "###);
    }
}
