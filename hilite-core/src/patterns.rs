//! Pattern Registry
//!
//!     Named, reusable building blocks so grammars do not redefine primitives:
//!
//!     Fragments:
//!         Regex sources interpolated into rule patterns as `{{name}}`. Interpolated
//!         fragments are wrapped in a non-capturing group so alternations stay local.
//!
//!     Rules:
//!         Complete rule definitions pulled into a rule list with `include: name`
//!         (numbers, comments, quoted strings with doubled-quote escaping).
//!
//!     The registry is pure lookup. The built-in set is shared through
//!     [PatternRegistry::builtin]; callers wanting extra entries start from
//!     [PatternRegistry::with_builtins] and register on top.

use crate::grammar::spec::RuleSpec;
use crate::token::TokenKind;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Identifier as most SQL dialects spell it unquoted.
pub const IDENT: &str = r"[a-zA-Z_][a-zA-Z_0-9$]*";
/// Decimal, hexadecimal and scientific literals, with an optional leading minus.
pub const C_NUMBER: &str = r"(-?)(\b0[xX][a-fA-F0-9]+|(\b\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?)";
/// `$$` or `$tag$` delimiter of a dollar-quoted string.
pub const DOLLAR_TAG: &str = r"\$([a-zA-Z_]?|[a-zA-Z_][a-zA-Z_0-9]*)\$";
/// `<<label>>` statement label.
pub const LABEL: &str = r"<<\s*[a-zA-Z_][a-zA-Z_0-9$]*\s*>>";
pub const BLOCK_COMMENT_BEGIN: &str = r"/\*";
pub const BLOCK_COMMENT_END: &str = r"\*/";
pub const LINE_COMMENT: &str = r"--";

static FRAGMENT_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

static BUILTIN: Lazy<PatternRegistry> = Lazy::new(PatternRegistry::with_builtins);

/// Fragment expansion stops after this many nested references.
const MAX_FRAGMENT_NESTING: usize = 8;

/// Why a pattern could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    Undefined(String),
    Recursive(String),
}

#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    fragments: HashMap<String, String>,
    rules: HashMap<String, RuleSpec>,
}

impl PatternRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared built-in registry.
    pub fn builtin() -> &'static PatternRegistry {
        &BUILTIN
    }

    /// A fresh registry seeded with the built-in fragments and rules.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_fragment("ident", IDENT);
        registry.register_fragment("c_number", C_NUMBER);
        registry.register_fragment("dollar_tag", DOLLAR_TAG);
        registry.register_fragment("label", LABEL);
        registry.register_fragment("block_comment_begin", BLOCK_COMMENT_BEGIN);
        registry.register_fragment("block_comment_end", BLOCK_COMMENT_END);
        registry.register_fragment("line_comment", LINE_COMMENT);

        registry.register_rule(
            "c_number",
            RuleSpec::new("{{c_number}}")
                .label(TokenKind::Number)
                .relevance(0),
        );
        registry.register_rule(
            "c_block_comment",
            RuleSpec::new("{{block_comment_begin}}")
                .end("{{block_comment_end}}")
                .label(TokenKind::Comment)
                .relevance(0),
        );
        registry.register_rule(
            "sql_line_comment",
            RuleSpec::new("{{line_comment}}")
                .end("$")
                .label(TokenKind::Comment)
                .relevance(0),
        );
        registry.register_rule(
            "single_quoted_string",
            RuleSpec::new("'")
                .end("'")
                .label(TokenKind::String)
                .contains(RuleSpec::new("''")),
        );
        registry.register_rule(
            "double_quoted_identifier",
            RuleSpec::new("\"").end("\"").contains(RuleSpec::new("\"\"")),
        );
        registry.register_rule(
            "dollar_quoted_string",
            RuleSpec::new("{{dollar_tag}}")
                .end_same_as_begin()
                .label(TokenKind::String),
        );

        registry
    }

    /// Register a fragment. An existing fragment with the same name is replaced.
    pub fn register_fragment(&mut self, name: impl Into<String>, pattern: impl Into<String>) {
        self.fragments.insert(name.into(), pattern.into());
    }

    /// Register a named rule. An existing rule with the same name is replaced.
    pub fn register_rule(&mut self, name: impl Into<String>, rule: RuleSpec) {
        self.rules.insert(name.into(), rule);
    }

    pub fn fragment(&self, name: &str) -> Option<&str> {
        self.fragments.get(name).map(|s| s.as_str())
    }

    pub fn rule(&self, name: &str) -> Option<&RuleSpec> {
        self.rules.get(name)
    }

    /// Sorted fragment names.
    pub fn fragment_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.fragments.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Sorted rule names.
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.rules.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Replace every `{{name}}` in `pattern`. `local` is consulted before the registry.
    pub fn expand(
        &self,
        pattern: &str,
        local: &dyn Fn(&str) -> Option<String>,
    ) -> Result<String, ExpandError> {
        self.expand_nested(pattern, local, 0)
    }

    fn expand_nested(
        &self,
        pattern: &str,
        local: &dyn Fn(&str) -> Option<String>,
        nesting: usize,
    ) -> Result<String, ExpandError> {
        if !FRAGMENT_REF.is_match(pattern) {
            return Ok(pattern.to_string());
        }

        let mut failure = None;
        let expanded = FRAGMENT_REF.replace_all(pattern, |caps: &Captures| {
            let name = &caps[1];
            if failure.is_some() {
                return String::new();
            }
            if nesting >= MAX_FRAGMENT_NESTING {
                failure = Some(ExpandError::Recursive(name.to_string()));
                return String::new();
            }
            let source = local(name).or_else(|| self.fragment(name).map(str::to_string));
            match source {
                Some(source) => match self.expand_nested(&source, local, nesting + 1) {
                    Ok(inner) => format!("(?:{inner})"),
                    Err(e) => {
                        failure = Some(e);
                        String::new()
                    }
                },
                None => {
                    failure = Some(ExpandError::Undefined(name.to_string()));
                    String::new()
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(expanded.into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_local(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_builtin_fragments_compile() {
        let registry = PatternRegistry::builtin();
        for name in registry.fragment_names() {
            let pattern = registry.fragment(name).unwrap();
            assert!(Regex::new(pattern).is_ok(), "fragment {name} must compile");
        }
    }

    #[test]
    fn test_builtin_rules_present() {
        let registry = PatternRegistry::builtin();
        assert_eq!(
            registry.rule_names(),
            vec![
                "c_block_comment",
                "c_number",
                "dollar_quoted_string",
                "double_quoted_identifier",
                "single_quoted_string",
                "sql_line_comment",
            ]
        );
    }

    #[test]
    fn test_expand_wraps_fragment() {
        let registry = PatternRegistry::builtin();
        let expanded = registry.expand(r"x{{line_comment}}y", &no_local).unwrap();
        assert_eq!(expanded, "x(?:--)y");
    }

    #[test]
    fn test_expand_prefers_local() {
        let registry = PatternRegistry::builtin();
        let local = |name: &str| (name == "ident").then(|| "[a-z]+".to_string());
        let expanded = registry.expand("{{ ident }}", &local).unwrap();
        assert_eq!(expanded, "(?:[a-z]+)");
    }

    #[test]
    fn test_expand_nested_fragments() {
        let mut registry = PatternRegistry::new();
        registry.register_fragment("a", "x{{b}}");
        registry.register_fragment("b", "y");
        assert_eq!(registry.expand("{{a}}", &no_local).unwrap(), "(?:x(?:y))");
    }

    #[test]
    fn test_expand_undefined() {
        let registry = PatternRegistry::new();
        assert_eq!(
            registry.expand("{{missing}}", &no_local),
            Err(ExpandError::Undefined("missing".to_string()))
        );
    }

    #[test]
    fn test_expand_recursive() {
        let mut registry = PatternRegistry::new();
        registry.register_fragment("loop", "a{{loop}}");
        assert!(matches!(
            registry.expand("{{loop}}", &no_local),
            Err(ExpandError::Recursive(_))
        ));
    }

    #[test]
    fn test_plain_pattern_untouched() {
        let registry = PatternRegistry::new();
        assert_eq!(registry.expand(r"a{2}", &no_local).unwrap(), r"a{2}");
    }

    #[test]
    fn test_dollar_tag_fragment() {
        let re = Regex::new(&format!("^{DOLLAR_TAG}$")).unwrap();
        assert!(re.is_match("$$"));
        assert!(re.is_match("$tag$"));
        assert!(re.is_match("$_x1$"));
        assert!(!re.is_match("$1$"));
    }
}
