//! Grammar definitions as plain data.
//!
//!     A grammar file is what a grammar author fills in: a name, aliases, a case mode,
//!     keyword categories and an ordered list of rules. The same structures can be built in
//!     Rust with the builder methods below, which is how the built-in pattern rules and most
//!     tests define grammars.
//!
//!     Example (YAML):
//!
//!         name: tiny-sql
//!         aliases: [tiny]
//!         case_insensitive: true
//!         keywords:
//!           keyword: SELECT FROM WHERE
//!           built_in: CURRENT_DATE|2
//!         rules:
//!           - include: single_quoted_string
//!           - label: number
//!             begin: '{{c_number}}'
//!             relevance: 0
//!
//!     Patterns may interpolate named fragments with `{{name}}`. Fragments come from the
//!     grammar's own `fragments` table first, then from the pattern registry.

use crate::error::GrammarError;
use crate::token::TokenKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative description of one grammar.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub case_insensitive: bool,
    /// Name of a grammar this one fully contains. Metadata for callers ranking grammars by
    /// relevance; tokenization ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superset_of: Option<String>,
    /// Pattern splitting plain text into candidate keywords. Defaults to `\w+`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_pattern: Option<String>,
    #[serde(default)]
    pub fragments: BTreeMap<String, FragmentSpec>,
    #[serde(default)]
    pub keywords: BTreeMap<TokenKind, KeywordList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illegal: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// A named pattern fragment: either a raw pattern or a word list joined into an alternation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FragmentSpec {
    Pattern(String),
    Words(Vec<String>),
}

impl FragmentSpec {
    /// The regex source for this fragment. Words are matched literally.
    pub fn to_pattern(&self) -> String {
        match self {
            FragmentSpec::Pattern(p) => p.clone(),
            FragmentSpec::Words(words) => words
                .iter()
                .map(|w| regex::escape(w.trim()))
                .collect::<Vec<_>>()
                .join("|"),
        }
    }
}

/// Keyword category contents. A string is split on whitespace; each entry may carry a
/// relevance weight as `word|N`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeywordList {
    Words(String),
    List(Vec<String>),
}

impl KeywordList {
    pub fn entries(&self) -> Vec<&str> {
        match self {
            KeywordList::Words(s) => s.split_whitespace().collect(),
            KeywordList::List(items) => items
                .iter()
                .flat_map(|s| s.split_whitespace())
                .collect(),
        }
    }
}

/// One lexical rule, or a reference to a named rule in the pattern registry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    /// Pull in a named rule from the pattern registry instead of defining one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    /// Token kind of the matched span. Unlabeled rules take the enclosing scope's kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<TokenKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Close on the exact literal text `begin` matched (dollar-quoted strings).
    #[serde(default)]
    pub end_same_as_begin: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contains: Vec<RuleSpec>,
    /// Overrides the grammar's case mode for this rule and its nested rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_insensitive: Option<bool>,
    /// Score added each time the rule begins. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<u32>,
    /// The begin delimiter belongs to the enclosing scope, not to this rule's token.
    #[serde(default)]
    pub exclude_begin: bool,
    /// The end delimiter belongs to the enclosing scope, not to this rule's token.
    #[serde(default)]
    pub exclude_end: bool,
    /// Tokenize the region between begin and end with another registered grammar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_language: Option<String>,
}

impl RuleSpec {
    pub fn new(begin: impl Into<String>) -> Self {
        RuleSpec {
            begin: Some(begin.into()),
            ..Default::default()
        }
    }

    pub fn include(name: impl Into<String>) -> Self {
        RuleSpec {
            include: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn label(mut self, kind: TokenKind) -> Self {
        self.label = Some(kind);
        self
    }

    pub fn end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn end_same_as_begin(mut self) -> Self {
        self.end_same_as_begin = true;
        self
    }

    pub fn contains(mut self, rule: RuleSpec) -> Self {
        self.contains.push(rule);
        self
    }

    pub fn case_insensitive(mut self, value: bool) -> Self {
        self.case_insensitive = Some(value);
        self
    }

    pub fn relevance(mut self, relevance: u32) -> Self {
        self.relevance = Some(relevance);
        self
    }

    pub fn exclude_begin(mut self) -> Self {
        self.exclude_begin = true;
        self
    }

    pub fn exclude_end(mut self) -> Self {
        self.exclude_end = true;
        self
    }

    pub fn sub_language(mut self, name: impl Into<String>) -> Self {
        self.sub_language = Some(name.into());
        self
    }
}

impl GrammarSpec {
    pub fn new(name: impl Into<String>) -> Self {
        GrammarSpec {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn case_insensitive(mut self, value: bool) -> Self {
        self.case_insensitive = value;
        self
    }

    pub fn superset_of(mut self, name: impl Into<String>) -> Self {
        self.superset_of = Some(name.into());
        self
    }

    pub fn fragment(mut self, name: impl Into<String>, fragment: FragmentSpec) -> Self {
        self.fragments.insert(name.into(), fragment);
        self
    }

    pub fn keywords(mut self, kind: TokenKind, words: impl Into<String>) -> Self {
        self.keywords.insert(kind, KeywordList::Words(words.into()));
        self
    }

    pub fn illegal(mut self, pattern: impl Into<String>) -> Self {
        self.illegal = Some(pattern.into());
        self
    }

    pub fn rule(mut self, rule: RuleSpec) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, GrammarError> {
        serde_yaml::from_str(source).map_err(|e| GrammarError::Parse(e.to_string()))
    }

    pub fn from_json_str(source: &str) -> Result<Self, GrammarError> {
        serde_json::from_str(source).map_err(|e| GrammarError::Parse(e.to_string()))
    }
}
