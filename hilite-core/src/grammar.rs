//! Grammar Table
//!
//!     A grammar is compiled once from its declarative [GrammarSpec] and is immutable from
//!     then on, so one compiled grammar can serve any number of tokenizations, on any number
//!     of threads.
//!
//!     Compilation resolves `include` references and `{{fragment}}` interpolations against
//!     the [PatternRegistry], validates every pattern, and precomputes one combined scanner
//!     per scope (see [scanner]). Anything wrong with a grammar surfaces here as a
//!     [GrammarError], never halfway through tokenizing some input.
//!
//!     Rule order is significant: at the earliest match position the first declared rule
//!     wins. Keyword lookup only runs on root-scope text no rule claimed, so any rule beats
//!     a keyword at the same spot.

pub mod registry;
pub(crate) mod scanner;
pub mod spec;

use crate::error::GrammarError;
use crate::keywords::KeywordClassifier;
use crate::matcher::{Tokens, TokenizerOptions};
use crate::patterns::{ExpandError, PatternRegistry};
use crate::token::{Highlight, TokenKind};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scanner::{Alternative, Hit, Scanner};
use spec::{GrammarSpec, RuleSpec};

pub use registry::GrammarRegistry;

static DEFAULT_KEYWORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Included rules may include further rules, up to this depth.
const MAX_INCLUDE_NESTING: usize = 8;

/// How a rule ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleEnd {
    /// The rule is a single match.
    None,
    /// The rule opens a scope closed by this pattern.
    Pattern(String),
    /// The rule opens a scope closed only by the literal text its begin matched.
    SameAsBegin,
}

/// A compiled rule.
#[derive(Debug)]
pub struct Rule {
    pub(crate) kind: Option<TokenKind>,
    pub(crate) begin: String,
    pub(crate) end: RuleEnd,
    /// Standalone end matcher, used to delimit embedded sub-language regions.
    pub(crate) end_regex: Option<Regex>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) scanner: Scanner,
    pub(crate) case_insensitive: bool,
    pub(crate) relevance: u32,
    pub(crate) exclude_begin: bool,
    pub(crate) exclude_end: bool,
    pub(crate) sub_language: Option<String>,
}

impl Rule {
    pub fn kind(&self) -> Option<TokenKind> {
        self.kind
    }

    /// Begin pattern with fragments expanded.
    pub fn begin(&self) -> &str {
        &self.begin
    }

    pub fn end(&self) -> &RuleEnd {
        &self.end
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn relevance(&self) -> u32 {
        self.relevance
    }

    pub fn sub_language(&self) -> Option<&str> {
        self.sub_language.as_deref()
    }

    pub(crate) fn opens_scope(&self) -> bool {
        self.end != RuleEnd::None
    }
}

/// A compiled grammar.
#[derive(Debug)]
pub struct Grammar {
    name: String,
    aliases: Vec<String>,
    category: Option<String>,
    case_insensitive: bool,
    superset_of: Option<String>,
    pub(crate) keywords: KeywordClassifier,
    pub(crate) keyword_pattern: Regex,
    pub(crate) rules: Vec<Rule>,
    pub(crate) scanner: Scanner,
}

impl Grammar {
    /// Compile against the built-in pattern registry.
    pub fn compile(spec: &GrammarSpec) -> Result<Self, GrammarError> {
        Self::compile_with(spec, PatternRegistry::builtin())
    }

    pub fn compile_with(
        spec: &GrammarSpec,
        patterns: &PatternRegistry,
    ) -> Result<Self, GrammarError> {
        if spec.name.trim().is_empty() {
            return Err(GrammarError::EmptyName);
        }

        let compiler = Compiler { spec, patterns };

        let keywords = KeywordClassifier::new(&spec.keywords, spec.case_insensitive)
            .map_err(|bad| {
                GrammarError::malformed(
                    &spec.name,
                    "keywords",
                    format!("has malformed entry '{}'", bad.0),
                )
            })?;

        let keyword_pattern = match &spec.keyword_pattern {
            Some(pattern) => {
                let expanded = compiler.expand(pattern)?;
                Regex::new(&expanded)
                    .map_err(|e| GrammarError::invalid_pattern(&spec.name, &expanded, e))?
            }
            None => DEFAULT_KEYWORD_PATTERN.clone(),
        };

        let rules = spec
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| compiler.rule(rule, &format!("rules[{i}]"), spec.case_insensitive, 0))
            .collect::<Result<Vec<_>, _>>()?;

        let mut alternatives = begin_alternatives(&rules);
        if let Some(illegal) = &spec.illegal {
            let expanded = compiler.expand(illegal)?;
            compiler.check(&expanded, spec.case_insensitive)?;
            alternatives.push(Alternative {
                pattern: expanded,
                case_insensitive: spec.case_insensitive,
                hit: Hit::Illegal,
            });
        }
        let scanner = Scanner::build(&alternatives)
            .map_err(|e| GrammarError::invalid_pattern(&spec.name, "<root scanner>", e))?;

        debug!(
            "compiled grammar '{}' ({} rules, {} keywords)",
            spec.name,
            rules.len(),
            keywords.len()
        );

        Ok(Grammar {
            name: spec.name.clone(),
            aliases: spec.aliases.clone(),
            category: spec.category.clone(),
            case_insensitive: spec.case_insensitive,
            superset_of: spec.superset_of.clone(),
            keywords,
            keyword_pattern,
            rules,
            scanner,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn superset_of(&self) -> Option<&str> {
        self.superset_of.as_deref()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn keywords(&self) -> &KeywordClassifier {
        &self.keywords
    }

    /// Every sub-language named anywhere in the rule tree, deduplicated.
    pub fn sub_languages(&self) -> Vec<&str> {
        fn walk<'a>(rules: &'a [Rule], out: &mut Vec<&'a str>) {
            for rule in rules {
                if let Some(name) = rule.sub_language.as_deref() {
                    if !out.contains(&name) {
                        out.push(name);
                    }
                }
                walk(&rule.rules, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.rules, &mut out);
        out
    }

    /// Lazily tokenize `text`. Sub-languages cannot be resolved without a registry and are
    /// left as text of their enclosing rule; see [GrammarRegistry::tokens].
    pub fn tokens<'g, 't>(&'g self, text: &'t str) -> Tokens<'g, 't> {
        Tokens::new(self, text)
    }

    pub fn tokenize<'t>(&self, text: &'t str) -> Highlight<'t> {
        self.tokens(text).into_highlight()
    }

    pub fn tokenize_with<'t>(&self, text: &'t str, options: TokenizerOptions) -> Highlight<'t> {
        self.tokens(text).with_options(options).into_highlight()
    }
}

fn begin_alternatives(rules: &[Rule]) -> Vec<Alternative> {
    rules
        .iter()
        .enumerate()
        .map(|(i, rule)| Alternative {
            pattern: rule.begin.clone(),
            case_insensitive: rule.case_insensitive,
            hit: Hit::Rule(i),
        })
        .collect()
}

struct Compiler<'a> {
    spec: &'a GrammarSpec,
    patterns: &'a PatternRegistry,
}

impl Compiler<'_> {
    fn grammar(&self) -> &str {
        &self.spec.name
    }

    fn expand(&self, pattern: &str) -> Result<String, GrammarError> {
        let local = |name: &str| self.spec.fragments.get(name).map(|f| f.to_pattern());
        self.patterns
            .expand(pattern, &local)
            .map_err(|e| match e {
                ExpandError::Undefined(name) => GrammarError::UndefinedFragment {
                    grammar: self.grammar().to_string(),
                    name,
                },
                ExpandError::Recursive(name) => GrammarError::RecursiveFragment {
                    grammar: self.grammar().to_string(),
                    name,
                },
            })
    }

    fn check(&self, pattern: &str, case_insensitive: bool) -> Result<Regex, GrammarError> {
        scanner::compile_single(pattern, case_insensitive)
            .map_err(|e| GrammarError::invalid_pattern(self.grammar(), pattern, e))
    }

    fn rule(
        &self,
        spec: &RuleSpec,
        path: &str,
        inherited_case: bool,
        include_nesting: usize,
    ) -> Result<Rule, GrammarError> {
        if let Some(name) = &spec.include {
            let inline = RuleSpec {
                include: None,
                ..spec.clone()
            };
            if inline != RuleSpec::default() {
                return Err(GrammarError::malformed(
                    self.grammar(),
                    path,
                    "mixes `include` with an inline definition",
                ));
            }
            if include_nesting >= MAX_INCLUDE_NESTING {
                return Err(GrammarError::malformed(
                    self.grammar(),
                    path,
                    format!("includes '{name}' too deeply"),
                ));
            }
            let included = self
                .patterns
                .rule(name)
                .ok_or_else(|| GrammarError::UndefinedRule {
                    grammar: self.grammar().to_string(),
                    name: name.clone(),
                })?;
            return self.rule(included, path, inherited_case, include_nesting + 1);
        }

        let begin = spec
            .begin
            .as_deref()
            .ok_or_else(|| GrammarError::malformed(self.grammar(), path, "has no begin pattern"))?;
        let begin = self.expand(begin)?;
        if begin.is_empty() {
            return Err(GrammarError::malformed(
                self.grammar(),
                path,
                "has an empty begin pattern",
            ));
        }

        let end = match (&spec.end, spec.end_same_as_begin) {
            (Some(_), true) => {
                return Err(GrammarError::malformed(
                    self.grammar(),
                    path,
                    "sets both `end` and `end_same_as_begin`",
                ))
            }
            (Some(end), false) => RuleEnd::Pattern(self.expand(end)?),
            (None, true) => RuleEnd::SameAsBegin,
            (None, false) => RuleEnd::None,
        };

        if end == RuleEnd::None && !spec.contains.is_empty() {
            return Err(GrammarError::malformed(
                self.grammar(),
                path,
                "has nested rules but no end",
            ));
        }
        if end == RuleEnd::None && spec.sub_language.is_some() {
            return Err(GrammarError::malformed(
                self.grammar(),
                path,
                "embeds a sub-language but has no end",
            ));
        }

        let case_insensitive = spec.case_insensitive.unwrap_or(inherited_case);
        self.check(&begin, case_insensitive)?;
        let end_regex = match &end {
            RuleEnd::Pattern(p) => Some(self.check(p, case_insensitive)?),
            _ => None,
        };

        let rules = spec
            .contains
            .iter()
            .enumerate()
            .map(|(i, child)| {
                self.rule(
                    child,
                    &format!("{path}.contains[{i}]"),
                    case_insensitive,
                    include_nesting,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let scanner = if end == RuleEnd::None {
            Scanner::default()
        } else {
            let mut alternatives = begin_alternatives(&rules);
            if let RuleEnd::Pattern(p) = &end {
                alternatives.push(Alternative {
                    pattern: p.clone(),
                    case_insensitive,
                    hit: Hit::End,
                });
            }
            Scanner::build(&alternatives)
                .map_err(|e| GrammarError::invalid_pattern(self.grammar(), path, e))?
        };

        Ok(Rule {
            kind: spec.label,
            begin,
            end,
            end_regex,
            rules,
            scanner,
            case_insensitive,
            relevance: spec.relevance.unwrap_or(1),
            exclude_begin: spec.exclude_begin,
            exclude_end: spec.exclude_end,
            sub_language: spec.sub_language.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::spec::FragmentSpec;

    #[test]
    fn test_compile_resolves_includes_and_fragments() {
        let spec = GrammarSpec::new("g")
            .fragment("fns", FragmentSpec::Words(vec!["trim".into(), "upper".into()]))
            .rule(RuleSpec::include("c_number"))
            .rule(
                RuleSpec::new(r"\b({{fns}})\s*\(")
                    .end(r"\)")
                    .label(TokenKind::BuiltIn),
            );
        let grammar = Grammar::compile(&spec).unwrap();
        assert_eq!(grammar.rules().len(), 2);
        assert_eq!(grammar.rules()[0].kind(), Some(TokenKind::Number));
        assert_eq!(grammar.rules()[0].relevance(), 0);
        assert_eq!(grammar.rules()[1].begin(), r"\b((?:trim|upper))\s*\(");
        assert_eq!(grammar.rules()[1].end(), &RuleEnd::Pattern(r"\)".to_string()));
    }

    #[test]
    fn test_case_mode_is_inherited_and_overridable() {
        let spec = GrammarSpec::new("g").case_insensitive(true).rule(
            RuleSpec::new("'")
                .end("'")
                .contains(RuleSpec::new("x"))
                .contains(RuleSpec::new("y").case_insensitive(false)),
        );
        let grammar = Grammar::compile(&spec).unwrap();
        let string = &grammar.rules()[0];
        assert!(string.case_insensitive());
        assert!(string.rules()[0].case_insensitive());
        assert!(!string.rules()[1].case_insensitive());
    }

    #[test]
    fn test_undefined_fragment_fails_at_load() {
        let spec = GrammarSpec::new("g").rule(RuleSpec::new("{{nope}}"));
        let err = Grammar::compile(&spec).unwrap_err();
        assert!(matches!(err, GrammarError::UndefinedFragment { ref name, .. } if name == "nope"));
    }

    #[test]
    fn test_undefined_include_fails_at_load() {
        let spec = GrammarSpec::new("g").rule(RuleSpec::include("nope"));
        let err = Grammar::compile(&spec).unwrap_err();
        assert!(matches!(err, GrammarError::UndefinedRule { ref name, .. } if name == "nope"));
    }

    #[test]
    fn test_invalid_regex_fails_at_load() {
        let spec = GrammarSpec::new("g").rule(RuleSpec::new("(unclosed"));
        let err = Grammar::compile(&spec).unwrap_err();
        assert!(matches!(err, GrammarError::InvalidPattern { .. }));
    }

    #[test]
    fn test_conflicting_end_fails_at_load() {
        let spec = GrammarSpec::new("g").rule(RuleSpec::new("a").end("b").end_same_as_begin());
        let err = Grammar::compile(&spec).unwrap_err();
        assert_eq!(
            err.to_string(),
            "grammar 'g': rule rules[0] sets both `end` and `end_same_as_begin`"
        );
    }

    #[test]
    fn test_nested_rules_need_an_end() {
        let spec = GrammarSpec::new("g").rule(RuleSpec::new("a").contains(RuleSpec::new("b")));
        let err = Grammar::compile(&spec).unwrap_err();
        assert!(err.to_string().contains("has nested rules but no end"));
    }

    #[test]
    fn test_include_with_inline_fields_is_rejected() {
        let mut rule = RuleSpec::include("c_number");
        rule.begin = Some("x".to_string());
        let err = Grammar::compile(&GrammarSpec::new("g").rule(rule)).unwrap_err();
        assert!(err.to_string().contains("mixes `include`"));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        assert!(matches!(
            Grammar::compile(&GrammarSpec::new("  ")),
            Err(GrammarError::EmptyName)
        ));
    }

    #[test]
    fn test_malformed_keyword_weight() {
        let spec = GrammarSpec::new("g").keywords(TokenKind::Keyword, "SELECT|high");
        let err = Grammar::compile(&spec).unwrap_err();
        assert!(err.to_string().contains("SELECT|high"));
    }

    #[test]
    fn test_sub_languages_are_collected() {
        let spec = GrammarSpec::new("g")
            .rule(RuleSpec::new(r"\$\$").end_same_as_begin().sub_language("sql"))
            .rule(
                RuleSpec::new("<")
                    .end(">")
                    .contains(RuleSpec::new("!").end("!").sub_language("json"))
                    .sub_language("sql"),
            );
        let grammar = Grammar::compile(&spec).unwrap();
        assert_eq!(grammar.sub_languages(), vec!["sql", "json"]);
    }

    #[test]
    fn test_grammar_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Grammar>();
    }
}
