//! Grammar registry
//!
//! Holds compiled grammars and resolves a language identifier (name or alias, compared
//! case-insensitively) to one of them. The registry is also what the tokenizer consults to
//! resolve embedded sub-languages, so cross-grammar references are checked by
//! [GrammarRegistry::validate] once everything is registered.

use super::spec::GrammarSpec;
use super::Grammar;
use crate::bundled;
use crate::error::{GrammarError, TokenizeError};
use crate::matcher::{Tokens, TokenizerOptions};
use crate::patterns::PatternRegistry;
use crate::token::Highlight;
use log::debug;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug)]
pub struct GrammarRegistry {
    grammars: Vec<Grammar>,
    index: HashMap<String, usize>,
    patterns: PatternRegistry,
}

impl GrammarRegistry {
    /// An empty registry using the built-in pattern fragments and rules.
    pub fn new() -> Self {
        Self::with_patterns(PatternRegistry::with_builtins())
    }

    pub fn with_patterns(patterns: PatternRegistry) -> Self {
        GrammarRegistry {
            grammars: Vec::new(),
            index: HashMap::new(),
            patterns,
        }
    }

    /// A registry holding every bundled grammar, validated.
    pub fn with_builtins() -> Result<Self, GrammarError> {
        let mut registry = Self::new();
        for (file, source) in bundled::GRAMMARS {
            debug!("loading bundled grammar {file}");
            let spec = GrammarSpec::from_yaml_str(source)?;
            registry.register_spec(&spec)?;
        }
        registry.validate()?;
        Ok(registry)
    }

    pub fn patterns(&self) -> &PatternRegistry {
        &self.patterns
    }

    /// Mutable access for registering extra fragments or rules before compiling specs.
    pub fn patterns_mut(&mut self) -> &mut PatternRegistry {
        &mut self.patterns
    }

    /// Compile a spec against this registry's patterns and register it.
    pub fn register_spec(&mut self, spec: &GrammarSpec) -> Result<&Grammar, GrammarError> {
        let grammar = Grammar::compile_with(spec, &self.patterns)?;
        self.register(grammar)
    }

    /// Register a compiled grammar under its name and aliases.
    pub fn register(&mut self, grammar: Grammar) -> Result<&Grammar, GrammarError> {
        let mut keys: Vec<String> = Vec::with_capacity(grammar.aliases().len() + 1);
        for key in std::iter::once(grammar.name()).chain(grammar.aliases().iter().map(|a| a.as_str())) {
            let key = key.to_lowercase();
            if self.index.contains_key(&key) {
                return Err(GrammarError::DuplicateName(key));
            }
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        let slot = self.grammars.len();
        debug!(
            "registered grammar '{}' as {}",
            grammar.name(),
            keys.join(", ")
        );
        for key in keys {
            self.index.insert(key, slot);
        }
        self.grammars.push(grammar);
        Ok(&self.grammars[slot])
    }

    /// Load a grammar file (`.json`, otherwise YAML) and register it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&Grammar, GrammarError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| GrammarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let spec = if is_json {
            GrammarSpec::from_json_str(&source)?
        } else {
            GrammarSpec::from_yaml_str(&source)?
        };
        self.register_spec(&spec)
    }

    /// Check cross-grammar references: `superset_of` and embedded sub-languages.
    pub fn validate(&self) -> Result<(), GrammarError> {
        for grammar in &self.grammars {
            if let Some(target) = grammar.superset_of() {
                if self.get(target).is_none() {
                    return Err(GrammarError::UnknownSuperset {
                        grammar: grammar.name().to_string(),
                        target: target.to_string(),
                    });
                }
            }
            for target in grammar.sub_languages() {
                if self.get(target).is_none() {
                    return Err(GrammarError::UnknownSubLanguage {
                        grammar: grammar.name().to_string(),
                        target: target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Look a grammar up by name or alias.
    pub fn get(&self, language: &str) -> Option<&Grammar> {
        self.index
            .get(&language.to_lowercase())
            .map(|&slot| &self.grammars[slot])
    }

    pub fn has(&self, language: &str) -> bool {
        self.get(language).is_some()
    }

    /// Grammars in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Grammar> {
        self.grammars.iter()
    }

    /// Sorted grammar names (aliases excluded).
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.grammars.iter().map(|g| g.name()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }

    /// Lazily tokenize `text` as `language`, resolving sub-languages through this registry.
    pub fn tokens<'g, 't>(
        &'g self,
        language: &str,
        text: &'t str,
    ) -> Result<Tokens<'g, 't>, TokenizeError> {
        let grammar = self
            .get(language)
            .ok_or_else(|| TokenizeError::UnknownLanguage(language.to_string()))?;
        Ok(Tokens::new(grammar, text).with_registry(self))
    }

    pub fn tokenize<'t>(&self, language: &str, text: &'t str) -> Result<Highlight<'t>, TokenizeError> {
        self.tokenize_with(language, text, TokenizerOptions::default())
    }

    pub fn tokenize_with<'t>(
        &self,
        language: &str,
        text: &'t str,
        options: TokenizerOptions,
    ) -> Result<Highlight<'t>, TokenizeError> {
        Ok(self.tokens(language, text)?.with_options(options).into_highlight())
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}
