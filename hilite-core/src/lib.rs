//! # hilite
//!
//! Grammar-driven lexical tokenizer for syntax highlighting.
//!
//! A grammar is declarative data: keyword tables, named pattern fragments and an ordered
//! list of rules, some of which open nested scopes (strings, comments, function calls).
//! Grammars are compiled once and then tokenize any number of inputs into classified
//! spans that exactly cover the input.
//!
//! Layout
//!
//!     patterns    Shared regex fragments and reusable rules (numbers, strings, comments)
//!     grammar     Declarative specs, compilation, the registry of named grammars
//!     keywords    Word classification and relevance weights
//!     matcher     The tokenizer proper, a lazy iterator over tokens
//!     token       Token kinds, tokens and tokenization results
//!     formats     Serializations of tokenization results (tag, json, yaml)
//!     bundled     Grammars shipped with the library
//!
//! For test helpers, see the [testing module](testing).

pub mod bundled;
pub mod error;
pub mod formats;
pub mod grammar;
pub mod keywords;
pub mod matcher;
pub mod patterns;
pub mod testing;
pub mod token;

pub use error::{GrammarError, TokenizeError};
pub use formats::{FormatError, FormatRegistry, Formatter};
pub use grammar::spec::{FragmentSpec, GrammarSpec, KeywordList, RuleSpec};
pub use grammar::{Grammar, GrammarRegistry, Rule, RuleEnd};
pub use keywords::KeywordClassifier;
pub use matcher::{Outcome, Tokens, TokenizerOptions, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
pub use patterns::PatternRegistry;
pub use token::{Highlight, Token, TokenKind};
