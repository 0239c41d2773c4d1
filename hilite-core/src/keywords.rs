//! Keyword Classifier
//!
//! Maps bare words to token kinds using a grammar's keyword categories. Lookup honors the
//! grammar's case mode and a fixed precedence (the declaration order of [TokenKind]), so a
//! word listed under both `keyword` and `built_in` is always a keyword. Words found in no
//! category are generic identifiers and stay [TokenKind::Plain].

use crate::grammar::spec::KeywordList;
use crate::token::TokenKind;
use std::collections::{BTreeMap, HashMap};

/// Words too common across languages to say anything about which one is being read.
/// They still classify, they just score nothing unless given an explicit weight.
pub const COMMON_KEYWORDS: &[&str] = &[
    "of", "and", "for", "in", "not", "or", "if", "then", "parent", "list", "value",
];

/// A keyword hit only counts towards relevance this many times per distinct word.
pub const MAX_KEYWORD_HITS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordEntry {
    pub kind: TokenKind,
    pub relevance: u32,
}

/// A malformed `word|N` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadKeyword(pub String);

#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    case_insensitive: bool,
    entries: HashMap<String, KeywordEntry>,
}

impl KeywordClassifier {
    pub fn new(
        sets: &BTreeMap<TokenKind, KeywordList>,
        case_insensitive: bool,
    ) -> Result<Self, BadKeyword> {
        let mut entries = HashMap::new();

        // BTreeMap iterates in TokenKind order, which is the lookup precedence.
        for (kind, list) in sets {
            for raw in list.entries() {
                let (word, weight) = match raw.split_once('|') {
                    Some((word, weight)) => {
                        let weight = weight
                            .parse::<u32>()
                            .map_err(|_| BadKeyword(raw.to_string()))?;
                        (word, Some(weight))
                    }
                    None => (raw, None),
                };
                if word.is_empty() {
                    return Err(BadKeyword(raw.to_string()));
                }

                let key = normalize(word, case_insensitive);
                let relevance = weight.unwrap_or_else(|| default_relevance(&key));
                entries.entry(key).or_insert(KeywordEntry {
                    kind: *kind,
                    relevance,
                });
            }
        }

        Ok(Self {
            case_insensitive,
            entries,
        })
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look a word up. `None` means generic identifier.
    pub fn lookup(&self, word: &str) -> Option<KeywordEntry> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries
            .get(normalize(word, self.case_insensitive).as_str())
            .copied()
    }

    /// The kind for a word, [TokenKind::Plain] when it is not a keyword.
    pub fn classify(&self, word: &str) -> TokenKind {
        self.lookup(word)
            .map(|entry| entry.kind)
            .unwrap_or(TokenKind::Plain)
    }

    /// Key under which hits of `word` are counted.
    pub(crate) fn hit_key(&self, word: &str) -> String {
        normalize(word, self.case_insensitive)
    }
}

fn normalize(word: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        word.to_lowercase()
    } else {
        word.to_string()
    }
}

fn default_relevance(word: &str) -> u32 {
    if COMMON_KEYWORDS.contains(&word.to_lowercase().as_str()) {
        0
    } else {
        1
    }
}
