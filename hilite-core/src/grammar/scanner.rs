//! Combined terminator regex for one scope.
//!
//! A scope's nested rule begins, its end pattern and (at the root) the illegal pattern are
//! joined into one alternation, each alternative in its own named group. A forward search
//! from the cursor then returns the leftmost match; at equal start positions the regex
//! engine's leftmost-first semantics pick the earliest alternative, which is exactly rule
//! declaration order.

use regex::Regex;
use std::fmt::Write;
use std::ops::Range;

const GROUP_PREFIX: &str = "__hl";

/// What a scanner match stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hit {
    /// Index into the scope's nested rules.
    Rule(usize),
    End,
    Illegal,
}

#[derive(Debug, Clone)]
pub(crate) struct Alternative {
    pub pattern: String,
    pub case_insensitive: bool,
    pub hit: Hit,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Scanner {
    regex: Option<Regex>,
    /// Capture group index of each alternative.
    slots: Vec<(usize, Hit)>,
}

impl Scanner {
    pub fn build(alternatives: &[Alternative]) -> Result<Self, regex::Error> {
        if alternatives.is_empty() {
            return Ok(Self::default());
        }

        let mut source = String::from("(?mR)");
        for (n, alt) in alternatives.iter().enumerate() {
            if n > 0 {
                source.push('|');
            }
            // Writing to a String cannot fail.
            let _ = write!(
                source,
                "(?P<{GROUP_PREFIX}{n}>{}{}))",
                flag_group(alt.case_insensitive),
                alt.pattern
            );
        }

        let regex = Regex::new(&source)?;
        let slots = regex
            .capture_names()
            .enumerate()
            .filter_map(|(index, name)| {
                let n = name?.strip_prefix(GROUP_PREFIX)?.parse::<usize>().ok()?;
                alternatives.get(n).map(|alt| (index, alt.hit))
            })
            .collect();

        Ok(Self {
            regex: Some(regex),
            slots,
        })
    }

    /// Leftmost match at or after `at`. Context before `at` is visible to `\b` and `^`.
    pub fn find(&self, haystack: &str, at: usize) -> Option<(Hit, Range<usize>)> {
        let regex = self.regex.as_ref()?;
        let caps = regex.captures_at(haystack, at)?;
        let range = caps.get(0)?.range();
        self.slots
            .iter()
            .find(|(index, _)| caps.get(*index).is_some())
            .map(|(_, hit)| (*hit, range))
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }
}

/// Open a group carrying the case flag. Caller closes it.
pub(crate) fn flag_group(case_insensitive: bool) -> &'static str {
    if case_insensitive {
        "(?i:"
    } else {
        "(?:"
    }
}

/// Compile a single pattern with the same flags a scanner would apply.
pub(crate) fn compile_single(pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        "(?mR){}{})",
        flag_group(case_insensitive),
        pattern
    ))
}
