//! Core Matcher
//!
//!     [Tokens] walks an input text against a compiled [Grammar] and yields classified
//!     spans covering the whole input. It is a plain iterator: lazy, finite and
//!     single-pass. Nothing is shared between two tokenizations besides the immutable
//!     grammar, so any number of them can run side by side.
//!
//! Scanning
//!
//!     The matcher keeps a cursor and a stack of open scopes (rules with an end). At each
//!     step the current scope's scanner searches forward from the cursor for the leftmost of:
//!     a nested rule's begin, the scope's end, or (root only) the grammar's illegal pattern.
//!     Text skipped over belongs to the current scope; in the root scope it is split into
//!     words and run through the keyword classifier.
//!
//!     Scopes opened with `end_same_as_begin` are closed by the literal text their begin
//!     matched, so `$a$` is never closed by `$b$`.
//!
//! Token granularity
//!
//!     A labeled scope produces one token holding its delimiters, its own text and the text
//!     of unlabeled nested matches. Labeled nested matches split it and produce tokens of
//!     their own. Unlabeled rules never split anything: their text joins whatever token the
//!     enclosing scope is building.
//!
//! Degenerate input
//!
//!     Begin matches of zero width are skipped. A scope still open at end of input ends
//!     there and the result is flagged incomplete. Past `max_depth` nested scopes are not
//!     entered and embedded sub-languages are not tokenized.

use crate::grammar::scanner::Hit;
use crate::grammar::{Grammar, GrammarRegistry, Rule, RuleEnd};
use crate::keywords::MAX_KEYWORD_HITS;
use crate::token::{Highlight, Token, TokenKind};
use log::{debug, trace, warn};
use std::collections::{HashMap, VecDeque};
use std::iter::FusedIterator;
use std::ops::Range;

pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Hard ceiling on `max_depth`. Embedded sub-languages recurse on the call stack, so larger
/// settings are clamped to this.
pub const MAX_DEPTH_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Maximum nesting of open scopes plus embedded sub-languages, at most [MAX_DEPTH_LIMIT].
    pub max_depth: usize,
}

impl TokenizerOptions {
    /// The depth cap actually enforced.
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.min(MAX_DEPTH_LIMIT)
    }
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        TokenizerOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Score and diagnostics gathered so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub relevance: u32,
    pub incomplete: bool,
    pub illegal: bool,
    pub depth_limited: bool,
}

struct Frame<'g> {
    rule: &'g Rule,
    /// Kind of the scope's own text: the rule's label or the enclosing kind.
    kind: TokenKind,
    /// Literal closing delimiter for `end_same_as_begin` scopes.
    close: Option<String>,
}

/// Coalesces adjacent same-kind text into tokens and queues finished ones.
#[derive(Debug, Default)]
struct Emitter {
    open: Option<(TokenKind, Range<usize>)>,
    ready: VecDeque<(TokenKind, Range<usize>)>,
}

impl Emitter {
    /// Append text, extending the open token when kinds match.
    fn text(&mut self, kind: TokenKind, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        match &mut self.open {
            Some((open_kind, open_range)) if *open_kind == kind && open_range.end == range.start => {
                open_range.end = range.end;
            }
            _ => {
                self.flush();
                self.open = Some((kind, range));
            }
        }
    }

    /// Emit a token that never merges with its neighbours.
    fn atom(&mut self, kind: TokenKind, range: Range<usize>) {
        self.flush();
        if !range.is_empty() {
            self.ready.push_back((kind, range));
        }
    }

    fn flush(&mut self) {
        if let Some(token) = self.open.take() {
            self.ready.push_back(token);
        }
    }

    fn pop(&mut self) -> Option<(TokenKind, Range<usize>)> {
        self.ready.pop_front()
    }
}

/// Lazy token sequence for one input.
pub struct Tokens<'g, 't> {
    grammar: &'g Grammar,
    registry: Option<&'g GrammarRegistry>,
    options: TokenizerOptions,
    text: &'t str,
    /// Exclusive end of the region being tokenized.
    end: usize,
    /// Where the next search starts.
    cursor: usize,
    /// Start of scope text not yet handed to the emitter.
    gap: usize,
    /// Nesting already in effect when this sequence started (embedded regions).
    base_depth: usize,
    stack: Vec<Frame<'g>>,
    emitter: Emitter,
    outcome: Outcome,
    keyword_hits: HashMap<String, u32>,
    done: bool,
}

impl<'g, 't> Tokens<'g, 't> {
    pub fn new(grammar: &'g Grammar, text: &'t str) -> Self {
        Self::region(grammar, None, TokenizerOptions::default(), text, 0..text.len(), 0)
    }

    fn region(
        grammar: &'g Grammar,
        registry: Option<&'g GrammarRegistry>,
        options: TokenizerOptions,
        text: &'t str,
        range: Range<usize>,
        base_depth: usize,
    ) -> Self {
        Tokens {
            grammar,
            registry,
            options,
            text,
            end: range.end,
            cursor: range.start,
            gap: range.start,
            base_depth,
            stack: Vec::new(),
            emitter: Emitter::default(),
            outcome: Outcome::default(),
            keyword_hits: HashMap::new(),
            done: false,
        }
    }

    /// Resolve embedded sub-languages through `registry`.
    pub fn with_registry(mut self, registry: &'g GrammarRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_options(mut self, options: TokenizerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Score and flags for the tokens produced so far. Final once the iterator is exhausted.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Drain the remaining tokens into a [Highlight].
    pub fn into_highlight(mut self) -> Highlight<'t> {
        let tokens: Vec<_> = self.by_ref().collect();
        Highlight {
            language: self.grammar.name().to_string(),
            tokens,
            relevance: self.outcome.relevance,
            incomplete: self.outcome.incomplete,
            illegal: self.outcome.illegal,
            depth_limited: self.outcome.depth_limited,
        }
    }

    fn depth(&self) -> usize {
        self.base_depth + self.stack.len()
    }

    fn scope_kind(&self) -> TokenKind {
        self.stack
            .last()
            .map(|frame| frame.kind)
            .unwrap_or(TokenKind::Plain)
    }

    fn scope_rules(&self) -> &'g [Rule] {
        match self.stack.last() {
            Some(frame) => &frame.rule.rules,
            None => &self.grammar.rules,
        }
    }

    /// One scanner step: find the next terminator and act on it.
    fn step(&mut self) {
        match self.next_hit() {
            None => self.finish(),
            Some((Hit::Rule(index), range)) => {
                let rule = &self.scope_rules()[index];
                self.begin(rule, range);
            }
            Some((Hit::End, range)) => self.close_scope(range),
            Some((Hit::Illegal, range)) => self.illegal(range),
        }
    }

    fn next_hit(&self) -> Option<(Hit, Range<usize>)> {
        let hay = &self.text[..self.end];
        let (scanner, close) = match self.stack.last() {
            Some(frame) => (&frame.rule.scanner, frame.close.as_deref()),
            None => (&self.grammar.scanner, None),
        };

        let found = scanner.find(hay, self.cursor);
        let literal = close.and_then(|close| {
            hay[self.cursor..]
                .find(close)
                .map(|at| self.cursor + at..self.cursor + at + close.len())
        });

        match (found, literal) {
            // Nested rules come before the end, so they win ties at the same position.
            (Some(found), Some(literal)) if found.1.start <= literal.start => Some(found),
            (_, Some(literal)) => Some((Hit::End, literal)),
            (found, None) => found,
        }
    }

    fn begin(&mut self, rule: &'g Rule, range: Range<usize>) {
        if range.is_empty() {
            trace!("skipping empty begin match at {}", range.start);
            self.skip_char(range.start);
            return;
        }

        if rule.opens_scope() && self.depth() >= self.options.effective_max_depth() {
            if !self.outcome.depth_limited {
                warn!(
                    "'{}': nesting depth {} reached at byte {}, not entering nested rules",
                    self.grammar.name(),
                    self.options.effective_max_depth(),
                    range.start
                );
            }
            self.outcome.depth_limited = true;
            // The begin text stays part of the current scope's pending text.
            self.cursor = range.end;
            return;
        }

        self.flush_gap(range.start);
        self.outcome.relevance += rule.relevance;
        let parent = self.scope_kind();

        if !rule.opens_scope() {
            match rule.kind {
                Some(kind) => self.emitter.atom(kind, range.clone()),
                None => self.emitter.text(parent, range.clone()),
            }
            self.advance_to(range.end);
            return;
        }

        let kind = rule.kind.unwrap_or(parent);
        if rule.exclude_begin {
            self.emitter.text(parent, range.clone());
        }
        if rule.kind.is_some() {
            self.emitter.flush();
        }
        if !rule.exclude_begin {
            self.emitter.text(kind, range.clone());
        }

        let close = match rule.end {
            RuleEnd::SameAsBegin => Some(self.text[range.clone()].to_string()),
            _ => None,
        };
        trace!("open scope {:?} at {}", kind, range.start);
        self.stack.push(Frame { rule, kind, close });
        self.advance_to(range.end);

        if let Some(language) = rule.sub_language.as_deref() {
            self.embed(language);
        }
    }

    /// Tokenize the body of the scope just opened with another grammar, then close it.
    fn embed(&mut self, language: &str) {
        let Some(frame) = self.stack.last() else {
            return;
        };
        let kind = frame.kind;
        let text = self.text;
        let hay = &text[..self.end];

        let closing = match frame.close.as_deref() {
            Some(close) => hay[self.cursor..]
                .find(close)
                .map(|at| self.cursor + at..self.cursor + at + close.len()),
            None => frame
                .rule
                .end_regex
                .as_ref()
                .and_then(|re| re.find_at(hay, self.cursor))
                .map(|m| m.range()),
        };
        let body = self.cursor..closing.as_ref().map_or(self.end, |c| c.start);

        let sub = self.registry.and_then(|registry| registry.get(language));
        match sub {
            Some(grammar)
                if !body.is_empty() && self.depth() < self.options.effective_max_depth() =>
            {
                let mut inner = Tokens::region(
                    grammar,
                    self.registry,
                    self.options,
                    self.text,
                    body.clone(),
                    self.depth(),
                );
                for token in inner.by_ref() {
                    if token.is_plain() || token.kind == kind {
                        self.emitter.text(kind, token.range);
                    } else {
                        self.emitter.atom(token.kind, token.range);
                    }
                }
                let inner = inner.outcome();
                self.outcome.relevance += inner.relevance;
                self.outcome.depth_limited |= inner.depth_limited;
            }
            Some(_) if !body.is_empty() => {
                if !self.outcome.depth_limited {
                    warn!(
                        "'{}': nesting depth {} reached, '{}' region left untokenized",
                        self.grammar.name(),
                        self.options.effective_max_depth(),
                        language
                    );
                }
                self.outcome.depth_limited = true;
                self.emitter.text(kind, body.clone());
            }
            Some(_) => {}
            None => {
                debug!("sub-language '{language}' is not available, keeping region as text");
                self.emitter.text(kind, body.clone());
            }
        }
        self.advance_to(body.end);

        if let Some(closing) = closing {
            self.close_scope(closing);
        }
    }

    fn close_scope(&mut self, range: Range<usize>) {
        self.flush_gap(range.start);
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let labeled = frame.rule.kind.is_some();
        let parent = self.scope_kind();

        if frame.rule.exclude_end {
            if labeled {
                self.emitter.flush();
            }
            self.emitter.text(parent, range.clone());
        } else {
            self.emitter.text(frame.kind, range.clone());
            if labeled {
                self.emitter.flush();
            }
        }
        trace!("close scope {:?} at {}", frame.kind, range.end);
        self.advance_to(range.end);
    }

    fn illegal(&mut self, range: Range<usize>) {
        if range.is_empty() {
            self.skip_char(range.start);
            return;
        }
        if !self.outcome.illegal {
            debug!(
                "'{}': illegal match {:?} at byte {}",
                self.grammar.name(),
                &self.text[range.clone()],
                range.start
            );
        }
        self.flush_gap(range.start);
        self.outcome.illegal = true;
        self.emitter.text(TokenKind::Plain, range.clone());
        self.advance_to(range.end);
    }

    fn advance_to(&mut self, at: usize) {
        self.cursor = at;
        self.gap = at;
    }

    /// Move the search past one character without consuming it as a token.
    fn skip_char(&mut self, at: usize) {
        match self.text[at..self.end].chars().next() {
            Some(c) => self.cursor = at + c.len_utf8(),
            None => self.finish(),
        }
    }

    /// Hand pending scope text up to `until` to the emitter.
    fn flush_gap(&mut self, until: usize) {
        if self.gap >= until {
            return;
        }
        let range = self.gap..until;
        if self.stack.is_empty() {
            self.classify(range);
        } else {
            let kind = self.scope_kind();
            self.emitter.text(kind, range);
        }
        self.gap = until;
    }

    /// Split root text into words and classify them.
    fn classify(&mut self, range: Range<usize>) {
        let text = self.text;
        let hay = &text[..range.end];
        let mut plain_from = range.start;
        let mut at = range.start;

        while at < range.end {
            let Some(word) = self.grammar.keyword_pattern.find_at(hay, at) else {
                break;
            };
            if word.is_empty() {
                match hay[word.end()..].chars().next() {
                    Some(c) => at = word.end() + c.len_utf8(),
                    None => break,
                }
                continue;
            }
            if let Some(entry) = self.grammar.keywords.lookup(word.as_str()) {
                self.emitter.text(TokenKind::Plain, plain_from..word.start());
                self.emitter.atom(entry.kind, word.range());
                self.count_keyword(word.as_str(), entry.relevance);
                plain_from = word.end();
            }
            at = word.end();
        }

        self.emitter.text(TokenKind::Plain, plain_from..range.end);
    }

    fn count_keyword(&mut self, word: &str, relevance: u32) {
        let hits = self
            .keyword_hits
            .entry(self.grammar.keywords.hit_key(word))
            .or_insert(0);
        *hits += 1;
        if *hits <= MAX_KEYWORD_HITS {
            self.outcome.relevance += relevance;
        }
    }

    fn finish(&mut self) {
        if self.done {
            return;
        }
        self.flush_gap(self.end);
        if !self.stack.is_empty() {
            debug!(
                "'{}': {} scope(s) still open at end of input",
                self.grammar.name(),
                self.stack.len()
            );
            self.outcome.incomplete = true;
            self.stack.clear();
        }
        self.emitter.flush();
        self.cursor = self.end;
        self.done = true;
    }
}

impl<'t> Iterator for Tokens<'_, 't> {
    type Item = Token<'t>;

    fn next(&mut self) -> Option<Token<'t>> {
        loop {
            if let Some((kind, range)) = self.emitter.pop() {
                let text = self.text;
                return Some(Token::new(kind, &text[range.clone()], range));
            }
            if self.done {
                return None;
            }
            self.step();
        }
    }
}

impl FusedIterator for Tokens<'_, '_> {}
