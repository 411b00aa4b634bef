//! Sliding-window keyword matcher.
//!
//! The scanner keeps a FIFO window of the last `N` lower-cased tokens,
//! where `N` is the word count of the longest keyword phrase in the
//! catalog. Each time the window is full it is rendered as a
//! space-padded string (`" t1 t2 t3 "`) and every candidate phrase is
//! tested as a space-bounded substring, so phrases match whole words
//! anywhere inside the window.
//!
//! ```text
//!  tokens:  ... the  food  insecurity  rate  fell ...
//!                  └──────── window (N = 3) ───┘
//!  padded:  " food insecurity rate "
//!  phrase:  " food insecurity "        ──► hit at absolute token 1
//! ```
//!
//! A phrase occurrence stays inside the window for several slides; hits
//! are keyed by absolute token offset so each occurrence is counted once.

use std::collections::hash_map::{self, HashMap};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use logframe_config::ScanConfig;
use tracing::debug;

use crate::keywords::KeywordPhrase;
use crate::model::{Indicator, IndicatorId};
use crate::progress::ProgressTracker;
use crate::tokenize;

/// Errors from a document scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan cancelled")]
    Cancelled,
}

/// Scan tuning taken from `[scan]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Maximum number of single-point progress ticks for one scan.
    pub budget_percent: u8,
    /// Progress points for each setup step around the scan.
    pub small_task_percent: u8,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            budget_percent: config.budget_percent,
            small_task_percent: config.small_task_percent,
        }
    }
}

/// Cooperative cancellation flag shared between a scan and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Word count of the longest keyword phrase across `indicators`, at least 1.
pub fn max_phrase_words(indicators: &[Indicator]) -> usize {
    indicators
        .iter()
        .map(Indicator::longest_phrase_words)
        .max()
        .unwrap_or(0)
        .max(1)
}

/// A matched indicator and its occurrence count.
#[derive(Debug, Clone, Copy)]
pub struct MatchEntry<'c> {
    pub indicator: &'c Indicator,
    pub count: u32,
}

/// Scan-scoped accumulator keyed by indicator id.
///
/// Borrows the catalog snapshot; the catalog entities themselves are
/// never mutated.
#[derive(Debug, Default)]
pub struct MatchMap<'c> {
    entries: HashMap<IndicatorId, MatchEntry<'c>>,
}

impl<'c> MatchMap<'c> {
    /// Record one hit for `indicator`.
    pub fn record(&mut self, indicator: &'c Indicator) {
        match self.entries.entry(indicator.id) {
            hash_map::Entry::Occupied(mut e) => {
                let entry = e.get_mut();
                entry.count = entry.count.saturating_add(1);
            }
            hash_map::Entry::Vacant(e) => {
                e.insert(MatchEntry {
                    indicator,
                    count: 1,
                });
            }
        }
    }

    pub fn get(&self, id: IndicatorId) -> Option<&MatchEntry<'c>> {
        self.entries.get(&id)
    }

    /// Hit count for `id`, 0 when it never matched.
    pub fn count(&self, id: IndicatorId) -> u32 {
        self.get(id).map_or(0, |e| e.count)
    }

    pub fn contains(&self, id: IndicatorId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchEntry<'c>> {
        self.entries.values()
    }

    /// Consume the map. Order is unspecified; see [`crate::rank`].
    pub fn into_entries(self) -> Vec<MatchEntry<'c>> {
        self.entries.into_values().collect()
    }
}

/// Fixed-capacity FIFO of lower-cased tokens.
#[derive(Debug)]
struct Window {
    tokens: VecDeque<String>,
    capacity: usize,
    /// Absolute token index of the front of the window.
    start: usize,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self {
            tokens: VecDeque::with_capacity(capacity),
            capacity,
            start: 0,
        }
    }

    /// Append a token, evicting the oldest when full.
    fn push(&mut self, token: &str) {
        if self.tokens.len() == self.capacity {
            self.tokens.pop_front();
            self.start += 1;
        }
        self.tokens.push_back(token.to_lowercase());
    }

    fn is_full(&self) -> bool {
        self.tokens.len() == self.capacity
    }

    fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn write_padded(&self, out: &mut String) {
        out.clear();
        out.push(' ');
        for token in &self.tokens {
            out.push_str(token);
            out.push(' ');
        }
    }

    /// Absolute offsets at which `phrase` starts inside the window.
    fn occurrences<'w>(&'w self, phrase: &'w KeywordPhrase) -> impl Iterator<Item = usize> + 'w {
        let len = phrase.len();
        let last = self.tokens.len().saturating_sub(len);
        (0..=last)
            .filter(move |&i| {
                i + len <= self.tokens.len()
                    && self.tokens.iter().skip(i).take(len).eq(phrase.words().iter())
            })
            .map(move |i| self.start + i)
    }
}

/// Number of window tests a document of `tokens` tokens needs.
pub fn window_tests(tokens: usize, window_words: usize) -> usize {
    match tokens {
        0 => 0,
        n if n < window_words => 1,
        n => n - window_words + 1,
    }
}

/// Window tests between two progress ticks, so that at most `budget`
/// ticks are emitted.
pub fn tick_interval(total_tests: usize, budget: u8) -> usize {
    let budget = usize::from(budget.max(1));
    total_tests.div_ceil(budget).max(1)
}

/// Sliding-window scanner over a read-only catalog snapshot.
pub struct Scanner<'c> {
    candidates: Vec<&'c Indicator>,
    window_words: usize,
    options: ScanOptions,
}

impl<'c> Scanner<'c> {
    /// Build a scanner sized to the catalog's longest phrase.
    pub fn new(indicators: &'c [Indicator], options: ScanOptions) -> Self {
        Self::with_window(indicators, max_phrase_words(indicators), options)
    }

    /// Build a scanner with a precomputed window size, widened to the
    /// longest phrase when smaller.
    pub fn with_window(indicators: &'c [Indicator], window_words: usize, options: ScanOptions) -> Self {
        let candidates = indicators
            .iter()
            .filter(|i| !i.keyword_phrases().is_empty())
            .collect();
        Self {
            candidates,
            window_words: window_words.max(max_phrase_words(indicators)),
            options,
        }
    }

    pub fn window_words(&self) -> usize {
        self.window_words
    }

    /// Scan `text`, ticking `progress` by one point every
    /// [`tick_interval`] window tests.
    pub fn scan(
        &self,
        text: &str,
        progress: &mut ProgressTracker<'_>,
        cancel: &CancelToken,
    ) -> Result<MatchMap<'c>, ScanError> {
        let total_tokens = tokenize::count_tokens(text);
        let total_tests = window_tests(total_tokens, self.window_words);
        let interval = tick_interval(total_tests, self.options.budget_percent);
        debug!(
            total_tokens,
            total_tests,
            interval,
            window = self.window_words,
            candidates = self.candidates.len(),
            "Scanning document"
        );

        let mut state = ScanState {
            matches: MatchMap::default(),
            seen: HashSet::new(),
            padded: String::new(),
            tests: 0,
        };
        let mut window = Window::new(self.window_words);

        for token in tokenize::tokens(text) {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            window.push(token);
            if window.is_full() {
                self.test_window(&window, &mut state);
                if state.tests % interval == 0 {
                    progress.advance(1);
                }
            }
        }

        // A document shorter than the window is tested once, as is.
        if state.tests == 0 && !window.is_empty() {
            self.test_window(&window, &mut state);
            progress.advance(1);
        }

        debug!(
            matched = state.matches.len(),
            tests = state.tests,
            "Scan finished"
        );
        Ok(state.matches)
    }

    fn test_window(&self, window: &Window, state: &mut ScanState<'c>) {
        state.tests += 1;
        window.write_padded(&mut state.padded);
        for (slot, &indicator) in self.candidates.iter().enumerate() {
            for (phrase_idx, phrase) in indicator.keyword_phrases().iter().enumerate() {
                if !state.padded.contains(phrase.padded()) {
                    continue;
                }
                for offset in window.occurrences(phrase) {
                    if state.seen.insert((slot, phrase_idx, offset)) {
                        state.matches.record(indicator);
                    }
                }
            }
        }
    }
}

struct ScanState<'c> {
    matches: MatchMap<'c>,
    /// (candidate, phrase, absolute token offset) already counted.
    seen: HashSet<(usize, usize, usize)>,
    padded: String,
    tests: usize,
}
