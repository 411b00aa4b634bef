//! Keyword phrases: normalisation of the stored comma-separated keyword list.
//!
//! A phrase is matched literally against the lower-cased token window, so
//! normalisation only trims, lower-cases, and collapses internal whitespace.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One keyword phrase: an ordered list of lower-case words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordPhrase {
    words: Vec<String>,
    /// The phrase joined with single spaces and padded on both sides.
    padded: String,
}

impl KeywordPhrase {
    /// Build a phrase from raw text. Returns `None` when nothing but
    /// whitespace remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let words: Vec<String> = raw.split_whitespace().map(str::to_lowercase).collect();
        if words.is_empty() {
            return None;
        }
        let padded = format!(" {} ", words.join(" "));
        Some(Self { words, padded })
    }

    /// The phrase's words in order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Number of words in the phrase.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Phrases are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The space-bounded needle (`" w1 w2 "`) tested against a window.
    pub fn padded(&self) -> &str {
        &self.padded
    }

    /// The normalised phrase text without padding.
    pub fn text(&self) -> &str {
        self.padded.trim()
    }
}

/// Split a stored comma-separated keyword string into phrases.
///
/// Empty entries (`"a,,b"`, trailing commas, whitespace-only) are dropped,
/// as are repeats of an earlier phrase after normalisation.
pub fn parse_keywords(raw: &str) -> Vec<KeywordPhrase> {
    let mut seen = HashSet::new();
    raw.split(',')
        .filter_map(KeywordPhrase::parse)
        .filter(|phrase| seen.insert(phrase.padded.clone()))
        .collect()
}

/// Normalise a keyword string for storage: every phrase trimmed,
/// lower-cased, and whitespace-collapsed, re-joined with commas.
pub fn normalize_keywords(raw: &str) -> String {
    parse_keywords(raw)
        .iter()
        .map(KeywordPhrase::text)
        .collect::<Vec<_>>()
        .join(",")
}
