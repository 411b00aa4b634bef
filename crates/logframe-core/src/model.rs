//! Catalog entities and the projections handed back to callers.

use std::fmt;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::keywords::{self, KeywordPhrase};

/// Opaque indicator identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorId(pub u64);

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque level identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(pub u64);

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A result-chain tier (impact, outcome, output, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: LevelId,
    /// Stable name, e.g. `"OUTCOME"`.
    pub name: String,
    /// Display label, e.g. `"Outcome"`.
    #[serde(default)]
    pub label: String,
    /// Display color used by clients.
    #[serde(default)]
    pub color: String,
    /// Result-chain order; lower values rank first.
    pub priority: u32,
}

/// A named metric with the keyword phrases that evidence it in a document.
///
/// Keywords are stored the way the catalog holds them, as one
/// comma-separated string. The parsed phrase list is derived on first use
/// and cached for the lifetime of the value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub id: IndicatorId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Comma-separated keyword phrases.
    #[serde(default)]
    pub keywords: String,
    pub level: LevelId,
    #[serde(default)]
    pub themes: String,
    /// Source organisation.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub disaggregation: Option<bool>,
    /// DAC 5 / CRS code.
    #[serde(default)]
    pub crs_code: String,
    #[serde(default)]
    pub sdg_code: String,
    #[serde(default)]
    pub source_verification: String,
    /// URL of the data source.
    #[serde(default)]
    pub data_source: String,

    #[serde(skip)]
    phrases: OnceCell<Vec<KeywordPhrase>>,
}

impl Indicator {
    /// Create an indicator with only the fields the matcher needs.
    pub fn new(id: IndicatorId, name: impl Into<String>, level: LevelId) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            keywords: String::new(),
            level,
            themes: String::new(),
            source: String::new(),
            disaggregation: None,
            crs_code: String::new(),
            sdg_code: String::new(),
            source_verification: String::new(),
            data_source: String::new(),
            phrases: OnceCell::new(),
        }
    }

    /// Set the comma-separated keyword list.
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self.phrases = OnceCell::new();
        self
    }

    /// The parsed keyword phrases, derived once and cached.
    pub fn keyword_phrases(&self) -> &[KeywordPhrase] {
        self.phrases.get_or_init(|| keywords::parse_keywords(&self.keywords))
    }

    /// Word count of the longest keyword phrase (0 without keywords).
    pub fn longest_phrase_words(&self) -> usize {
        self.keyword_phrases()
            .iter()
            .map(KeywordPhrase::len)
            .max()
            .unwrap_or(0)
    }
}

/// A caller's pick of an indicator for rendering, with optional baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSelection {
    pub id: IndicatorId,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl IndicatorSelection {
    /// Select an indicator without a baseline.
    pub fn new(id: IndicatorId) -> Self {
        Self {
            id,
            value: None,
            date: None,
        }
    }

    /// Attach a baseline value and its reference date.
    pub fn with_baseline(mut self, value: impl Into<String>, date: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self.date = Some(date.into());
        self
    }
}

/// Immutable projection of a matched or selected indicator.
///
/// This is both the scan response unit and the rendering unit; the
/// optional `value`/`date` pair is supplied by the caller after the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorView {
    pub id: IndicatorId,
    pub level_id: LevelId,
    /// Level name.
    pub level: String,
    /// Level color.
    pub color: String,
    pub name: String,
    pub description: String,
    pub themes: String,
    pub source: String,
    pub disaggregation: Option<bool>,
    pub crs_code: String,
    pub sdg_code: String,
    pub source_verification: String,
    pub data_source: String,
    /// Number of keyword occurrences found by the scan.
    pub match_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl IndicatorView {
    /// Project an indicator. A missing level yields empty level fields.
    pub fn project(indicator: &Indicator, level: Option<&Level>, match_count: u32) -> Self {
        Self {
            id: indicator.id,
            level_id: indicator.level,
            level: level.map(|l| l.name.clone()).unwrap_or_default(),
            color: level.map(|l| l.color.clone()).unwrap_or_default(),
            name: indicator.name.clone(),
            description: indicator.description.clone(),
            themes: indicator.themes.clone(),
            source: indicator.source.clone(),
            disaggregation: indicator.disaggregation,
            crs_code: indicator.crs_code.clone(),
            sdg_code: indicator.sdg_code.clone(),
            source_verification: indicator.source_verification.clone(),
            data_source: indicator.data_source.clone(),
            match_count,
            value: None,
            date: None,
        }
    }

    /// Attach a caller-supplied baseline. Blank strings count as absent.
    pub fn with_baseline(mut self, value: Option<&str>, date: Option<&str>) -> Self {
        self.value = non_blank(value);
        self.date = non_blank(date);
        self
    }

    /// `"value (date)"` when both parts of the baseline are present.
    pub fn baseline(&self) -> Option<String> {
        match (&self.value, &self.date) {
            (Some(value), Some(date)) => Some(format!("{value} ({date})")),
            _ => None,
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty()).map(str::to_string)
}
