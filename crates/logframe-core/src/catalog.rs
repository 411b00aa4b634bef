//! Indicator catalog port and the JSON-backed in-memory catalog.
//!
//! The engine only reads the catalog. Every scan or render works on a
//! snapshot returned by the port, never on shared mutable state.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::{Indicator, IndicatorId, Level, LevelId};

/// Errors at the catalog boundary.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("indicator not found: {0}")]
    NotFound(IndicatorId),

    #[error("indicator {indicator} references unknown level {level}")]
    UnknownLevel { indicator: IndicatorId, level: LevelId },

    #[error("duplicate indicator id: {0}")]
    DuplicateIndicator(IndicatorId),

    #[error("duplicate level id: {0}")]
    DuplicateLevel(LevelId),

    #[error("no indicator id left after {0}")]
    IdsExhausted(IndicatorId),

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only access to indicators and levels.
pub trait Catalog: Send + Sync {
    /// Every indicator in the catalog.
    fn list_all_indicators(&self) -> Result<Vec<Indicator>, CatalogError>;

    /// Every level, ascending by priority (ties by id).
    fn list_levels_by_priority(&self) -> Result<Vec<Level>, CatalogError>;

    /// The indicators with the given ids, in request order.
    ///
    /// Fails with [`CatalogError::NotFound`] on the first unknown id.
    fn find_indicators_by_ids(&self, ids: &[IndicatorId]) -> Result<Vec<Indicator>, CatalogError>;

    /// The indicators selected by `filter`. An empty filter selects all.
    fn find_indicators(&self, filter: &IndicatorFilter) -> Result<Vec<Indicator>, CatalogError> {
        let all = self.list_all_indicators()?;
        if filter.is_empty() {
            return Ok(all);
        }
        Ok(all.into_iter().filter(|i| filter.matches(i)).collect())
    }
}

/// Restricts which indicators take part in a scan.
///
/// Each dimension is optional (empty = unrestricted). Values within a
/// dimension are alternatives; dimensions must all hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorFilter {
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub levels: Vec<LevelId>,
    #[serde(default)]
    pub sdg_codes: Vec<String>,
    #[serde(default)]
    pub crs_codes: Vec<String>,
}

impl IndicatorFilter {
    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
            && self.sources.is_empty()
            && self.levels.is_empty()
            && self.sdg_codes.is_empty()
            && self.crs_codes.is_empty()
    }

    pub fn matches(&self, indicator: &Indicator) -> bool {
        any_of(&self.themes, &indicator.themes)
            && any_of(&self.sources, &indicator.source)
            && (self.levels.is_empty() || self.levels.contains(&indicator.level))
            && any_of(&self.sdg_codes, &indicator.sdg_code)
            && any_of(&self.crs_codes, &indicator.crs_code)
    }
}

fn any_of(allowed: &[String], value: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|a| a == value)
}

/// Distinct non-empty values present in a catalog, per filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub themes: BTreeSet<String>,
    pub sources: BTreeSet<String>,
    pub levels: Vec<Level>,
    pub sdg_codes: BTreeSet<String>,
    pub crs_codes: BTreeSet<String>,
}

impl FilterOptions {
    /// Collect the values a caller can filter on.
    pub fn collect(catalog: &dyn Catalog) -> Result<Self, CatalogError> {
        let mut options = FilterOptions {
            levels: catalog.list_levels_by_priority()?,
            ..Default::default()
        };
        for indicator in catalog.list_all_indicators()? {
            insert_non_empty(&mut options.themes, indicator.themes);
            insert_non_empty(&mut options.sources, indicator.source);
            insert_non_empty(&mut options.sdg_codes, indicator.sdg_code);
            insert_non_empty(&mut options.crs_codes, indicator.crs_code);
        }
        Ok(options)
    }
}

fn insert_non_empty(set: &mut BTreeSet<String>, value: String) {
    if !value.is_empty() {
        set.insert(value);
    }
}

/// Serialized catalog: levels plus indicators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub levels: Vec<Level>,
    #[serde(default)]
    pub indicators: Vec<Indicator>,
}

/// Catalog held in memory, loadable from and writable to JSON.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    levels: Vec<Level>,
    indicators: Vec<Indicator>,
    index: HashMap<IndicatorId, usize>,
}

impl MemoryCatalog {
    /// Build a catalog, checking id uniqueness and level references.
    pub fn new(levels: Vec<Level>, indicators: Vec<Indicator>) -> Result<Self, CatalogError> {
        let mut level_ids = HashSet::new();
        for level in &levels {
            if !level_ids.insert(level.id) {
                return Err(CatalogError::DuplicateLevel(level.id));
            }
        }

        let mut index = HashMap::with_capacity(indicators.len());
        for (pos, indicator) in indicators.iter().enumerate() {
            if !level_ids.contains(&indicator.level) {
                return Err(CatalogError::UnknownLevel {
                    indicator: indicator.id,
                    level: indicator.level,
                });
            }
            if index.insert(indicator.id, pos).is_some() {
                return Err(CatalogError::DuplicateIndicator(indicator.id));
            }
        }

        let mut levels = levels;
        levels.sort_by_key(|l| (l.priority, l.id));

        Ok(Self {
            levels,
            indicators,
            index,
        })
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, CatalogError> {
        Self::new(snapshot.levels, snapshot.indicators)
    }

    /// Parse a JSON catalog.
    pub fn parse(json: &str) -> Result<Self, CatalogError> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }

    /// Load a JSON catalog file using async I/O.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        debug!(path = %path.display(), "Loading catalog");
        let content = tokio::fs::read_to_string(path).await?;
        let catalog = Self::parse(&content)?;
        info!(
            levels = catalog.levels.len(),
            indicators = catalog.indicators.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Write the catalog as pretty JSON using async I/O.
    pub async fn save(&self, path: &Path) -> Result<(), CatalogError> {
        tokio::fs::write(path, self.to_json()?).await?;
        debug!(path = %path.display(), "Catalog saved");
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            levels: self.levels.clone(),
            indicators: self.indicators.clone(),
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    /// First id above every id in use.
    pub fn next_indicator_id(&self) -> Result<IndicatorId, CatalogError> {
        match self.index.keys().max() {
            None => Ok(IndicatorId(1)),
            Some(&max) => max.0.checked_add(1).map(IndicatorId).ok_or(CatalogError::IdsExhausted(max)),
        }
    }

    /// Append indicators, keeping the catalog's invariants.
    pub fn extend(&mut self, indicators: Vec<Indicator>) -> Result<(), CatalogError> {
        let mut all = self.indicators.clone();
        all.extend(indicators);
        *self = Self::new(self.levels.clone(), all)?;
        Ok(())
    }
}

impl Catalog for MemoryCatalog {
    fn list_all_indicators(&self) -> Result<Vec<Indicator>, CatalogError> {
        Ok(self.indicators.clone())
    }

    fn list_levels_by_priority(&self) -> Result<Vec<Level>, CatalogError> {
        Ok(self.levels.clone())
    }

    fn find_indicators_by_ids(&self, ids: &[IndicatorId]) -> Result<Vec<Indicator>, CatalogError> {
        ids.iter()
            .map(|id| {
                self.index
                    .get(id)
                    .map(|&pos| self.indicators[pos].clone())
                    .ok_or(CatalogError::NotFound(*id))
            })
            .collect()
    }
}
