//! Report rendering: turns a caller's indicator selection into one of the
//! report artifacts.
//!
//! ```text
//!   selection ──► catalog lookup ──► IndicatorView[] ──► LevelRoles::bucket
//!                                                             │
//!            ┌────────────────────────┬───────────────────────┤
//!            ▼                        ▼                       ▼
//!   narrative::populate      donor::populate        worksheet::export
//!   (document table)         (worksheet slots)      (flat sheet)
//! ```
//!
//! Every artifact is returned as bytes; nothing is persisted here.

use std::collections::HashMap;
use std::sync::Arc;

use logframe_config::{AppConfig, DonorConfig, LevelRole, LevelsConfig, NarrativeConfig};
use tracing::info;

use crate::catalog::{Catalog, CatalogError};
use crate::grid::{GridError, Worksheet};
use crate::model::{Indicator, IndicatorId, IndicatorSelection, IndicatorView, Level};
use crate::roles::LevelRoles;
use crate::templates::TemplateStore;
use crate::{donor, narrative, worksheet};

/// Errors raised while rendering or importing a report artifact.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("invalid template {name}: {source}")]
    InvalidTemplate {
        name: String,
        #[source]
        source: GridError,
    },

    #[error("failed to open worksheet: {0}")]
    FailedToOpenWorksheet(#[source] GridError),

    #[error("failed to close file: {0}")]
    FailedToCloseFile(#[source] GridError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Renders selections against the catalog and the configured templates.
pub struct ReportService {
    catalog: Arc<dyn Catalog>,
    templates: TemplateStore,
    narrative_template: String,
    donor_template: String,
    levels: LevelsConfig,
    narrative: NarrativeConfig,
    donor: DonorConfig,
    font_size: u8,
}

impl ReportService {
    pub fn from_config(catalog: Arc<dyn Catalog>, config: &AppConfig) -> Self {
        Self {
            catalog,
            templates: TemplateStore::from_config(&config.templates),
            narrative_template: config.templates.narrative.clone(),
            donor_template: config.templates.donor.clone(),
            levels: config.levels.clone(),
            narrative: config.narrative.clone(),
            donor: config.donor.clone(),
            font_size: config.templates.font_size,
        }
    }

    /// Replace the template source.
    pub fn with_templates(mut self, templates: TemplateStore) -> Self {
        self.templates = templates;
        self
    }

    /// Look up the selected indicators and project them, keeping the
    /// selection order. Also returns the catalog's levels by priority.
    pub fn select(&self, selection: &[IndicatorSelection]) -> Result<(Vec<IndicatorView>, Vec<Level>), RenderError> {
        let ids: Vec<IndicatorId> = selection.iter().map(|s| s.id).collect();
        let indicators = self.catalog.find_indicators_by_ids(&ids)?;
        let levels = self.catalog.list_levels_by_priority()?;
        let by_id: HashMap<_, _> = levels.iter().map(|l| (l.id, l)).collect();

        let views = indicators
            .iter()
            .zip(selection)
            .map(|(indicator, pick)| {
                IndicatorView::project(indicator, by_id.get(&indicator.level).copied(), 0)
                    .with_baseline(pick.value.as_deref(), pick.date.as_deref())
            })
            .collect();
        Ok((views, levels))
    }

    /// Fill the narrative report template's first table.
    pub async fn narrative_report(&self, selection: &[IndicatorSelection]) -> Result<Vec<u8>, RenderError> {
        let (views, levels) = self.select(selection)?;
        let mut document = self.templates.load_document(&self.narrative_template).await?;
        info!(
            template = %self.narrative_template,
            indicators = views.len(),
            "Rendering narrative report"
        );

        let partitions: Vec<&[LevelRole]> = self.narrative.partitions.iter().map(|p| p.roles.as_slice()).collect();
        let buckets = LevelRoles::resolve(&levels, &self.levels).bucket(&views, &partitions);

        let Some(table) = document.tables.first_mut() else {
            return Err(RenderError::InvalidTemplate {
                name: self.narrative_template.clone(),
                source: GridError::Malformed("template has no table".to_string()),
            });
        };
        narrative::populate(table, &buckets, &self.narrative, self.font_size)?;
        document.to_bytes().map_err(RenderError::FailedToCloseFile)
    }

    /// Fill the donor report worksheet template.
    pub async fn donor_report(&self, selection: &[IndicatorSelection]) -> Result<Vec<u8>, RenderError> {
        let (views, levels) = self.select(selection)?;
        let mut sheet = self.templates.load_worksheet(&self.donor_template).await?;
        info!(
            template = %self.donor_template,
            indicators = views.len(),
            "Rendering donor report"
        );

        let partitions: Vec<&[LevelRole]> = self.donor.partitions.iter().map(|p| p.roles.as_slice()).collect();
        let buckets = LevelRoles::resolve(&levels, &self.levels).bucket(&views, &partitions);

        donor::populate(&mut sheet, &buckets, &self.donor)?;
        sheet.to_bytes().map_err(RenderError::FailedToCloseFile)
    }

    /// Write the selected indicators to a flat worksheet.
    pub fn worksheet(&self, selection: &[IndicatorSelection]) -> Result<Vec<u8>, RenderError> {
        let ids: Vec<IndicatorId> = selection.iter().map(|s| s.id).collect();
        let indicators = self.catalog.find_indicators_by_ids(&ids)?;
        let levels = self.catalog.list_levels_by_priority()?;
        info!(indicators = indicators.len(), "Writing indicator worksheet");
        let sheet = worksheet::export_worksheet(&indicators, &levels)?;
        sheet.to_bytes().map_err(RenderError::FailedToCloseFile)
    }

    /// Read indicators from flat worksheet bytes, numbering them from
    /// `first_id`.
    pub fn import_worksheet(&self, bytes: &[u8], first_id: IndicatorId) -> Result<Vec<Indicator>, RenderError> {
        let sheet = Worksheet::from_bytes(bytes).map_err(RenderError::FailedToOpenWorksheet)?;
        let levels = self.catalog.list_levels_by_priority()?;
        let indicators = worksheet::import_worksheet(&sheet, &levels, first_id)?;
        info!(sheet = %sheet.name, imported = indicators.len(), "Imported indicator worksheet");
        Ok(indicators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::grid::{Grid, MergedRegion, ReportDocument, Sheet};
    use crate::model::LevelId;
    use pretty_assertions::assert_eq;

    fn level(id: u64, name: &str) -> Level {
        Level {
            id: LevelId(id),
            name: name.to_string(),
            label: name.to_string(),
            color: String::new(),
            priority: id as u32,
        }
    }

    /// Ids 1..=2 impact, 10..=14 outcome, 20 output, 30 other outcome.
    fn service() -> ReportService {
        let levels = vec![
            level(1, "IMPACT"),
            level(2, "OUTCOME"),
            level(3, "OUTPUT"),
            level(4, "OTHER_OUTCOMES"),
        ];
        let mut indicators = Vec::new();
        for (ids, level) in [(1..=2, 1), (10..=14, 2), (20..=20, 3), (30..=30, 4)] {
            for id in ids {
                let mut indicator = Indicator::new(IndicatorId(id), format!("ind {id}"), LevelId(level));
                indicator.source_verification = format!("src {id}");
                indicator.data_source = format!("https://data.example.org/{id}");
                indicators.push(indicator);
            }
        }
        let catalog = MemoryCatalog::new(levels, indicators).unwrap();
        ReportService::from_config(Arc::new(catalog), &AppConfig::default())
    }

    fn pick(ids: &[u64]) -> Vec<IndicatorSelection> {
        ids.iter().map(|id| IndicatorSelection::new(IndicatorId(*id))).collect()
    }

    // ── Selection ───────────────────────────────────────────────────

    #[test]
    fn test_select_keeps_order_and_baseline() {
        let mut selection = pick(&[20, 1]);
        selection[1] = selection[1].clone().with_baseline("42", "2019");
        selection[0].value = Some(String::new());

        let (views, levels) = service().select(&selection).unwrap();

        let ids: Vec<u64> = views.iter().map(|v| v.id.0).collect();
        assert_eq!(ids, vec![20, 1]);
        assert_eq!(views[0].level, "OUTPUT");
        assert_eq!(views[0].value, None);
        assert_eq!(views[1].baseline().as_deref(), Some("42 (2019)"));
        assert_eq!(levels.len(), 4);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        assert!(matches!(
            service().select(&pick(&[1, 999])),
            Err(RenderError::Catalog(CatalogError::NotFound(IndicatorId(999))))
        ));
    }

    // ── Narrative ───────────────────────────────────────────────────

    #[tokio::test]
    async fn test_narrative_report_groups_by_role() {
        let mut selection = pick(&[1, 2, 10, 30, 20]);
        selection[0] = selection[0].clone().with_baseline("3.5", "2020");

        let bytes = service().narrative_report(&selection).await.unwrap();
        let document = ReportDocument::from_bytes(&bytes).unwrap();
        let table = &document.tables[0];

        let names: Vec<&str> = (0..table.row_count()).map(|r| table.cell_text(r, 2).unwrap()).collect();
        assert_eq!(names, vec!["Indicators", "ind 1", "ind 2", "ind 10", "ind 30", "ind 20"]);
        let baseline = table.cell(1, 3).unwrap();
        assert_eq!(baseline.text, "3.5 (2020)");
        assert_eq!(baseline.hyperlink.as_deref(), Some("https://data.example.org/1"));
        assert_eq!(baseline.font_size, Some(10));
        assert_eq!(table.merged_spans(0), vec![(1, 2)]);
        assert_eq!(table.cell_text(4, 0).unwrap(), "Other outcomes");
    }

    #[tokio::test]
    async fn test_narrative_template_without_table() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("narrative_report.json"), br#"{"title": "empty"}"#)
            .await
            .unwrap();
        let service = service().with_templates(TemplateStore::Dir(dir.path().to_path_buf()));
        assert!(matches!(
            service.narrative_report(&pick(&[1])).await,
            Err(RenderError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            service.donor_report(&pick(&[1])).await,
            Err(RenderError::TemplateNotFound(_))
        ));
    }

    // ── Donor ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_donor_report_grows_outcome_partition() {
        let selection = pick(&[1, 10, 11, 12, 13, 14, 20]);

        let bytes = service().donor_report(&selection).await.unwrap();
        let sheet = Worksheet::from_bytes(&bytes).unwrap();

        assert_eq!(sheet.row_count(), 25 + 2 * 4);
        assert_eq!(sheet.cell_text(22, 2).unwrap(), "ind 14");
        assert_eq!(sheet.cell_text(26, 2).unwrap(), "ind 20");
        let regions: Vec<MergedRegion> = sheet.merged_regions().into_iter().map(|(_, r)| r).collect();
        assert!(regions.contains(&MergedRegion::column(0, 14, 24)));
        assert!(regions.contains(&MergedRegion::column(0, 25, 31)));
        assert!(!regions.contains(&MergedRegion::column(0, 14, 16)));
    }

    // ── Flat worksheet ──────────────────────────────────────────────

    #[test]
    fn test_worksheet_export_then_import() {
        let service = service();
        let bytes = service.worksheet(&pick(&[20, 1, 30])).unwrap();
        let imported = service.import_worksheet(&bytes, IndicatorId(100)).unwrap();

        let names: Vec<&str> = imported.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["ind 20", "ind 1", "ind 30"]);
        assert_eq!(imported[2].level, LevelId(4));
        assert_eq!(imported[0].id, IndicatorId(100));
    }

    #[test]
    fn test_import_rejects_garbage() {
        assert!(matches!(
            service().import_worksheet(b"\x00\x01", IndicatorId(1)),
            Err(RenderError::FailedToOpenWorksheet(_))
        ));
    }
}
