//! Flat indicator worksheet: one header row, one row per indicator.
//!
//! The export and import sides share [`COLUMNS`], so a sheet written by
//! [`export_worksheet`] reads back through [`import_worksheet`].

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::catalog::CatalogError;
use crate::grid::{CellStyle, FillColor, GridError, SheetCell, Worksheet};
use crate::keywords::normalize_keywords;
use crate::model::{Indicator, IndicatorId, Level};

pub const LEVEL: usize = 0;
pub const THEMES: usize = 1;
pub const KEYWORDS: usize = 2;
pub const NAME: usize = 3;
pub const DESCRIPTION: usize = 4;
pub const SOURCE: usize = 5;
pub const DISAGGREGATION: usize = 6;
pub const CRS_CODE: usize = 7;
pub const SDG_CODE: usize = 8;
pub const SOURCE_VERIFICATION: usize = 9;
pub const DATA_SOURCE: usize = 10;

/// Header labels, in column order.
pub const COLUMNS: [&str; 11] = [
    "Level",
    "Themes",
    "Keywords",
    "Name",
    "Description",
    "Source",
    "Disaggregation",
    "DAC 5/CRS",
    "SDG",
    "Source of Verification",
    "Data Source",
];

const SHEET_NAME: &str = "Indicators";

/// Write `indicators` in the given order, with autosized columns.
///
/// Disaggregation and verification cells are filled yellow, the coded
/// columns red. An indicator whose level is not in `levels` gets an empty
/// level cell.
pub fn export_worksheet(indicators: &[Indicator], levels: &[Level]) -> Result<Worksheet, GridError> {
    let level_names: HashMap<_, _> = levels.iter().map(|l| (l.id, l.name.as_str())).collect();
    let yellow = CellStyle::fill(FillColor::Yellow);
    let red = CellStyle::fill(FillColor::Red);

    let mut sheet = Worksheet::new(SHEET_NAME, COLUMNS.len());
    let header = COLUMNS
        .iter()
        .map(|label| SheetCell::styled(*label, CellStyle::BOLD))
        .collect();
    sheet.push_row(header)?;

    for indicator in indicators {
        let disaggregation = match indicator.disaggregation {
            Some(true) => "Yes",
            Some(false) => "No",
            None => "",
        };
        let row = vec![
            SheetCell::new(level_names.get(&indicator.level).copied().unwrap_or_default()),
            SheetCell::new(indicator.themes.as_str()),
            SheetCell::new(indicator.keywords.as_str()),
            SheetCell::new(indicator.name.as_str()),
            SheetCell::new(indicator.description.as_str()),
            SheetCell::new(indicator.source.as_str()),
            SheetCell::styled(disaggregation, yellow),
            SheetCell::styled(indicator.crs_code.as_str(), red),
            SheetCell::styled(indicator.sdg_code.as_str(), red),
            SheetCell::styled(indicator.source_verification.as_str(), yellow),
            SheetCell::new(indicator.data_source.as_str()),
        ];
        sheet.push_row(row)?;
    }

    sheet.autosize_columns();
    debug!(rows = indicators.len(), "Wrote indicator worksheet");
    Ok(sheet)
}

/// Read indicators from a flat worksheet, skipping the header row.
///
/// Ids are assigned sequentially from `first_id`; running past `u64::MAX`
/// fails with [`CatalogError::IdsExhausted`]. Rows with an unknown level
/// name (compared case-insensitively) are skipped with a warning, blank
/// rows silently.
pub fn import_worksheet(
    sheet: &Worksheet,
    levels: &[Level],
    first_id: IndicatorId,
) -> Result<Vec<Indicator>, CatalogError> {
    let levels_by_name: HashMap<String, &Level> =
        levels.iter().map(|l| (l.name.to_uppercase(), l)).collect();

    let mut next = Some(first_id);
    let mut last = first_id;
    let mut indicators = Vec::new();
    for (idx, row) in sheet.rows().enumerate().skip(1) {
        let text = move |column: usize| row.get(column).map(|c| c.value.trim()).unwrap_or_default();
        if row.iter().all(|c| c.value.trim().is_empty()) {
            continue;
        }
        let Some(level) = levels_by_name.get(&text(LEVEL).to_uppercase()) else {
            warn!(row = idx, level = text(LEVEL), "Skipping row with unknown level");
            continue;
        };

        let id = next.ok_or(CatalogError::IdsExhausted(last))?;
        last = id;
        next = id.0.checked_add(1).map(IndicatorId);

        let mut indicator =
            Indicator::new(id, text(NAME), level.id).with_keywords(normalize_keywords(text(KEYWORDS)));
        indicator.themes = text(THEMES).to_string();
        indicator.description = text(DESCRIPTION).to_string();
        indicator.source = text(SOURCE).to_string();
        indicator.disaggregation = parse_disaggregation(text(DISAGGREGATION));
        indicator.crs_code = text(CRS_CODE).to_string();
        indicator.sdg_code = text(SDG_CODE).to_string();
        indicator.source_verification = text(SOURCE_VERIFICATION).to_string();
        indicator.data_source = text(DATA_SOURCE).to_string();
        indicators.push(indicator);
    }
    debug!(imported = indicators.len(), "Read indicator worksheet");
    Ok(indicators)
}

fn parse_disaggregation(value: &str) -> Option<bool> {
    if value.is_empty() {
        None
    } else {
        Some(value.eq_ignore_ascii_case("yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::model::LevelId;
    use pretty_assertions::assert_eq;

    fn levels() -> Vec<Level> {
        ["IMPACT", "OUTCOME", "OUTPUT"]
            .iter()
            .enumerate()
            .map(|(i, name)| Level {
                id: LevelId(i as u64 + 1),
                name: name.to_string(),
                label: String::new(),
                color: String::new(),
                priority: i as u32 + 1,
            })
            .collect()
    }

    fn indicator(id: u64, level: u64) -> Indicator {
        let mut indicator =
            Indicator::new(IndicatorId(id), format!("Indicator {id}"), LevelId(level)).with_keywords("clean water,school enrolment");
        indicator.themes = "Water".to_string();
        indicator.crs_code = "14030".to_string();
        indicator.sdg_code = "6.1".to_string();
        indicator.disaggregation = Some(id % 2 == 0);
        indicator.source_verification = "Household survey".to_string();
        indicator.data_source = "https://data.example.org".to_string();
        indicator
    }

    fn row(sheet: &Worksheet, row: usize) -> Vec<String> {
        (0..sheet.column_count())
            .map(|c| sheet.cell_text(row, c).unwrap().to_string())
            .collect()
    }

    // ── Export ──────────────────────────────────────────────────────

    #[test]
    fn test_export_layout_and_styles() {
        let sheet = export_worksheet(&[indicator(1, 2), indicator(2, 3)], &levels()).unwrap();

        assert_eq!(sheet.row_count(), 3);
        assert_eq!(row(&sheet, 0), COLUMNS.map(String::from).to_vec());
        assert!(sheet.cell(0, NAME).unwrap().style.bold);
        assert_eq!(sheet.cell_text(1, LEVEL).unwrap(), "OUTCOME");
        assert_eq!(sheet.cell_text(1, DISAGGREGATION).unwrap(), "No");
        assert_eq!(sheet.cell_text(2, DISAGGREGATION).unwrap(), "Yes");
        assert_eq!(sheet.cell(1, DISAGGREGATION).unwrap().style.fill, Some(FillColor::Yellow));
        assert_eq!(sheet.cell(1, SOURCE_VERIFICATION).unwrap().style.fill, Some(FillColor::Yellow));
        assert_eq!(sheet.cell(1, CRS_CODE).unwrap().style.fill, Some(FillColor::Red));
        assert_eq!(sheet.cell(1, SDG_CODE).unwrap().style.fill, Some(FillColor::Red));
        assert_eq!(sheet.cell(1, NAME).unwrap().style, CellStyle::default());
    }

    #[test]
    fn test_export_autosizes_columns() {
        let sheet = export_worksheet(&[indicator(1, 1)], &levels()).unwrap();
        let widths = sheet.column_widths();
        assert_eq!(widths.len(), COLUMNS.len());
        assert_eq!(widths[KEYWORDS], "clean water,school enrolment".len());
        assert_eq!(widths[SOURCE_VERIFICATION], "Source of Verification".len());
    }

    #[test]
    fn test_export_unknown_level_and_missing_disaggregation() {
        let mut orphan = indicator(1, 99);
        orphan.disaggregation = None;
        let sheet = export_worksheet(&[orphan], &levels()).unwrap();
        assert_eq!(sheet.cell_text(1, LEVEL).unwrap(), "");
        assert_eq!(sheet.cell_text(1, DISAGGREGATION).unwrap(), "");
    }

    // ── Import ──────────────────────────────────────────────────────

    #[test]
    fn test_export_then_import_preserves_fields() {
        let original = vec![indicator(1, 1), indicator(2, 3)];
        let sheet = export_worksheet(&original, &levels()).unwrap();
        let imported = import_worksheet(&sheet, &levels(), IndicatorId(1)).unwrap();

        assert_eq!(imported.len(), 2);
        for (a, b) in original.iter().zip(&imported) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.name, b.name);
            assert_eq!(a.level, b.level);
            assert_eq!(a.keywords, b.keywords);
            assert_eq!(a.disaggregation, b.disaggregation);
            assert_eq!(a.crs_code, b.crs_code);
            assert_eq!(a.data_source, b.data_source);
        }
    }

    #[test]
    fn test_import_skips_unknown_levels_and_blank_rows() {
        let mut sheet = Worksheet::new("in", COLUMNS.len());
        sheet.push_row(COLUMNS.iter().map(|c| SheetCell::new(*c)).collect()).unwrap();
        for (level, name) in [("outcome", "kept"), ("GOAL", "dropped"), ("", ""), ("Output", "also kept")] {
            let mut cells = vec![SheetCell::default(); COLUMNS.len()];
            cells[LEVEL] = SheetCell::new(level);
            cells[NAME] = SheetCell::new(name);
            cells[KEYWORDS] = SheetCell::new(" Clean  Water , ,SANITATION ");
            cells[DISAGGREGATION] = SheetCell::new("YES");
            sheet.push_row(cells).unwrap();
        }

        let imported = import_worksheet(&sheet, &levels(), IndicatorId(40)).unwrap();

        let names: Vec<&str> = imported.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["kept", "also kept"]);
        assert_eq!(imported[0].id, IndicatorId(40));
        assert_eq!(imported[1].id, IndicatorId(41));
        assert_eq!(imported[1].level, LevelId(3));
        assert_eq!(imported[0].keywords, "clean water,sanitation");
        assert_eq!(imported[0].disaggregation, Some(true));
    }

    #[test]
    fn test_import_stops_when_ids_run_out() {
        let original = vec![indicator(1, 1), indicator(2, 3)];
        let sheet = export_worksheet(&original, &levels()).unwrap();

        let single = export_worksheet(&original[..1], &levels()).unwrap();
        let imported = import_worksheet(&single, &levels(), IndicatorId(u64::MAX)).unwrap();
        assert_eq!(imported[0].id, IndicatorId(u64::MAX));

        assert!(matches!(
            import_worksheet(&sheet, &levels(), IndicatorId(u64::MAX)),
            Err(CatalogError::IdsExhausted(IndicatorId(u64::MAX)))
        ));
    }

    #[test]
    fn test_parse_disaggregation() {
        assert_eq!(parse_disaggregation(""), None);
        assert_eq!(parse_disaggregation("Yes"), Some(true));
        assert_eq!(parse_disaggregation("no"), Some(false));
        assert_eq!(parse_disaggregation("maybe"), Some(false));
    }
}
