//! Catalog fixtures.
//!
//! A small four-level catalog with indicators whose keywords appear in
//! [`SAMPLE_REPORT`], so scans over it produce a known ranking.

use logframe_core::{Indicator, IndicatorId, Level, LevelId, MemoryCatalog};

pub const IMPACT: LevelId = LevelId(1);
pub const OUTCOME: LevelId = LevelId(2);
pub const OUTPUT: LevelId = LevelId(3);
pub const OTHER_OUTCOMES: LevelId = LevelId(4);

/// A project narrative mentioning most fixture keywords.
pub const SAMPLE_REPORT: &str = "\
The action addresses food insecurity in rural districts. Food insecurity \
remains the main driver of migration, and nutrition programmes reach only \
a fraction of households. Government policies on land tenure will be \
reviewed. Teachers trained in climate adaptation will support school \
enrolment, and school enrolment of girls is tracked yearly.";

pub fn level(id: LevelId, name: &str, label: &str, color: &str, priority: u32) -> Level {
    Level {
        id,
        name: name.to_string(),
        label: label.to_string(),
        color: color.to_string(),
        priority,
    }
}

/// Impact, Outcome, Output and Other outcomes, in that priority order.
pub fn levels() -> Vec<Level> {
    vec![
        level(IMPACT, "IMPACT", "Impact", "#1f77b4", 1),
        level(OUTCOME, "OUTCOME", "Outcome", "#2ca02c", 2),
        level(OUTPUT, "OUTPUT", "Output", "#ff7f0e", 3),
        level(OTHER_OUTCOMES, "OTHER_OUTCOMES", "Other outcomes", "#9467bd", 4),
    ]
}

pub fn indicator(id: u64, name: &str, level: LevelId, keywords: &str) -> Indicator {
    let mut indicator = Indicator::new(IndicatorId(id), name, level).with_keywords(keywords);
    indicator.source_verification = format!("{name} survey");
    indicator.data_source = format!("https://data.example.org/indicators/{id}");
    indicator
}

/// Indicators spread over every fixture level.
///
/// | id | level          | matches in [`SAMPLE_REPORT`] |
/// |----|----------------|------------------------------|
/// | 1  | impact         | 1 (`government policies`)    |
/// | 2  | outcome        | 3 (`food insecurity` ×2, `nutrition`) |
/// | 3  | outcome        | 2 (`school enrolment` ×2)    |
/// | 4  | output         | 1 (`teachers trained`)       |
/// | 5  | other outcomes | 1 (`migration`)              |
/// | 6  | output         | 0                            |
/// | 7  | impact         | 0 (no keywords)              |
pub fn indicators() -> Vec<Indicator> {
    let mut food = indicator(2, "Prevalence of food insecurity", OUTCOME, "food insecurity,nutrition");
    food.themes = "Nutrition".to_string();
    food.sdg_code = "2.1".to_string();
    let mut school = indicator(3, "School enrolment rate", OUTCOME, "school enrolment");
    school.themes = "Education".to_string();
    school.sdg_code = "4.1".to_string();
    school.disaggregation = Some(true);
    let mut policy = indicator(1, "Policies adopted", IMPACT, "government policies");
    policy.themes = "Governance".to_string();
    policy.crs_code = "15110".to_string();

    vec![
        policy,
        food,
        school,
        indicator(4, "Teachers trained", OUTPUT, "teachers trained"),
        indicator(5, "Migration flows", OTHER_OUTCOMES, "migration"),
        indicator(6, "Wells built", OUTPUT, "boreholes,wells drilled"),
        indicator(7, "Unlabelled", IMPACT, ""),
    ]
}

/// The fixture levels and indicators as a catalog.
pub fn catalog() -> MemoryCatalog {
    MemoryCatalog::new(levels(), indicators()).expect("fixture catalog is invalid")
}
