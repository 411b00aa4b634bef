//! Narrative report populator.
//!
//! The narrative template is a table with one prebuilt row per partition.
//! Each partition's bucket is written top-down: the first indicator fills
//! the prebuilt row, every further one gets a fresh row inserted right
//! below, and the level, result and assumption columns are then merged
//! over the rows the bucket occupies.
//!
//! ```text
//!   row 1  │ Impact  │ │ ind A │ 42 (2019) │ … │ src A │ │     ← prebuilt
//!   row 2  │    ↕    │ │ ind B │           │ … │ src B │ │     ← inserted
//!   row 3  │ Outcome │ │ ind C │           │ … │ src C │ │     ← prebuilt
//! ```

use logframe_config::NarrativeConfig;
use tracing::debug;

use crate::grid::{Grid, GridError};
use crate::model::IndicatorView;

/// Column positions and font for narrative rows.
#[derive(Debug, Clone)]
pub struct NarrativeLayout {
    pub name_column: usize,
    pub baseline_column: usize,
    pub verification_column: usize,
    pub merge_columns: Vec<usize>,
    pub font_size: u8,
}

impl NarrativeLayout {
    pub fn new(config: &NarrativeConfig, font_size: u8) -> Self {
        Self {
            name_column: config.name_column,
            baseline_column: config.baseline_column,
            verification_column: config.verification_column,
            merge_columns: config.merge_columns.clone(),
            font_size,
        }
    }
}

/// Write one bucket starting at `row`; returns the next partition's row.
///
/// An empty bucket leaves its template row blank and skips past it.
pub fn fill_partition<G: Grid + ?Sized>(
    grid: &mut G,
    bucket: &[&IndicatorView],
    row: usize,
    fill_baseline: bool,
    layout: &NarrativeLayout,
) -> Result<usize, GridError> {
    if bucket.is_empty() {
        return Ok(row + 1);
    }

    let font = Some(layout.font_size);
    let first = row;
    let mut row = row;
    for (idx, view) in bucket.iter().enumerate() {
        if idx > 0 {
            grid.insert_row(row)?;
        }
        grid.set_cell_text(row, layout.name_column, &view.name, font)?;
        grid.set_cell_text(row, layout.verification_column, &view.source_verification, font)?;
        if fill_baseline && let Some(baseline) = view.baseline() {
            grid.set_cell_hyperlink(row, layout.baseline_column, &baseline, &view.data_source, font)?;
        }
        row += 1;
    }

    for &column in &layout.merge_columns {
        grid.merge_column_range(column, first, row - 1)?;
    }
    debug!(first, last = row - 1, indicators = bucket.len(), "Filled narrative partition");
    Ok(row)
}

/// Fill every partition in template order, starting at `config.first_row`.
///
/// `buckets[i]` holds the views of `config.partitions[i]`.
pub fn populate<G: Grid + ?Sized>(
    grid: &mut G,
    buckets: &[Vec<&IndicatorView>],
    config: &NarrativeConfig,
    font_size: u8,
) -> Result<usize, GridError> {
    let layout = NarrativeLayout::new(config, font_size);
    let mut row = config.first_row;
    for (partition, bucket) in config.partitions.iter().zip(buckets) {
        row = fill_partition(grid, bucket, row, partition.fill_baseline, &layout)?;
    }
    Ok(row)
}
