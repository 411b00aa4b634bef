//! Donor report populator.
//!
//! The donor worksheet reserves a fixed number of four-row slots per
//! partition, with the first column merged over each slot group:
//!
//! ```text
//!   slot row +0   │ level │ Indicator n │          │ Baseline │ …
//!   slot row +1   │   ↕   │             │ <name>   │ <value>  │ …
//!   slot row +2   │   ↕   │             │          │ Source   │ …
//!   slot row +3   │       │             │          │ <verif.> │ …
//! ```
//!
//! A bucket larger than its slot count grows the sheet one block at a
//! time: everything below is shifted down four rows, the previous block is
//! copied into the gap and filled, and finally one first-column region is
//! merged over the grown span. The row arithmetic is a contract with the
//! template layout and is not derived from the sheet's contents.

use logframe_config::{DonorConfig, DonorPartition};
use tracing::{debug, info};

use crate::grid::{GridError, MergedRegion, Sheet};
use crate::model::IndicatorView;

/// Physical rows per indicator slot.
pub const ROWS_PER_SLOT: usize = 4;
/// Column holding the level label, merged per slot group.
pub const LEVEL_COLUMN: usize = 0;
/// Column receiving the indicator name.
pub const NAME_COLUMN: usize = 2;
/// Column receiving the baseline and the source of verification.
pub const VALUE_COLUMN: usize = 3;

const NAME_ROW: usize = 1;
const BASELINE_ROW: usize = 1;
const VERIFICATION_ROW: usize = 3;

/// What filling one partition did to the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionOutcome {
    /// First row of the next partition.
    pub next_row: usize,
    /// Region removed at the boundary before the first overflow block.
    pub respliced: Option<MergedRegion>,
    /// First-column region added over the grown partition.
    pub merged: Option<MergedRegion>,
}

/// Write one indicator into the slot starting at `row`.
///
/// With `clear_baseline`, a missing baseline blanks the cell instead of
/// leaving what the template (or a copied block) had there.
pub fn fill_slot<S: Sheet + ?Sized>(
    sheet: &mut S,
    row: usize,
    view: &IndicatorView,
    fill_baseline: bool,
    clear_baseline: bool,
) -> Result<(), GridError> {
    sheet.set_cell_text(row + NAME_ROW, NAME_COLUMN, &view.name, None)?;
    sheet.set_cell_text(row + VERIFICATION_ROW, VALUE_COLUMN, &view.source_verification, None)?;
    match view.baseline().filter(|_| fill_baseline) {
        Some(baseline) => sheet.set_cell_text(row + BASELINE_ROW, VALUE_COLUMN, &baseline, None)?,
        None if clear_baseline => sheet.set_cell_text(row + BASELINE_ROW, VALUE_COLUMN, "", None)?,
        None => {}
    }
    Ok(())
}

/// Remove the single first-column merged region whose last row is
/// `boundary_row`, so the column can be re-merged over a grown partition.
///
/// Fails with [`GridError::MissingBoundaryRegion`] when no such region
/// exists; on success exactly one region has been removed.
pub fn resplice_boundary<S: Sheet + ?Sized>(sheet: &mut S, boundary_row: usize) -> Result<MergedRegion, GridError> {
    let handle = sheet
        .merged_regions()
        .into_iter()
        .find(|(_, r)| r.first_column == LEVEL_COLUMN && r.last_column == LEVEL_COLUMN && r.last_row == boundary_row)
        .map(|(handle, _)| handle)
        .ok_or(GridError::MissingBoundaryRegion { row: boundary_row })?;
    let region = sheet.unmerge_region(handle)?;
    debug!(%region, "Removed boundary merged region");
    Ok(region)
}

/// Fill one partition whose prebuilt slots start at `initial_row`.
///
/// `is_last` selects the overflow merge start: `initial + slots*4 - 1` for
/// the final partition, `initial + slots*3` for earlier ones.
pub fn fill_partition<S: Sheet + ?Sized>(
    sheet: &mut S,
    bucket: &[&IndicatorView],
    initial_row: usize,
    partition: &DonorPartition,
    is_last: bool,
) -> Result<PartitionOutcome, GridError> {
    let slots = partition.slots;
    if slots == 0 {
        return Err(GridError::Malformed("donor partition without slots".to_string()));
    }

    let mut row = initial_row;
    for view in bucket.iter().take(slots) {
        fill_slot(sheet, row, view, partition.fill_baseline, false)?;
        row += ROWS_PER_SLOT;
    }

    if bucket.len() <= slots {
        return Ok(PartitionOutcome {
            next_row: initial_row + slots * ROWS_PER_SLOT,
            respliced: None,
            merged: None,
        });
    }

    info!(
        initial_row,
        slots,
        indicators = bucket.len(),
        "Growing donor partition"
    );
    let mut respliced = None;
    for (idx, view) in bucket[slots..].iter().enumerate() {
        if idx == 0 && partition.resplice_boundary {
            respliced = Some(resplice_boundary(sheet, row - 1)?);
        }
        if let Some(last) = sheet.last_row_index() {
            sheet.shift_rows(row, last, ROWS_PER_SLOT)?;
        }
        sheet.copy_rows(row - ROWS_PER_SLOT, row - 1, row)?;
        sheet.set_cell_text(row, LEVEL_COLUMN, "", None)?;
        fill_slot(sheet, row, view, partition.fill_baseline, true)?;
        row += ROWS_PER_SLOT;
    }

    let merge_start = if is_last {
        initial_row + slots * ROWS_PER_SLOT - 1
    } else {
        initial_row + slots * 3
    };
    let region = MergedRegion::column(LEVEL_COLUMN, merge_start, row - 1);
    sheet.add_merged_region(region)?;

    Ok(PartitionOutcome {
        next_row: row,
        respliced,
        merged: Some(region),
    })
}

/// Fill every partition in sheet order, starting at `config.first_row`.
///
/// `buckets[i]` holds the views of `config.partitions[i]`; the last
/// configured partition is treated as the final one.
pub fn populate<S: Sheet + ?Sized>(
    sheet: &mut S,
    buckets: &[Vec<&IndicatorView>],
    config: &DonorConfig,
) -> Result<Vec<PartitionOutcome>, GridError> {
    let count = config.partitions.len();
    let mut row = config.first_row;
    let mut outcomes = Vec::with_capacity(count);
    for (idx, (partition, bucket)) in config.partitions.iter().zip(buckets).enumerate() {
        let outcome = fill_partition(sheet, bucket, row, partition, idx + 1 == count)?;
        row = outcome.next_row;
        outcomes.push(outcome);
    }
    Ok(outcomes)
}
