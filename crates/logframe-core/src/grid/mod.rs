//! Template grids: the positional, mergeable structures reports are
//! written into.
//!
//! [`Grid`] is the surface both report kinds share (cell text, hyperlinks,
//! row insertion, vertical merges). [`Sheet`] adds the block operations
//! and merged-region introspection that the donor worksheet needs when it
//! outgrows its prebuilt slots.
//!
//! Concrete grids are in-memory models serialised as JSON:
//! [`ReportDocument`]/[`Table`] for the narrative report and
//! [`Worksheet`] for the donor report and flat exports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Document table model.
pub mod table;
/// Worksheet model.
pub mod sheet;

pub use sheet::{CellStyle, FillColor, SheetCell, Worksheet};
pub use table::{ReportDocument, Table, TableCell, VMerge};

/// Widest grid a decoder accepts.
pub const MAX_COLUMNS: usize = 16_384;

/// Errors from grid operations.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("row {row} out of range ({rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("column {column} out of range ({columns} columns)")]
    ColumnOutOfRange { column: usize, columns: usize },

    #[error("invalid row range {first}..={last}")]
    InvalidRange { first: usize, last: usize },

    #[error("merged region {0} overlaps an existing region")]
    OverlappingRegion(MergedRegion),

    #[error("row shift would split merged region {0}")]
    SplitRegion(MergedRegion),

    #[error("unknown merged region handle {0:?}")]
    UnknownRegion(RegionHandle),

    #[error("no first-column merged region ends at row {row}")]
    MissingBoundaryRegion { row: usize },

    #[error("malformed grid: {0}")]
    Malformed(String),

    #[error("grid encoding error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// A rectangular merged area, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergedRegion {
    pub first_row: usize,
    pub last_row: usize,
    pub first_column: usize,
    pub last_column: usize,
}

impl MergedRegion {
    /// A single-column vertical region.
    pub fn column(column: usize, first_row: usize, last_row: usize) -> Self {
        Self {
            first_row,
            last_row,
            first_column: column,
            last_column: column,
        }
    }

    pub fn overlaps(&self, other: &MergedRegion) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_column <= other.last_column
            && other.first_column <= self.last_column
    }

    /// Whether the region lies entirely within rows `first..=last`.
    pub fn within_rows(&self, first: usize, last: usize) -> bool {
        self.first_row >= first && self.last_row <= last
    }

    /// Whether the region shares at least one row with `first..=last`.
    pub fn touches_rows(&self, first: usize, last: usize) -> bool {
        self.first_row <= last && first <= self.last_row
    }
}

impl fmt::Display for MergedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..={}, columns {}..={}",
            self.first_row, self.last_row, self.first_column, self.last_column
        )
    }
}

/// Position of a merged region in [`Sheet::merged_regions`]. Valid until
/// the next change to the sheet's regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionHandle(pub usize);

/// Cell access shared by every template grid.
pub trait Grid {
    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn cell_text(&self, row: usize, column: usize) -> Result<&str, GridError>;

    /// Replace a cell's text, optionally with a font size.
    fn set_cell_text(
        &mut self,
        row: usize,
        column: usize,
        text: &str,
        font_size: Option<u8>,
    ) -> Result<(), GridError>;

    /// Replace a cell's text with a link to `uri`.
    fn set_cell_hyperlink(
        &mut self,
        row: usize,
        column: usize,
        text: &str,
        uri: &str,
        font_size: Option<u8>,
    ) -> Result<(), GridError>;

    /// Insert a blank row at `at` (0..=row_count), pushing later rows down.
    fn insert_row(&mut self, at: usize) -> Result<(), GridError>;

    /// Merge `column` vertically across rows `first..=last`. A one-row
    /// range is a no-op.
    fn merge_column_range(&mut self, column: usize, first: usize, last: usize) -> Result<(), GridError>;
}

/// Block operations and merged-region introspection for worksheets.
pub trait Sheet: Grid {
    /// Index of the last row, `None` for an empty sheet.
    fn last_row_index(&self) -> Option<usize> {
        self.row_count().checked_sub(1)
    }

    /// Move rows `from..=to` down by `by`, overwriting the destination and
    /// leaving the vacated rows blank. Merged regions inside the range
    /// move with it.
    fn shift_rows(&mut self, from: usize, to: usize, by: usize) -> Result<(), GridError>;

    /// Copy the cells of rows `from..=to` onto the rows starting at `dest`.
    fn copy_rows(&mut self, from: usize, to: usize, dest: usize) -> Result<(), GridError>;

    fn merged_regions(&self) -> Vec<(RegionHandle, MergedRegion)>;

    fn add_merged_region(&mut self, region: MergedRegion) -> Result<(), GridError>;

    fn unmerge_region(&mut self, handle: RegionHandle) -> Result<MergedRegion, GridError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_overlap() {
        let a = MergedRegion::column(0, 5, 13);
        assert!(a.overlaps(&MergedRegion::column(0, 13, 20)));
        assert!(!a.overlaps(&MergedRegion::column(0, 14, 16)));
        assert!(!a.overlaps(&MergedRegion::column(1, 5, 13)));
    }

    #[test]
    fn test_region_row_predicates() {
        let a = MergedRegion::column(0, 14, 16);
        assert!(a.within_rows(14, 30));
        assert!(!a.within_rows(15, 30));
        assert!(a.touches_rows(16, 30));
        assert!(!a.touches_rows(17, 30));
    }
}
