//! Worksheet model: a grid of styled string cells with rectangular merged
//! regions. Writes past the last row grow the sheet; reads do not.

use serde::{Deserialize, Serialize};

use super::{Grid, GridError, MergedRegion, RegionHandle, Sheet};

/// Solid background fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillColor {
    Red,
    Yellow,
}

/// Cell formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStyle {
    #[serde(default)]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillColor>,
}

impl CellStyle {
    pub const BOLD: CellStyle = CellStyle {
        bold: true,
        fill: None,
    };

    pub fn fill(color: FillColor) -> Self {
        Self {
            bold: false,
            fill: Some(color),
        }
    }

    fn is_plain(&self) -> bool {
        !self.bold && self.fill.is_none()
    }
}

/// One worksheet cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CellRepr", into = "CellRepr")]
pub struct SheetCell {
    pub value: String,
    pub hyperlink: Option<String>,
    pub style: CellStyle,
}

impl SheetCell {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn styled(value: impl Into<String>, style: CellStyle) -> Self {
        Self {
            value: value.into(),
            hyperlink: None,
            style,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum CellRepr {
    Text(String),
    Full {
        #[serde(default)]
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hyperlink: Option<String>,
        #[serde(default)]
        style: CellStyle,
    },
}

impl From<CellRepr> for SheetCell {
    fn from(repr: CellRepr) -> Self {
        match repr {
            CellRepr::Text(value) => SheetCell::new(value),
            CellRepr::Full {
                value,
                hyperlink,
                style,
            } => SheetCell {
                value,
                hyperlink,
                style,
            },
        }
    }
}

impl From<SheetCell> for CellRepr {
    fn from(cell: SheetCell) -> Self {
        if cell.hyperlink.is_none() && cell.style.is_plain() {
            CellRepr::Text(cell.value)
        } else {
            CellRepr::Full {
                value: cell.value,
                hyperlink: cell.hyperlink,
                style: cell.style,
            }
        }
    }
}

/// A single worksheet with a fixed column count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    #[serde(default)]
    pub name: String,
    columns: usize,
    #[serde(default)]
    rows: Vec<Vec<SheetCell>>,
    #[serde(default)]
    merged: Vec<MergedRegion>,
    /// Column widths in characters, set by [`Worksheet::autosize_columns`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    column_widths: Vec<usize>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>, columns: usize) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            merged: Vec::new(),
            column_widths: Vec::new(),
        }
    }

    /// Append a row of cells; missing trailing cells are blank.
    pub fn push_row(&mut self, mut cells: Vec<SheetCell>) -> Result<(), GridError> {
        if cells.len() > self.columns {
            return Err(GridError::ColumnOutOfRange {
                column: cells.len() - 1,
                columns: self.columns,
            });
        }
        cells.resize_with(self.columns, SheetCell::default);
        self.rows.push(cells);
        Ok(())
    }

    pub fn cell(&self, row: usize, column: usize) -> Result<&SheetCell, GridError> {
        if row >= self.rows.len() {
            return Err(GridError::RowOutOfRange {
                row,
                rows: self.rows.len(),
            });
        }
        self.check_column(column)?;
        Ok(&self.rows[row][column])
    }

    /// Rows as cell slices, header included.
    pub fn rows(&self) -> impl Iterator<Item = &[SheetCell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn column_widths(&self) -> &[usize] {
        &self.column_widths
    }

    /// Set every column's width to its longest value (in characters).
    pub fn autosize_columns(&mut self) {
        self.column_widths = (0..self.columns)
            .map(|col| {
                self.rows
                    .iter()
                    .map(|r| r[col].value.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();
    }

    fn check_column(&self, column: usize) -> Result<(), GridError> {
        if column >= self.columns {
            return Err(GridError::ColumnOutOfRange {
                column,
                columns: self.columns,
            });
        }
        Ok(())
    }

    fn ensure_rows(&mut self, rows: usize) {
        if self.rows.len() < rows {
            let columns = self.columns;
            self.rows.resize_with(rows, || vec![SheetCell::default(); columns]);
        }
    }

    fn cell_mut(&mut self, row: usize, column: usize) -> Result<&mut SheetCell, GridError> {
        self.check_column(column)?;
        self.ensure_rows(row + 1);
        Ok(&mut self.rows[row][column])
    }

    fn blank_row(&self) -> Vec<SheetCell> {
        vec![SheetCell::default(); self.columns]
    }

    /// Decode a worksheet, padding short rows and checking merged regions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GridError> {
        let mut sheet: Worksheet = serde_json::from_slice(bytes)?;
        let columns = sheet.columns;
        if columns > super::MAX_COLUMNS {
            return Err(GridError::Malformed(format!("{columns} columns exceeds {}", super::MAX_COLUMNS)));
        }
        for (idx, row) in sheet.rows.iter_mut().enumerate() {
            if row.len() > columns {
                return Err(GridError::Malformed(format!(
                    "row {idx} has {} cells, sheet has {columns} columns",
                    row.len()
                )));
            }
            row.resize_with(columns, SheetCell::default);
        }
        for (idx, region) in sheet.merged.iter().enumerate() {
            if region.last_row < region.first_row || region.last_column < region.first_column {
                return Err(GridError::Malformed(format!("inverted merged region {region}")));
            }
            if region.last_column >= columns || region.last_row >= sheet.rows.len() {
                return Err(GridError::Malformed(format!("merged region {region} outside the sheet")));
            }
            if sheet.merged[..idx].iter().any(|other| other.overlaps(region)) {
                return Err(GridError::OverlappingRegion(*region));
            }
        }
        Ok(sheet)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, GridError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

impl Grid for Worksheet {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns
    }

    fn cell_text(&self, row: usize, column: usize) -> Result<&str, GridError> {
        Ok(&self.cell(row, column)?.value)
    }

    fn set_cell_text(
        &mut self,
        row: usize,
        column: usize,
        text: &str,
        _font_size: Option<u8>,
    ) -> Result<(), GridError> {
        let cell = self.cell_mut(row, column)?;
        cell.value = text.to_string();
        cell.hyperlink = None;
        Ok(())
    }

    fn set_cell_hyperlink(
        &mut self,
        row: usize,
        column: usize,
        text: &str,
        uri: &str,
        _font_size: Option<u8>,
    ) -> Result<(), GridError> {
        let cell = self.cell_mut(row, column)?;
        cell.value = text.to_string();
        cell.hyperlink = (!uri.is_empty()).then(|| uri.to_string());
        Ok(())
    }

    fn insert_row(&mut self, at: usize) -> Result<(), GridError> {
        if at > self.rows.len() {
            return Err(GridError::RowOutOfRange {
                row: at,
                rows: self.rows.len(),
            });
        }
        if let Some(region) = self
            .merged
            .iter()
            .find(|r| r.first_row < at && at <= r.last_row)
        {
            return Err(GridError::SplitRegion(*region));
        }
        let blank = self.blank_row();
        self.rows.insert(at, blank);
        for region in &mut self.merged {
            if region.first_row >= at {
                region.first_row += 1;
                region.last_row += 1;
            }
        }
        Ok(())
    }

    fn merge_column_range(&mut self, column: usize, first: usize, last: usize) -> Result<(), GridError> {
        if last < first {
            return Err(GridError::InvalidRange { first, last });
        }
        self.check_column(column)?;
        if first == last {
            return Ok(());
        }
        self.add_merged_region(MergedRegion::column(column, first, last))
    }
}

impl Sheet for Worksheet {
    fn shift_rows(&mut self, from: usize, to: usize, by: usize) -> Result<(), GridError> {
        if by == 0 || from >= self.rows.len() {
            return Ok(());
        }
        if to < from {
            return Err(GridError::InvalidRange { first: from, last: to });
        }
        let to = to.min(self.rows.len() - 1);
        if let Some(region) = self
            .merged
            .iter()
            .find(|r| r.touches_rows(from, to) && !r.within_rows(from, to))
        {
            return Err(GridError::SplitRegion(*region));
        }

        self.ensure_rows(to + by + 1);
        let blank = self.blank_row();
        for row in (from..=to).rev() {
            let moved = std::mem::replace(&mut self.rows[row], blank.clone());
            self.rows[row + by] = moved;
        }

        // Regions overwritten by the destination rows are dropped.
        let dest_last = to + by;
        self.merged
            .retain(|r| r.within_rows(from, to) || !r.touches_rows(to + 1, dest_last));
        for region in &mut self.merged {
            if region.within_rows(from, to) {
                region.first_row += by;
                region.last_row += by;
            }
        }
        Ok(())
    }

    fn copy_rows(&mut self, from: usize, to: usize, dest: usize) -> Result<(), GridError> {
        if to < from {
            return Err(GridError::InvalidRange { first: from, last: to });
        }
        if to >= self.rows.len() {
            return Err(GridError::RowOutOfRange {
                row: to,
                rows: self.rows.len(),
            });
        }
        let block: Vec<Vec<SheetCell>> = self.rows[from..=to].to_vec();
        self.ensure_rows(dest + block.len());
        for (offset, row) in block.into_iter().enumerate() {
            self.rows[dest + offset] = row;
        }
        Ok(())
    }

    fn merged_regions(&self) -> Vec<(RegionHandle, MergedRegion)> {
        self.merged
            .iter()
            .enumerate()
            .map(|(idx, r)| (RegionHandle(idx), *r))
            .collect()
    }

    fn add_merged_region(&mut self, region: MergedRegion) -> Result<(), GridError> {
        if region.last_row < region.first_row {
            return Err(GridError::InvalidRange {
                first: region.first_row,
                last: region.last_row,
            });
        }
        self.check_column(region.last_column)?;
        if self.merged.iter().any(|r| r.overlaps(&region)) {
            return Err(GridError::OverlappingRegion(region));
        }
        self.ensure_rows(region.last_row + 1);
        self.merged.push(region);
        Ok(())
    }

    fn unmerge_region(&mut self, handle: RegionHandle) -> Result<MergedRegion, GridError> {
        if handle.0 >= self.merged.len() {
            return Err(GridError::UnknownRegion(handle));
        }
        Ok(self.merged.remove(handle.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet(rows: usize) -> Worksheet {
        let mut sheet = Worksheet::new("test", 3);
        for i in 0..rows {
            sheet.push_row(vec![SheetCell::new(format!("r{i}"))]).unwrap();
        }
        sheet
    }

    fn column0(sheet: &Worksheet) -> Vec<String> {
        sheet.rows().map(|r| r[0].value.clone()).collect()
    }

    fn regions(sheet: &Worksheet) -> Vec<MergedRegion> {
        sheet.merged_regions().into_iter().map(|(_, r)| r).collect()
    }

    // ── Cells ───────────────────────────────────────────────────────

    #[test]
    fn test_writes_grow_reads_do_not() {
        let mut s = sheet(1);
        assert!(matches!(s.cell_text(3, 0), Err(GridError::RowOutOfRange { row: 3, rows: 1 })));
        s.set_cell_text(3, 1, "x", None).unwrap();
        assert_eq!(s.row_count(), 4);
        assert_eq!(s.cell_text(3, 1).unwrap(), "x");
        assert!(matches!(s.set_cell_text(0, 3, "x", None), Err(GridError::ColumnOutOfRange { .. })));
    }

    #[test]
    fn test_hyperlink_cell() {
        let mut s = sheet(1);
        s.set_cell_hyperlink(0, 1, "42 (2019)", "https://x.org", None).unwrap();
        assert_eq!(s.cell(0, 1).unwrap().hyperlink.as_deref(), Some("https://x.org"));
        s.set_cell_text(0, 1, "plain", None).unwrap();
        assert_eq!(s.cell(0, 1).unwrap().hyperlink, None);
    }

    #[test]
    fn test_autosize_columns() {
        let mut s = sheet(2);
        s.set_cell_text(1, 2, "wider text", None).unwrap();
        s.autosize_columns();
        assert_eq!(s.column_widths(), &[2, 0, 10]);
    }

    // ── Block operations ────────────────────────────────────────────

    #[test]
    fn test_shift_rows_moves_cells_and_regions() {
        let mut s = sheet(6);
        s.add_merged_region(MergedRegion::column(0, 0, 1)).unwrap();
        s.add_merged_region(MergedRegion::column(0, 3, 5)).unwrap();
        s.shift_rows(2, 5, 4).unwrap();
        assert_eq!(
            column0(&s),
            vec!["r0", "r1", "", "", "", "", "r2", "r3", "r4", "r5"]
        );
        assert_eq!(
            regions(&s),
            vec![MergedRegion::column(0, 0, 1), MergedRegion::column(0, 7, 9)]
        );
    }

    #[test]
    fn test_shift_rows_refuses_to_split_region() {
        let mut s = sheet(6);
        s.add_merged_region(MergedRegion::column(0, 1, 3)).unwrap();
        assert!(matches!(s.shift_rows(2, 5, 1), Err(GridError::SplitRegion(_))));
    }

    #[test]
    fn test_shift_past_end_is_noop() {
        let mut s = sheet(2);
        s.shift_rows(2, 1, 4).unwrap();
        assert_eq!(s.row_count(), 2);
    }

    #[test]
    fn test_copy_rows_copies_cells_only() {
        let mut s = sheet(4);
        s.set_cell_hyperlink(1, 1, "v", "u", None).unwrap();
        s.add_merged_region(MergedRegion::column(0, 0, 1)).unwrap();
        s.copy_rows(0, 1, 4).unwrap();
        assert_eq!(column0(&s), vec!["r0", "r1", "r2", "r3", "r0", "r1"]);
        assert_eq!(s.cell(5, 1).unwrap().hyperlink.as_deref(), Some("u"));
        assert_eq!(regions(&s).len(), 1);
        assert!(matches!(s.copy_rows(0, 9, 1), Err(GridError::RowOutOfRange { .. })));
    }

    #[test]
    fn test_insert_row_shifts_regions_below() {
        let mut s = sheet(4);
        s.add_merged_region(MergedRegion::column(0, 2, 3)).unwrap();
        s.insert_row(1).unwrap();
        assert_eq!(regions(&s), vec![MergedRegion::column(0, 3, 4)]);
        assert!(matches!(s.insert_row(4), Err(GridError::SplitRegion(_))));
    }

    // ── Merged regions ──────────────────────────────────────────────

    #[test]
    fn test_merge_and_unmerge() {
        let mut s = sheet(5);
        s.merge_column_range(0, 1, 1).unwrap();
        assert!(s.merged_regions().is_empty());
        s.merge_column_range(0, 1, 3).unwrap();
        assert!(matches!(
            s.merge_column_range(0, 3, 4),
            Err(GridError::OverlappingRegion(_))
        ));
        let (handle, region) = s.merged_regions()[0];
        assert_eq!(s.unmerge_region(handle).unwrap(), region);
        assert!(matches!(s.unmerge_region(handle), Err(GridError::UnknownRegion(_))));
        s.merge_column_range(0, 3, 4).unwrap();
    }

    // ── Codec ───────────────────────────────────────────────────────

    #[test]
    fn test_codec_shorthand_cells() {
        let json = br#"{
            "name": "RF",
            "columns": 2,
            "rows": [["a", {"value": "b", "style": {"bold": true}}], ["c"]],
            "merged": [{"first_row": 0, "last_row": 1, "first_column": 0, "last_column": 0}]
        }"#;
        let s = Worksheet::from_bytes(json).unwrap();
        assert_eq!(s.cell(0, 1).unwrap().style, CellStyle::BOLD);
        assert_eq!(s.cell_text(1, 1).unwrap(), "");
        let again = Worksheet::from_bytes(&s.to_bytes().unwrap()).unwrap();
        assert_eq!(again, s);
    }

    #[test]
    fn test_codec_rejects_bad_regions() {
        let overlapping = br#"{"columns": 1, "rows": [[], [], [], []], "merged": [
            {"first_row": 0, "last_row": 2, "first_column": 0, "last_column": 0},
            {"first_row": 2, "last_row": 3, "first_column": 0, "last_column": 0}]}"#;
        assert!(matches!(
            Worksheet::from_bytes(overlapping),
            Err(GridError::OverlappingRegion(_))
        ));
        let outside = br#"{"columns": 1, "rows": [[], []], "merged": [{"first_row": 0, "last_row": 1, "first_column": 0, "last_column": 4}]}"#;
        assert!(matches!(Worksheet::from_bytes(outside), Err(GridError::Malformed(_))));
        let below = br#"{"columns": 1, "rows": [[]], "merged": [{"first_row": 0, "last_row": 3, "first_column": 0, "last_column": 0}]}"#;
        assert!(matches!(Worksheet::from_bytes(below), Err(GridError::Malformed(_))));
        let wide = br#"{"columns": 1000000000}"#;
        assert!(matches!(Worksheet::from_bytes(wide), Err(GridError::Malformed(_))));
        assert!(matches!(Worksheet::from_bytes(b"[]"), Err(GridError::Codec(_))));
    }
}
