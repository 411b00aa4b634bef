//! Word-processing document model: paragraphs and tables whose cells
//! merge vertically the way word processors encode it (a `restart` cell
//! followed by `continue` cells in the same column).

use serde::{Deserialize, Serialize};

use super::{Grid, GridError, MergedRegion};

/// Vertical merge marker of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VMerge {
    /// First cell of a merged span.
    Restart,
    /// Continuation of the span above.
    Continue,
}

/// One table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CellRepr", into = "CellRepr")]
pub struct TableCell {
    pub text: String,
    pub font_size: Option<u8>,
    pub hyperlink: Option<String>,
    pub vmerge: Option<VMerge>,
}

impl TableCell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    fn is_plain(&self) -> bool {
        self.font_size.is_none() && self.hyperlink.is_none() && self.vmerge.is_none()
    }
}

/// Serialized form: a bare string for plain cells, an object otherwise.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum CellRepr {
    Text(String),
    Full {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_size: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hyperlink: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vmerge: Option<VMerge>,
    },
}

impl From<CellRepr> for TableCell {
    fn from(repr: CellRepr) -> Self {
        match repr {
            CellRepr::Text(text) => TableCell::text(text),
            CellRepr::Full {
                text,
                font_size,
                hyperlink,
                vmerge,
            } => TableCell {
                text,
                font_size,
                hyperlink,
                vmerge,
            },
        }
    }
}

impl From<TableCell> for CellRepr {
    fn from(cell: TableCell) -> Self {
        if cell.is_plain() {
            CellRepr::Text(cell.text)
        } else {
            CellRepr::Full {
                text: cell.text,
                font_size: cell.font_size,
                hyperlink: cell.hyperlink,
                vmerge: cell.vmerge,
            }
        }
    }
}

/// A table with a fixed column count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: usize,
    #[serde(default)]
    rows: Vec<Vec<TableCell>>,
}

impl Table {
    /// An empty table with `columns` columns.
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row from plain texts; missing trailing cells are blank.
    pub fn push_row<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<(), GridError> {
        if texts.len() > self.columns {
            return Err(GridError::ColumnOutOfRange {
                column: texts.len() - 1,
                columns: self.columns,
            });
        }
        let mut row: Vec<TableCell> = texts.iter().map(|t| TableCell::text(t.as_ref())).collect();
        row.resize_with(self.columns, TableCell::default);
        self.rows.push(row);
        Ok(())
    }

    pub fn cell(&self, row: usize, column: usize) -> Result<&TableCell, GridError> {
        self.check(row, column)?;
        Ok(&self.rows[row][column])
    }

    fn cell_mut(&mut self, row: usize, column: usize) -> Result<&mut TableCell, GridError> {
        self.check(row, column)?;
        Ok(&mut self.rows[row][column])
    }

    fn check(&self, row: usize, column: usize) -> Result<(), GridError> {
        if row >= self.rows.len() {
            return Err(GridError::RowOutOfRange {
                row,
                rows: self.rows.len(),
            });
        }
        if column >= self.columns {
            return Err(GridError::ColumnOutOfRange {
                column,
                columns: self.columns,
            });
        }
        Ok(())
    }

    /// Vertical spans `(first, last)` of `column`, one per `restart` cell.
    pub fn merged_spans(&self, column: usize) -> Vec<(usize, usize)> {
        let mut spans: Vec<(usize, usize)> = Vec::new();
        for (idx, row) in self.rows.iter().enumerate() {
            match row.get(column).and_then(|c| c.vmerge) {
                Some(VMerge::Restart) => spans.push((idx, idx)),
                Some(VMerge::Continue) => {
                    if let Some(span) = spans.last_mut().filter(|s| s.1 + 1 == idx) {
                        span.1 = idx;
                    }
                }
                None => {}
            }
        }
        spans
    }

    /// Pad short rows and check every row fits the column count.
    fn normalize(&mut self) -> Result<(), GridError> {
        if self.columns > super::MAX_COLUMNS {
            return Err(GridError::Malformed(format!(
                "{} columns exceeds {}",
                self.columns,
                super::MAX_COLUMNS
            )));
        }
        for (idx, row) in self.rows.iter_mut().enumerate() {
            if row.len() > self.columns {
                return Err(GridError::Malformed(format!(
                    "row {idx} has {} cells, table has {} columns",
                    row.len(),
                    self.columns
                )));
            }
            row.resize_with(self.columns, TableCell::default);
        }
        Ok(())
    }
}

impl Grid for Table {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.columns
    }

    fn cell_text(&self, row: usize, column: usize) -> Result<&str, GridError> {
        Ok(&self.cell(row, column)?.text)
    }

    fn set_cell_text(
        &mut self,
        row: usize,
        column: usize,
        text: &str,
        font_size: Option<u8>,
    ) -> Result<(), GridError> {
        let cell = self.cell_mut(row, column)?;
        cell.text = text.to_string();
        cell.hyperlink = None;
        if font_size.is_some() {
            cell.font_size = font_size;
        }
        Ok(())
    }

    fn set_cell_hyperlink(
        &mut self,
        row: usize,
        column: usize,
        text: &str,
        uri: &str,
        font_size: Option<u8>,
    ) -> Result<(), GridError> {
        self.set_cell_text(row, column, text, font_size)?;
        if !uri.is_empty() {
            self.rows[row][column].hyperlink = Some(uri.to_string());
        }
        Ok(())
    }

    fn insert_row(&mut self, at: usize) -> Result<(), GridError> {
        if at > self.rows.len() {
            return Err(GridError::RowOutOfRange {
                row: at,
                rows: self.rows.len(),
            });
        }
        self.rows.insert(at, vec![TableCell::default(); self.columns]);
        Ok(())
    }

    fn merge_column_range(&mut self, column: usize, first: usize, last: usize) -> Result<(), GridError> {
        if last < first {
            return Err(GridError::InvalidRange { first, last });
        }
        self.check(last, column)?;
        if first == last {
            return Ok(());
        }
        if self.rows[first..=last].iter().any(|r| r[column].vmerge.is_some()) {
            return Err(GridError::OverlappingRegion(MergedRegion::column(column, first, last)));
        }
        self.rows[first][column].vmerge = Some(VMerge::Restart);
        for row in &mut self.rows[first + 1..=last] {
            row[column].vmerge = Some(VMerge::Continue);
        }
        Ok(())
    }
}

/// A word-processing document: a title, free paragraphs and tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl ReportDocument {
    /// Decode a document, padding short table rows.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GridError> {
        let mut document: ReportDocument = serde_json::from_slice(bytes)?;
        for table in &mut document.tables {
            table.normalize()?;
        }
        Ok(document)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, GridError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(rows: usize) -> Table {
        let mut table = Table::new(3);
        for i in 0..rows {
            table.push_row(&[format!("r{i}")]).unwrap();
        }
        table
    }

    #[test]
    fn test_insert_row_is_blank() {
        let mut t = table(2);
        t.insert_row(1).unwrap();
        assert_eq!(t.row_count(), 3);
        assert_eq!(t.cell_text(1, 0).unwrap(), "");
        assert_eq!(t.cell_text(2, 0).unwrap(), "r1");
        t.insert_row(3).unwrap();
        assert!(matches!(t.insert_row(9), Err(GridError::RowOutOfRange { row: 9, .. })));
    }

    #[test]
    fn test_set_text_and_hyperlink() {
        let mut t = table(1);
        t.set_cell_text(0, 1, "name", Some(10)).unwrap();
        t.set_cell_hyperlink(0, 2, "42 (2019)", "https://x.org", Some(10)).unwrap();
        assert_eq!(t.cell(0, 1).unwrap().font_size, Some(10));
        assert_eq!(t.cell(0, 2).unwrap().hyperlink.as_deref(), Some("https://x.org"));
        t.set_cell_hyperlink(0, 1, "plain", "", None).unwrap();
        assert_eq!(t.cell(0, 1).unwrap().hyperlink, None);
        assert_eq!(t.cell(0, 1).unwrap().font_size, Some(10));
        assert!(matches!(
            t.set_cell_text(0, 3, "x", None),
            Err(GridError::ColumnOutOfRange { column: 3, .. })
        ));
    }

    #[test]
    fn test_merge_column_range() {
        let mut t = table(4);
        t.merge_column_range(0, 1, 3).unwrap();
        assert_eq!(t.merged_spans(0), vec![(1, 3)]);
        assert_eq!(t.cell(1, 0).unwrap().vmerge, Some(VMerge::Restart));
        assert_eq!(t.cell(3, 0).unwrap().vmerge, Some(VMerge::Continue));
        assert!(t.merged_spans(1).is_empty());
    }

    #[test]
    fn test_single_row_merge_is_noop() {
        let mut t = table(2);
        t.merge_column_range(0, 1, 1).unwrap();
        assert!(t.merged_spans(0).is_empty());
    }

    #[test]
    fn test_overlapping_merge_rejected() {
        let mut t = table(4);
        t.merge_column_range(0, 0, 1).unwrap();
        assert!(matches!(
            t.merge_column_range(0, 1, 2),
            Err(GridError::OverlappingRegion(_))
        ));
        assert!(matches!(t.merge_column_range(0, 3, 2), Err(GridError::InvalidRange { .. })));
    }

    #[test]
    fn test_document_codec_pads_rows() {
        let json = br#"{"title": "T", "tables": [{"columns": 3, "rows": [["a"], ["b", {"text": "c", "vmerge": "restart"}]]}]}"#;
        let doc = ReportDocument::from_bytes(json).unwrap();
        let t = &doc.tables[0];
        assert_eq!(t.cell_text(0, 2).unwrap(), "");
        assert_eq!(t.cell(1, 1).unwrap().vmerge, Some(VMerge::Restart));
        let again = ReportDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn test_document_rejects_wide_rows() {
        let json = br#"{"tables": [{"columns": 1, "rows": [["a", "b"]]}]}"#;
        assert!(matches!(ReportDocument::from_bytes(json), Err(GridError::Malformed(_))));
    }
}
