#![deny(unsafe_code)]

//! Logframe indicator engine.
//!
//! Two engines share this crate. The extraction engine scans a document's
//! text with a sliding word window against every catalog indicator's
//! keyword phrases and ranks the hits by result-chain level. The template
//! engine writes a ranked selection into the narrative and donor report
//! templates, growing them when a level has more indicators than the
//! template has room for.
//!
//! ```text
//!   Document ──► TextExtractor ──► tokens ──► Scanner ──► rank ──► IndicatorView[]
//!                                               │                       │
//!                                          ProgressSink           ReportService
//!                                                                       │
//!                                        narrative / donor / flat worksheet bytes
//! ```

/// Indicator catalog port and the JSON-backed in-memory catalog.
pub mod catalog;
/// Donor report populator (fixed four-row slots per level).
pub mod donor;
/// Document text extraction and the end-to-end extraction pipeline.
pub mod extract;
/// Template grids: document tables and worksheets.
pub mod grid;
/// Keyword phrase parsing and normalisation.
pub mod keywords;
/// Catalog entities and view projections.
pub mod model;
/// Narrative report populator (one row per indicator).
pub mod narrative;
/// Progress reporting port and transports.
pub mod progress;
/// Deterministic ordering of matched indicators.
pub mod rank;
/// Report rendering service.
pub mod report;
/// Level-to-partition role mapping.
pub mod roles;
/// Sliding-window keyword matcher.
pub mod scan;
/// Template resources.
pub mod templates;
/// Word tokenizer.
pub mod tokenize;
/// Flat indicator worksheet export and import.
pub mod worksheet;

pub use catalog::{Catalog, CatalogError, CatalogSnapshot, FilterOptions, IndicatorFilter, MemoryCatalog};
pub use extract::{
    Document, DocumentKind, DocxExtractor, ExtractError, ExtractorRegistry, IndicatorExtractor, PlainTextExtractor,
    TextExtractor,
};
pub use grid::{Grid, GridError, MergedRegion, ReportDocument, Sheet, Worksheet};
pub use model::{Indicator, IndicatorId, IndicatorSelection, IndicatorView, Level, LevelId};
pub use progress::{ChannelProgress, NoopProgress, ProgressRecorder, ProgressSink, ProgressTracker};
pub use report::{RenderError, ReportService};
pub use roles::LevelRoles;
pub use scan::{CancelToken, MatchMap, ScanError, ScanOptions, Scanner};
pub use templates::TemplateStore;
