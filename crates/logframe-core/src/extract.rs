//! Indicator extraction pipeline.
//!
//! ```text
//!   Document ──► ExtractorRegistry ──► text ──► Scanner ──► rank ──► Vec<IndicatorView>
//!                    │ (by extension)               ▲
//!                    └─ dyn TextExtractor           └── Catalog::find_indicators(filter)
//! ```
//!
//! Progress runs `small, 2·small, 3·small, 4·small`, then one point per
//! scan tick, then 100.

use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError, IndicatorFilter};
use crate::model::IndicatorView;
use crate::progress::{ProgressSink, ProgressTracker};
use crate::rank;
use crate::scan::{self, CancelToken, ScanError, ScanOptions, Scanner};

/// Boxed error raised by a [`TextExtractor`].
pub type ExtractorError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from document extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to open file {file}")]
    FailedToOpenFile {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to process file {file}")]
    FailedToProcessFile {
        file: String,
        #[source]
        source: ExtractorError,
    },

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("no text extractor registered for {0} documents")]
    NoExtractor(DocumentKind),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("extraction cancelled")]
    Cancelled,
}

impl From<ScanError> for ExtractError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Cancelled => ExtractError::Cancelled,
        }
    }
}

/// Recognised document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Office Open XML word processing document.
    Docx,
    /// Legacy binary word document.
    Doc,
    /// UTF-8 plain text.
    PlainText,
}

impl DocumentKind {
    /// Resolve the kind from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Result<Self, ExtractError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "docx" => Ok(DocumentKind::Docx),
            "doc" => Ok(DocumentKind::Doc),
            "txt" => Ok(DocumentKind::PlainText),
            _ => Err(ExtractError::UnsupportedExtension(name.to_string())),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Docx => write!(f, ".docx"),
            DocumentKind::Doc => write!(f, ".doc"),
            DocumentKind::PlainText => write!(f, ".txt"),
        }
    }
}

/// An uploaded document: its original file name and raw bytes.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk using async I/O.
    pub async fn open(path: &Path) -> Result<Self, ExtractError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ExtractError::FailedToOpenFile {
                file: file_name.clone(),
                source,
            })?;
        Ok(Self { file_name, bytes })
    }

    pub fn kind(&self) -> Result<DocumentKind, ExtractError> {
        DocumentKind::from_file_name(&self.file_name)
    }
}

/// Flattens one document format into its text body.
pub trait TextExtractor: Send + Sync {
    /// The format this extractor understands.
    fn kind(&self) -> DocumentKind;

    /// Extract the document body as plain text.
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractorError>;
}

/// Treats the bytes as UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::PlainText
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractorError> {
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

/// Reads the body of an Office Open XML document.
///
/// Text runs (`w:t`) are concatenated. Paragraph ends become newlines;
/// tabs and breaks become spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

impl DocxExtractor {
    /// Archive entry holding the main document part.
    pub const DOCUMENT_PART: &'static str = "word/document.xml";
}

impl TextExtractor for DocxExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Docx
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractorError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut xml = String::new();
        archive.by_name(Self::DOCUMENT_PART)?.read_to_string(&mut xml)?;
        Ok(document_text(&xml)?)
    }
}

/// Collect the text runs of a `word/document.xml` body.
fn document_text(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) if matches!(e.name().as_ref(), b"w:tab" | b"w:br" | b"w:cr") => text.push(' '),
            Event::Text(t) if in_run => text.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

/// Registry of text extractors, keyed by document kind.
pub struct ExtractorRegistry {
    extractors: HashMap<DocumentKind, Box<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register an extractor, replacing any previous one for its kind.
    pub fn register(&mut self, extractor: Box<dyn TextExtractor>) {
        self.extractors.insert(extractor.kind(), extractor);
    }

    pub fn get(&self, kind: DocumentKind) -> Option<&dyn TextExtractor> {
        self.extractors.get(&kind).map(|e| e.as_ref())
    }

    /// Kinds with a registered extractor.
    pub fn kinds(&self) -> Vec<DocumentKind> {
        self.extractors.keys().copied().collect()
    }

    /// Resolve the document's kind and extract its text.
    pub fn extract(&self, document: &Document) -> Result<String, ExtractError> {
        let kind = document.kind()?;
        let extractor = self.get(kind).ok_or(ExtractError::NoExtractor(kind))?;
        extractor
            .extract_text(&document.bytes)
            .map_err(|source| ExtractError::FailedToProcessFile {
                file: document.file_name.clone(),
                source,
            })
    }
}

impl Default for ExtractorRegistry {
    /// A registry with the `.docx` and plain-text extractors.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DocxExtractor));
        registry.register(Box::new(PlainTextExtractor));
        registry
    }
}

/// Runs the whole extraction: catalog lookup, text extraction, scan, rank.
pub struct IndicatorExtractor {
    catalog: Arc<dyn Catalog>,
    extractors: ExtractorRegistry,
    options: ScanOptions,
}

impl IndicatorExtractor {
    pub fn new(catalog: Arc<dyn Catalog>, extractors: ExtractorRegistry, options: ScanOptions) -> Self {
        Self {
            catalog,
            extractors,
            options,
        }
    }

    /// Find the catalog indicators evidenced by `document`, ranked.
    ///
    /// Either the full ranked list is returned or the call fails; there
    /// is no partial result.
    pub fn extract_indicators(
        &self,
        document: &Document,
        filter: &IndicatorFilter,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Vec<IndicatorView>, ExtractError> {
        let kind = document.kind()?;
        let step = self.options.small_task_percent;
        let mut tracker = ProgressTracker::new(progress);

        tracker.set(step);
        let indicators = self.catalog.find_indicators(filter)?;
        tracker.advance(step);

        if indicators.is_empty() {
            warn!(file = %document.file_name, "No indicators to search for");
            tracker.complete();
            return Ok(Vec::new());
        }

        let window = scan::max_phrase_words(&indicators);
        tracker.advance(step);

        info!(
            file = %document.file_name,
            %kind,
            indicators = indicators.len(),
            window,
            "Searching indicators in document"
        );
        let text = self.extractors.extract(document)?;
        tracker.advance(step);

        let matches = Scanner::with_window(&indicators, window, self.options).scan(&text, &mut tracker, cancel)?;

        let ranked = if matches.is_empty() {
            Vec::new()
        } else {
            let levels = self.catalog.list_levels_by_priority()?;
            rank::rank(matches.into_entries(), &levels)
        };
        debug!(matched = ranked.len(), "Ranked matched indicators");

        tracker.complete();
        Ok(ranked)
    }
}
