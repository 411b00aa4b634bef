//! Report template resources.
//!
//! Templates are looked up by name: `<dir>/<name>.json` when a directory
//! is configured, otherwise one of the resources compiled into the crate.

use std::path::PathBuf;

use logframe_config::TemplatesConfig;
use tracing::debug;

use crate::grid::{ReportDocument, Worksheet};
use crate::report::RenderError;

/// Name of the shipped narrative report template.
pub const NARRATIVE_REPORT: &str = "narrative_report";
/// Name of the shipped donor report template.
pub const DONOR_REPORT: &str = "donor_report";

const BUILTIN: [(&str, &str); 2] = [
    (NARRATIVE_REPORT, include_str!("../templates/narrative_report.json")),
    (DONOR_REPORT, include_str!("../templates/donor_report.json")),
];

/// Where template bytes come from.
#[derive(Debug, Clone, Default)]
pub enum TemplateStore {
    /// The resources compiled into the crate.
    #[default]
    Builtin,
    /// A directory of `<name>.json` files.
    Dir(PathBuf),
}

impl TemplateStore {
    pub fn from_config(config: &TemplatesConfig) -> Self {
        match &config.dir {
            Some(dir) => TemplateStore::Dir(PathBuf::from(dir)),
            None => TemplateStore::Builtin,
        }
    }

    /// Raw bytes of the template called `name`.
    pub async fn load(&self, name: &str) -> Result<Vec<u8>, RenderError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(RenderError::TemplateNotFound(name.to_string()));
        }
        match self {
            TemplateStore::Builtin => BUILTIN
                .iter()
                .find(|(builtin, _)| *builtin == name)
                .map(|(_, content)| content.as_bytes().to_vec())
                .ok_or_else(|| RenderError::TemplateNotFound(name.to_string())),
            TemplateStore::Dir(dir) => {
                let path = dir.join(format!("{name}.json"));
                debug!(path = %path.display(), "Loading template");
                tokio::fs::read(&path)
                    .await
                    .map_err(|_| RenderError::TemplateNotFound(name.to_string()))
            }
        }
    }

    /// Load and decode a document template.
    pub async fn load_document(&self, name: &str) -> Result<ReportDocument, RenderError> {
        let bytes = self.load(name).await?;
        ReportDocument::from_bytes(&bytes).map_err(|source| RenderError::InvalidTemplate {
            name: name.to_string(),
            source,
        })
    }

    /// Load and decode a worksheet template.
    pub async fn load_worksheet(&self, name: &str) -> Result<Worksheet, RenderError> {
        let bytes = self.load(name).await?;
        Worksheet::from_bytes(&bytes).map_err(|source| RenderError::InvalidTemplate {
            name: name.to_string(),
            source,
        })
    }
}
