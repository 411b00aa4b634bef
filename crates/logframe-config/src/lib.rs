#![deny(unsafe_code)]

//! Configuration loading and validation for the logframe indicator engine.
//!
//! Loads TOML configuration files and validates them before use. Provides
//! the [`AppConfig`] type as the central configuration structure, and the
//! [`layout`] module describing how result-chain levels map onto the
//! report templates.

/// Result-chain roles and template layout settings.
pub mod layout;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use layout::{
    DonorConfig, DonorPartition, LevelRole, LevelsConfig, NarrativeConfig, NarrativePartition,
};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Indicator catalog location.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Document scan settings.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Level role assignment.
    #[serde(default)]
    pub levels: LevelsConfig,

    /// Template resources.
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Narrative report table layout.
    #[serde(default)]
    pub narrative: NarrativeConfig,

    /// Donor report worksheet layout.
    #[serde(default)]
    pub donor: DonorConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Indicator catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the JSON catalog holding levels and indicators.
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> String {
    "catalog.json".to_string()
}

/// Document scan configuration.
///
/// Progress is reported as a percentage: a few fixed steps of
/// `small_task_percent` for setup work, then at most `budget_percent`
/// single-point ticks while the document is scanned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Percentage points reserved for the sliding-window pass.
    #[serde(default = "default_budget_percent")]
    pub budget_percent: u8,

    /// Percentage points reported for each setup step.
    #[serde(default = "default_small_task_percent")]
    pub small_task_percent: u8,

    /// Capacity of the progress channel; updates beyond it are dropped.
    #[serde(default = "default_progress_buffer")]
    pub progress_buffer: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            budget_percent: default_budget_percent(),
            small_task_percent: default_small_task_percent(),
            progress_buffer: default_progress_buffer(),
        }
    }
}

fn default_budget_percent() -> u8 {
    70
}

fn default_small_task_percent() -> u8 {
    5
}

fn default_progress_buffer() -> usize {
    64
}

/// Template resource configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory holding `<name>.json` templates. When unset, the
    /// templates compiled into the binary are used.
    #[serde(default)]
    pub dir: Option<String>,

    /// Name of the narrative report template.
    #[serde(default = "default_narrative_template")]
    pub narrative: String,

    /// Name of the donor report template.
    #[serde(default = "default_donor_template")]
    pub donor: String,

    /// Font size for text written into the narrative table.
    #[serde(default = "default_font_size")]
    pub font_size: u8,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: None,
            narrative: default_narrative_template(),
            donor: default_donor_template(),
            font_size: default_font_size(),
        }
    }
}

fn default_narrative_template() -> String {
    "narrative_report".to_string()
}

fn default_donor_template() -> String {
    "donor_report".to_string()
}

fn default_font_size() -> u8 {
    10
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading configuration");
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.path.is_empty() {
            return Err(ConfigError::Validation(
                "catalog.path must not be empty".to_string(),
            ));
        }

        // Validate scan config
        if self.scan.budget_percent == 0 {
            return Err(ConfigError::Validation(
                "scan.budget_percent must be at least 1".to_string(),
            ));
        }
        let reserved = u32::from(self.scan.budget_percent)
            + 4 * u32::from(self.scan.small_task_percent);
        if reserved > 100 {
            return Err(ConfigError::Validation(format!(
                "scan.budget_percent + 4 * scan.small_task_percent must not exceed 100, got {reserved}"
            )));
        }
        if self.scan.progress_buffer == 0 {
            return Err(ConfigError::Validation(
                "scan.progress_buffer must be at least 1".to_string(),
            ));
        }

        // Validate level roles
        for required in [LevelRole::Impact, LevelRole::Outcome, LevelRole::Output] {
            let count = self.levels.roles.iter().filter(|r| **r == required).count();
            if count != 1 {
                return Err(ConfigError::Validation(format!(
                    "levels.roles must name {required} exactly once, found {count}"
                )));
            }
        }

        // Validate templates config
        if self.templates.narrative.is_empty() || self.templates.donor.is_empty() {
            return Err(ConfigError::Validation(
                "templates.narrative and templates.donor must not be empty".to_string(),
            ));
        }
        if self.templates.font_size == 0 {
            return Err(ConfigError::Validation(
                "templates.font_size must be non-zero".to_string(),
            ));
        }

        // Validate narrative layout
        if self.narrative.first_row == 0 {
            return Err(ConfigError::Validation(
                "narrative.first_row must be at least 1 (row 0 is the header)".to_string(),
            ));
        }
        if self.narrative.partitions.is_empty() {
            return Err(ConfigError::Validation(
                "narrative.partitions must not be empty".to_string(),
            ));
        }
        let mut merge_columns = HashSet::new();
        for column in &self.narrative.merge_columns {
            if !merge_columns.insert(*column) {
                return Err(ConfigError::Validation(format!(
                    "narrative.merge_columns lists column {column} twice"
                )));
            }
        }
        for (name, column) in [
            ("name_column", self.narrative.name_column),
            ("baseline_column", self.narrative.baseline_column),
            ("verification_column", self.narrative.verification_column),
        ] {
            if merge_columns.contains(&column) {
                return Err(ConfigError::Validation(format!(
                    "narrative.{name} ({column}) must not be a merged column"
                )));
            }
        }
        check_disjoint_roles(
            "narrative.partitions",
            self.narrative.partitions.iter().map(|p| p.roles.as_slice()),
        )?;

        // Validate donor layout
        if self.donor.first_row == 0 {
            return Err(ConfigError::Validation(
                "donor.first_row must be at least 1 (row 0 is the header)".to_string(),
            ));
        }
        if self.donor.partitions.is_empty() {
            return Err(ConfigError::Validation(
                "donor.partitions must not be empty".to_string(),
            ));
        }
        for (i, partition) in self.donor.partitions.iter().enumerate() {
            if partition.slots == 0 {
                return Err(ConfigError::Validation(format!(
                    "donor.partitions[{i}].slots must be at least 1"
                )));
            }
        }
        check_disjoint_roles(
            "donor.partitions",
            self.donor.partitions.iter().map(|p| p.roles.as_slice()),
        )?;

        Ok(())
    }
}

/// Reject partitions without roles and roles claimed by two partitions.
fn check_disjoint_roles<'a>(
    section: &str,
    partitions: impl Iterator<Item = &'a [LevelRole]>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (i, roles) in partitions.enumerate() {
        if roles.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{section}[{i}].roles must not be empty"
            )));
        }
        for role in roles {
            if !seen.insert(*role) {
                return Err(ConfigError::Validation(format!(
                    "{section}[{i}] claims role {role} already used by another partition"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.catalog.path, "catalog.json");
        assert_eq!(config.scan.budget_percent, 70);
        assert_eq!(config.scan.small_task_percent, 5);
        assert_eq!(config.templates.font_size, 10);
        assert!(config.templates.dir.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.scan.budget_percent, 70);
        assert_eq!(config.narrative.merge_columns, vec![0, 1, 7]);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [catalog]
            path = "/var/lib/logframe/catalog.json"

            [scan]
            budget_percent = 60
            small_task_percent = 10

            [levels]
            roles = ["impact", "outcome", "output"]

            [templates]
            dir = "/etc/logframe/templates"
            font_size = 11

            [[donor.partitions]]
            roles = ["impact"]
            slots = 2
            fill_baseline = true

            [[donor.partitions]]
            roles = ["outcome", "output"]
            slots = 4

            [logging]
            level = "debug"
        "#;
        let config = AppConfig::parse(toml).unwrap();
        assert_eq!(config.catalog.path, "/var/lib/logframe/catalog.json");
        assert_eq!(config.scan.budget_percent, 60);
        assert_eq!(config.levels.roles.len(), 3);
        assert_eq!(
            config.templates.dir.as_deref(),
            Some("/etc/logframe/templates")
        );
        assert_eq!(config.donor.partitions.len(), 2);
        assert_eq!(config.donor.partitions[1].slots, 4);
        assert!(!config.donor.partitions[1].resplice_boundary);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_zero_budget() {
        let toml = r#"
            [scan]
            budget_percent = 0
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_progress_over_100() {
        let toml = r#"
            [scan]
            budget_percent = 90
            small_task_percent = 5
        "#;
        let err = AppConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("must not exceed 100"), "{err}");
    }

    #[test]
    fn test_validation_requires_each_core_role_once() {
        let toml = r#"
            [levels]
            roles = ["impact", "impact", "output"]
        "#;
        let err = AppConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("impact"), "{err}");
    }

    #[test]
    fn test_validation_rejects_unknown_role() {
        let toml = r#"
            [levels]
            roles = ["impact", "outcome", "output", "activity"]
        "#;
        assert!(matches!(AppConfig::parse(toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_rejects_zero_slots() {
        let toml = r#"
            [[donor.partitions]]
            roles = ["impact", "outcome", "output"]
            slots = 0
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_shared_role() {
        let toml = r#"
            [[narrative.partitions]]
            roles = ["impact", "outcome"]

            [[narrative.partitions]]
            roles = ["outcome", "output"]
        "#;
        let err = AppConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("outcome"), "{err}");
    }

    #[test]
    fn test_validation_rejects_empty_partition_roles() {
        let toml = r#"
            [[narrative.partitions]]
            roles = []
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_name_column_in_merge_set() {
        let toml = r#"
            [narrative]
            name_column = 1
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_header_row_as_first_row() {
        let toml = r#"
            [donor]
            first_row = 0
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_catalog_path() {
        let toml = r#"
            [catalog]
            path = ""
        "#;
        assert!(AppConfig::parse(toml).is_err());
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[test_log::test(tokio::test)]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logframe.toml");
        tokio::fs::write(&path, b"[scan]\nbudget_percent = 50\n")
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.scan.budget_percent, 50);
    }

    #[test_log::test(tokio::test)]
    async fn test_load_nonexistent_file() {
        let result = AppConfig::load(Path::new("/nonexistent/file.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_load_invalid_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, b"not valid toml [[[").await.unwrap();

        let result = AppConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    // ── Error display ─────────────────────────────────────────────────

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = AppConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed = AppConfig::parse(&rendered).unwrap();
        assert_eq!(parsed.donor, config.donor);
        assert_eq!(parsed.narrative, config.narrative);
        assert_eq!(parsed.levels, config.levels);
    }
}
