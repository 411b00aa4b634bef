//! Temp-dir workspace for file-backed tests.
//!
//! [`TestWorkspace`] writes the fixture catalog and a config file pointing
//! at it into a fresh temporary directory.

use std::path::{Path, PathBuf};

use logframe_config::AppConfig;
use tempfile::TempDir;

use crate::fixtures;

/// A test-scoped directory holding `catalog.json` and `logframe.toml`.
///
/// The directory is deleted when this value is dropped, even on panic.
pub struct TestWorkspace {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub catalog_path: PathBuf,
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Write the fixture catalog and a config whose remaining settings
    /// come from `extra_toml`.
    pub async fn with_toml(extra_toml: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let catalog_path = temp_dir.path().join("catalog.json");
        fixtures::catalog()
            .save(&catalog_path)
            .await
            .expect("failed to write fixture catalog");

        let config_path = temp_dir.path().join("logframe.toml");
        let toml = format!(
            "[catalog]\npath = {:?}\n\n{extra_toml}",
            catalog_path.display().to_string()
        );
        tokio::fs::write(&config_path, toml)
            .await
            .expect("failed to write test config");
        let config = AppConfig::load(&config_path)
            .await
            .expect("failed to parse test config");

        Self {
            config,
            config_path,
            catalog_path,
            temp_dir,
        }
    }

    /// Fixture catalog with default settings.
    pub async fn new() -> Self {
        Self::with_toml("").await
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name` inside the workspace and return its path.
    pub async fn write_file(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        tokio::fs::write(&path, content)
            .await
            .expect("failed to write workspace file");
        path
    }
}
