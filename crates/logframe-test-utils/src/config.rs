//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use logframe_config::{AppConfig, DonorPartition};

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .catalog_path("/tmp/catalog.json")
///     .budget_percent(50)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn catalog_path(mut self, path: &str) -> Self {
        self.config.catalog.path = path.to_string();
        self
    }

    pub fn budget_percent(mut self, percent: u8) -> Self {
        self.config.scan.budget_percent = percent;
        self
    }

    pub fn small_task_percent(mut self, percent: u8) -> Self {
        self.config.scan.small_task_percent = percent;
        self
    }

    pub fn templates_dir(mut self, dir: &str) -> Self {
        self.config.templates.dir = Some(dir.to_string());
        self
    }

    pub fn font_size(mut self, size: u8) -> Self {
        self.config.templates.font_size = size;
        self
    }

    /// Change the slot count of the donor partition at `index`.
    pub fn donor_slots(mut self, index: usize, slots: usize) -> Self {
        if let Some(partition) = self.config.donor.partitions.get_mut(index) {
            *partition = DonorPartition {
                slots,
                ..partition.clone()
            };
        }
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
