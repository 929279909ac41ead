use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Index and data store locations
    #[validate(nested)]
    pub directory: DirectoryConfig,

    /// Result and chart limits
    #[validate(nested)]
    #[serde(default)]
    pub explorer: ExplorerConfig,

    /// Query construction and scrolling
    #[validate(nested)]
    #[serde(default)]
    pub search: SearchSettings,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and environment
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let config_path = path
            .map(|p| p.to_string_lossy().into_owned())
            .or_else(|| std::env::var("DATAPAGES_CONFIG").ok());

        let mut builder = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ));

        if let Some(config_path) = config_path {
            builder = builder.add_source(config::File::with_name(&config_path).required(true));
        }

        builder
            // Override with environment variables (prefix: DATAPAGES__)
            .add_source(
                config::Environment::with_prefix("DATAPAGES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load and validate in one step
    pub fn load_validated(path: Option<&Path>) -> crate::error::Result<Self> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the named index under the configured root
    pub fn index_path(&self, index_name: &str) -> PathBuf {
        self.directory.index_address.join(index_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: DirectoryConfig::default(),
            explorer: ExplorerConfig::default(),
            search: SearchSettings::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DirectoryConfig {
    /// Root directory holding the spec directory index and the data store
    pub index_address: PathBuf,

    /// Name of the index holding spec records
    #[validate(length(min = 1))]
    #[serde(default = "default_spec_index_name")]
    pub spec_index_name: String,

    /// Name of the data store holding the explored dataset
    #[validate(length(min = 1))]
    #[serde(default = "default_data_index_name")]
    pub data_index_name: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            index_address: PathBuf::from("./data"),
            spec_index_name: default_spec_index_name(),
            data_index_name: default_data_index_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExplorerConfig {
    /// Number of search results kept for selection
    #[validate(range(min = 1))]
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Maximum rows in a categorical chart
    #[validate(range(min = 1))]
    #[serde(default = "default_chart_limit")]
    pub chart_limit: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
            chart_limit: default_chart_limit(),
        }
    }
}

/// Which query variant the explorer builds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    MultiField,
    SingleField,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchSettings {
    /// Query variant
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Boosted field for multi-field queries, and the only field for single-field queries
    #[validate(length(min = 1))]
    #[serde(default = "default_primary_field")]
    pub primary_field: String,

    /// Unboosted field for multi-field queries
    #[validate(length(min = 1))]
    #[serde(default = "default_secondary_field")]
    pub secondary_field: String,

    /// Weight of the primary field relative to the secondary one
    #[validate(range(min = 1))]
    #[serde(default = "default_boost")]
    pub boost: i64,

    /// Edit distance for single-field queries
    #[validate(range(min = 0, max = 2))]
    #[serde(default = "default_fuzziness")]
    pub fuzziness: i64,

    /// Documents fetched per scroll page
    #[validate(range(min = 1))]
    #[serde(default = "default_scroll_page_size")]
    pub scroll_page_size: usize,

    /// Index writer heap size in bytes, used by ingest
    #[validate(range(min = 15000000))]
    #[serde(default = "default_writer_heap_size")]
    pub writer_heap_size: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            primary_field: default_primary_field(),
            secondary_field: default_secondary_field(),
            boost: default_boost(),
            fuzziness: default_fuzziness(),
            scroll_page_size: default_scroll_page_size(),
            writer_heap_size: default_writer_heap_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// Default value functions
fn default_spec_index_name() -> String {
    "directory".to_string()
}

fn default_data_index_name() -> String {
    "olist".to_string()
}

fn default_result_limit() -> usize {
    5
}

fn default_chart_limit() -> usize {
    10
}

fn default_primary_field() -> String {
    "title".to_string()
}

fn default_secondary_field() -> String {
    "description".to_string()
}

fn default_boost() -> i64 {
    2
}

fn default_fuzziness() -> i64 {
    1
}

fn default_scroll_page_size() -> usize {
    500
}

fn default_writer_heap_size() -> usize {
    50_000_000 // 50MB
}

fn default_log_level() -> String {
    "info".to_string()
}
