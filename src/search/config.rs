//! Search service configuration

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Root directory holding one sub-directory per named index
    pub index_root: PathBuf,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Number of documents fetched per scroll page
    pub scroll_page_size: usize,
}

impl SearchConfig {
    /// Path of the named index
    pub fn index_path(&self, index: &str) -> PathBuf {
        self.index_root.join(index)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_root: PathBuf::from("./data"),
            writer_heap_size: 50_000_000, // 50MB
            scroll_page_size: 500,
        }
    }
}

impl From<&Config> for SearchConfig {
    fn from(config: &Config) -> Self {
        Self {
            index_root: config.directory.index_address.clone(),
            writer_heap_size: config.search.writer_heap_size,
            scroll_page_size: config.search.scroll_page_size,
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_root(mut self, path: PathBuf) -> Self {
        self.config.index_root = path;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn scroll_page_size(mut self, size: usize) -> Self {
        self.config.scroll_page_size = size;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
