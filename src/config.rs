//! Configuration for slotdb
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

/// Main configuration for a slotdb instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding one file per table plus the catalog file
    pub data_dir: PathBuf,

    /// File name of the persisted catalog inside `data_dir`
    pub catalog_file: String,

    // -------------------------------------------------------------------------
    // Join Configuration
    // -------------------------------------------------------------------------
    /// Directory for scratch partition files (`{table}.{column}-part{k}`)
    pub temp_dir: PathBuf,

    /// Number of buckets each join side is partitioned into
    pub partition_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./files"),
            catalog_file: "catalog.bin".to_string(),
            temp_dir: PathBuf::from("./tempFiles"),
            partition_count: 3,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Config rooted at a single directory, with `files/` and `tempFiles/` below it
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::builder()
            .data_dir(root.join("files"))
            .temp_dir(root.join("tempFiles"))
            .build()
    }

    pub fn table_path(&self, table_name: &str) -> PathBuf {
        self.data_dir.join(table_name)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(&self.catalog_file)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the table data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the catalog file name
    pub fn catalog_file(mut self, name: impl Into<String>) -> Self {
        self.config.catalog_file = name.into();
        self
    }

    /// Set the scratch directory for partition files
    pub fn temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = path.into();
        self
    }

    /// Set the number of join partitions (clamped to at least one)
    pub fn partition_count(mut self, count: usize) -> Self {
        self.config.partition_count = count.max(1);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
