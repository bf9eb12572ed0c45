use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{
    config::Config,
    storage::{schema::TableSchema, storage_manager::StorageManager},
    types::{error::DatabaseError, record::Row},
};

/// Throwaway database directory for tests and benchmarks; removed on drop.
pub struct TempDatabase {
    dir: TempDir,
    pub config: Config,
    pub storage_manager: Option<StorageManager>,
}

impl TempDatabase {
    pub fn new() -> Self {
        Self::with_prefix("slotdb_test")
    }

    pub fn with_prefix(prefix: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .expect("failed to create temp dir");
        let config = Config::rooted_at(dir.path());
        Self {
            dir,
            config,
            storage_manager: None,
        }
    }

    /// Same as `with_prefix`, with a custom partition count for joins
    pub fn with_partitions(prefix: &str, partition_count: usize) -> Self {
        let mut db = Self::with_prefix(prefix);
        db.config.partition_count = partition_count.max(1);
        db
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn table_path(&self, table_name: &str) -> PathBuf {
        self.config.table_path(table_name)
    }

    pub fn create_storage_manager(&mut self) -> Result<&mut StorageManager, DatabaseError> {
        let sm = StorageManager::open(self.config.clone())?;
        Ok(self.storage_manager.insert(sm))
    }

    /// Open the storage, create `schema` and load `rows` into it.
    pub fn create_table_with_rows(
        &mut self,
        schema: TableSchema,
        rows: &[&[&str]],
    ) -> Result<&mut StorageManager, DatabaseError> {
        let sm = match self.storage_manager.take() {
            Some(sm) => sm,
            None => StorageManager::open(self.config.clone())?,
        };
        let sm = self.storage_manager.insert(sm);
        let table_name = schema.table_name.clone();
        sm.create_table(schema)?;
        for values in rows {
            sm.insert_tuple(&table_name, Row::from_strs(values))?;
        }
        Ok(sm)
    }
}

impl Default for TempDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        self.storage_manager = None;
    }
}
