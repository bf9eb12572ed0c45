//! Table engine: CRUD over fixed-length-record table files plus the hash
//! equi-join entry point.
//!
//! A table file is shared mutable state with a single-writer assumption. The
//! allocate/free sequences (read header, read/write a block, write header)
//! are several independent I/Os; callers must not let another process mutate
//! the same file while an operation runs. Inside one process `&mut self` on
//! every mutating method enforces this.

use std::{fs, path::PathBuf};

use tracing::info;

use crate::{
    config::Config,
    executor::{
        create_table::{CreateTableExecutor, TableCreator},
        delete::TableDeleter,
        hash_join::{HashJoinExecutor, JoinInput, JoinResult},
        insert::{Inserter, TableInserter},
        partition::{Partitioner, remove_partition_files},
        predicate::PrimaryKeyPredicate,
        scan::{ScanIterator, Scanner},
        sequential_scan::SequentialScanner,
    },
    storage::{
        block_store::BlockStore,
        catalog::{Catalog, SchemaManager},
        free_space::{FreeList, FreeSpaceManager},
        schema::TableSchema,
    },
    types::{RecordLocation, SlotId, error::DatabaseError, record::Row},
};

pub struct StorageManager<C: Catalog = SchemaManager> {
    pub config: Config,
    catalog: C,
}

impl StorageManager<SchemaManager> {
    /// Open (or initialize) the data directory described by `config`,
    /// loading the catalog persisted there.
    pub fn open(config: Config) -> Result<Self, DatabaseError> {
        fs::create_dir_all(&config.data_dir)?;
        let catalog = SchemaManager::open(config.catalog_path())?;
        Self::with_catalog(config, catalog)
    }
}

impl<C: Catalog> StorageManager<C> {
    /// Use an externally supplied catalog
    pub fn with_catalog(config: Config, catalog: C) -> Result<Self, DatabaseError> {
        fs::create_dir_all(&config.data_dir)?;
        fs::create_dir_all(&config.temp_dir)?;
        info!(
            "Storage opened at {} ({} tables)",
            config.data_dir.display(),
            catalog.table_names().len()
        );
        Ok(Self { config, catalog })
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn table_path(&self, table_name: &str) -> PathBuf {
        self.config.table_path(table_name)
    }

    /// Schema from the catalog; `TableNotFound` if unknown
    pub fn get_table_schema(&self, table_name: &str) -> Result<TableSchema, DatabaseError> {
        self.catalog.table_schema(table_name)
    }

    fn open_table(&self, table_name: &str) -> Result<(TableSchema, BlockStore), DatabaseError> {
        let schema = self.get_table_schema(table_name)?;
        let path = self.table_path(table_name);
        if !path.is_file() {
            return Err(DatabaseError::TableNotFound {
                name: table_name.to_string(),
            });
        }
        Ok((schema, BlockStore::open(path)?))
    }

    /// A table exists when it has both catalog metadata and a file
    pub fn table_exists(&self, table_name: &str) -> bool {
        self.catalog.table_metadata_exists(table_name) && self.table_path(table_name).is_file()
    }

    /// Get all table names that have both metadata and a file
    pub fn get_table_names(&self) -> Vec<String> {
        self.catalog
            .table_names()
            .into_iter()
            .filter(|name| self.table_path(name).is_file())
            .collect()
    }

    pub fn create_table(&mut self, schema: TableSchema) -> Result<(), DatabaseError> {
        CreateTableExecutor::new(&self.config.data_dir).create_table(&mut self.catalog, schema)
    }

    /// Remove the table file, its scratch partitions and its metadata
    pub fn drop_table(&mut self, table_name: &str) -> Result<(), DatabaseError> {
        if !self.catalog.table_metadata_exists(table_name) {
            return Err(DatabaseError::TableNotFound {
                name: table_name.to_string(),
            });
        }
        let path = self.table_path(table_name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        remove_partition_files(&self.config.temp_dir, table_name, None)?;
        self.catalog.remove_table(table_name)?;
        info!("Dropped table '{}'", table_name);
        Ok(())
    }

    /// Create a table inserter for the specified table
    pub fn create_inserter(&self, table_name: &str) -> Result<TableInserter, DatabaseError> {
        let (schema, store) = self.open_table(table_name)?;
        Ok(TableInserter::new(schema, store))
    }

    pub fn insert_tuple(&mut self, table_name: &str, row: Row) -> Result<SlotId, DatabaseError> {
        self.create_inserter(table_name)?.insert(row)
    }

    /// Insert multiple rows; every row is encoded before the first write
    pub fn insert_batch(&mut self, table_name: &str, rows: Vec<Row>) -> Result<Vec<SlotId>, DatabaseError> {
        self.create_inserter(table_name)?.insert_batch(rows)
    }

    pub fn delete_tuple<V: AsRef<[u8]>>(
        &mut self,
        table_name: &str,
        pk_values: &[V],
    ) -> Result<SlotId, DatabaseError> {
        let (schema, store) = self.open_table(table_name)?;
        TableDeleter::new(schema, store).delete(pk_values)
    }

    /// Create a sequential scanner for the specified table
    pub fn create_scanner(&self, table_name: &str) -> Result<SequentialScanner, DatabaseError> {
        let (schema, store) = self.open_table(table_name)?;
        Ok(SequentialScanner::for_table(store, &schema))
    }

    /// Lazy, restartable sequence of decoded live records
    pub fn full_scan(&self, table_name: &str) -> Result<ScanIterator<SequentialScanner>, DatabaseError> {
        Ok(ScanIterator::new(self.create_scanner(table_name)?))
    }

    /// Scan all rows from a table into memory
    pub fn scan_table(&self, table_name: &str) -> Result<Vec<Row>, DatabaseError> {
        let mut scanner = self.create_scanner(table_name)?;
        let mut rows = Vec::new();
        while let Some(row) = scanner.scan()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Linear search for the first live record with the given primary key
    pub fn point_lookup_by_pk<V: AsRef<[u8]>>(
        &self,
        table_name: &str,
        pk_values: &[V],
    ) -> Result<Option<RecordLocation>, DatabaseError> {
        let (schema, store) = self.open_table(table_name)?;
        let mut scanner = SequentialScanner::for_table(store, &schema);
        let found = PrimaryKeyPredicate::new(pk_values).find_first(&mut scanner, &schema)?;
        Ok(found.map(|record| record.location))
    }

    /// Same search as `point_lookup_by_pk`, returning the decoded row
    pub fn get_by_pk<V: AsRef<[u8]>>(
        &self,
        table_name: &str,
        pk_values: &[V],
    ) -> Result<Option<Row>, DatabaseError> {
        let (schema, store) = self.open_table(table_name)?;
        let mut scanner = SequentialScanner::for_table(store, &schema);
        match PrimaryKeyPredicate::new(pk_values).find_first(&mut scanner, &schema)? {
            Some(record) => Ok(Some(schema.decode_record(&record.bytes)?)),
            None => Ok(None),
        }
    }

    /// Current head pointer of the table's free list
    pub fn header_pointer(&self, table_name: &str) -> Result<SlotId, DatabaseError> {
        let (schema, store) = self.open_table(table_name)?;
        FreeSpaceManager::new(&store, table_name, schema.record_length())?.read_header()
    }

    /// Explicitly freed slots in reuse order, plus the linear cursor
    pub fn free_list(&self, table_name: &str) -> Result<FreeList, DatabaseError> {
        let (schema, store) = self.open_table(table_name)?;
        FreeSpaceManager::new(&store, table_name, schema.record_length())?.free_list()
    }

    /// Grace hash equi-join of `left.left_column = right.right_column`.
    ///
    /// Partition files of both sides are recreated in `temp_dir`; two joins
    /// over the same table and column must not run at the same time.
    pub fn hash_equi_join(
        &self,
        (left_table, left_column): (&str, &str),
        (right_table, right_column): (&str, &str),
    ) -> Result<JoinResult, DatabaseError> {
        let (left_schema, left_store) = self.open_table(left_table)?;
        let (right_schema, right_store) = self.open_table(right_table)?;
        // Fail on unknown columns before any scratch file is touched
        left_schema.column_range(left_column)?;
        right_schema.column_range(right_column)?;

        let partitioner = Partitioner::new(&self.config.temp_dir, self.config.partition_count);
        HashJoinExecutor::new(partitioner).execute(
            JoinInput {
                store: left_store,
                schema: left_schema,
                column: left_column.to_string(),
            },
            JoinInput {
                store: right_store,
                schema: right_schema,
                column: right_column.to_string(),
            },
        )
    }
}
