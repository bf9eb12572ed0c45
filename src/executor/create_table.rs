use std::path::PathBuf;

use tracing::{info, warn};

use crate::{
    storage::{
        block_store::BlockStore,
        catalog::Catalog,
        free_space::FreeSpaceManager,
        schema::{ColumnSchema, TableSchema},
    },
    types::error::DatabaseError,
};

/// Trait for creating tables in the database
pub trait TableCreator {
    /// Create the table file and register the schema
    fn create_table<C: Catalog>(&self, catalog: &mut C, schema: TableSchema) -> Result<(), DatabaseError>;
}

/// Table creator implementation that handles table creation operations
pub struct CreateTableExecutor {
    data_dir: PathBuf,
}

impl CreateTableExecutor {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl TableCreator for CreateTableExecutor {
    fn create_table<C: Catalog>(&self, catalog: &mut C, schema: TableSchema) -> Result<(), DatabaseError> {
        schema.validate()?;
        let path = self.data_dir.join(&schema.table_name);
        if catalog.table_metadata_exists(&schema.table_name) || path.exists() {
            return Err(DatabaseError::TableAlreadyExists {
                name: schema.table_name,
            });
        }

        // Header slot starts at 1: slot 0 is reserved for the header itself
        let first_block = FreeSpaceManager::initial_block(schema.record_length())?;
        BlockStore::create(&path, &first_block)?;
        if let Err(e) = catalog.register_table(schema.clone()) {
            warn!("Registering '{}' failed, removing its file: {}", schema.table_name, e);
            if let Err(remove_err) = std::fs::remove_file(&path) {
                warn!("Could not remove '{}': {}", path.display(), remove_err);
            }
            return Err(e);
        }

        info!(
            "Created table '{}' (record length {}, blocking factor {})",
            schema.table_name,
            schema.record_length(),
            schema.blocking_factor()
        );
        Ok(())
    }
}

/// Builder for creating table schemas
pub struct TableSchemaBuilder {
    table_name: String,
    columns: Vec<ColumnSchema>,
}

impl TableSchemaBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
        }
    }

    pub fn add_column(mut self, name: impl Into<String>, width: usize) -> Self {
        let position = self.columns.len();
        self.columns.push(ColumnSchema::new(name, position, width));
        self
    }

    pub fn add_primary_key_column(mut self, name: impl Into<String>, width: usize) -> Self {
        let position = self.columns.len();
        self.columns
            .push(ColumnSchema::new(name, position, width).primary_key());
        self
    }

    pub fn build(self) -> Result<TableSchema, DatabaseError> {
        let schema = TableSchema::new(self.table_name, self.columns);
        schema.validate()?;
        Ok(schema)
    }
}
