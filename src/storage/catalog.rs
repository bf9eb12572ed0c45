use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    storage::{CATALOG_MAGIC, schema::{ColumnSchema, TableSchema}},
    types::error::DatabaseError,
    utils::hash::{calculate_catalog_checksum, verify_catalog_checksum},
};

/// Table and column metadata, looked up by table name.
pub trait Catalog {
    /// Columns in schema order, empty if the table is unknown
    fn columns(&self, table_name: &str) -> Vec<ColumnSchema>;

    /// Primary-key columns in schema order
    fn primary_key_columns(&self, table_name: &str) -> Vec<ColumnSchema> {
        self.columns(table_name)
            .into_iter()
            .filter(|col| col.primary_key)
            .collect()
    }

    fn table_metadata_exists(&self, table_name: &str) -> bool;

    fn table_names(&self) -> Vec<String>;

    fn register_table(&mut self, schema: TableSchema) -> Result<(), DatabaseError>;

    fn remove_table(&mut self, table_name: &str) -> Result<Option<TableSchema>, DatabaseError>;

    /// Assemble the full schema of a table, or `TableNotFound`.
    fn table_schema(&self, table_name: &str) -> Result<TableSchema, DatabaseError> {
        let columns = self.columns(table_name);
        if columns.is_empty() {
            return Err(DatabaseError::TableNotFound {
                name: table_name.to_string(),
            });
        }
        Ok(TableSchema::new(table_name, columns))
    }
}

/// Schema manager for handling table and column schemas.
///
/// Kept in memory; when opened on a path every mutation rewrites the catalog
/// file (`magic | crc32 (BE) | bincode payload`).
#[derive(Debug, Clone, Default)]
pub struct SchemaManager {
    table_schemas: BTreeMap<String, TableSchema>,
    path: Option<PathBuf>,
}

impl SchemaManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the catalog at `path`, or start empty if the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let table_schemas = if path.exists() {
            let bytes = fs::read(path)?;
            let schemas = Self::decode(&bytes)?;
            info!("Loaded {} table schemas from {}", schemas.len(), path.display());
            schemas
                .into_iter()
                .map(|schema| (schema.table_name.clone(), schema))
                .collect()
        } else {
            debug!("No catalog at {}, starting empty", path.display());
            BTreeMap::new()
        };
        Ok(Self {
            table_schemas,
            path: Some(path.to_path_buf()),
        })
    }

    fn encode(schemas: &[&TableSchema]) -> Result<Vec<u8>, DatabaseError> {
        let payload = bincode::serde::encode_to_vec(schemas, bincode::config::standard())
            .map_err(|e| DatabaseError::SerializationError {
                details: e.to_string(),
            })?;
        let mut buffer = Vec::with_capacity(CATALOG_MAGIC.len() + 4 + payload.len());
        buffer.extend_from_slice(CATALOG_MAGIC);
        buffer.extend_from_slice(&calculate_catalog_checksum(&payload).to_be_bytes());
        buffer.extend_from_slice(&payload);
        Ok(buffer)
    }

    fn decode(bytes: &[u8]) -> Result<Vec<TableSchema>, DatabaseError> {
        let header_len = CATALOG_MAGIC.len() + 4;
        if bytes.len() < header_len {
            return Err(DatabaseError::CatalogCorrupted {
                reason: "catalog file too short".to_string(),
            });
        }
        if &bytes[..CATALOG_MAGIC.len()] != CATALOG_MAGIC {
            return Err(DatabaseError::CatalogCorrupted {
                reason: "invalid catalog magic".to_string(),
            });
        }
        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&bytes[CATALOG_MAGIC.len()..header_len]);
        let payload = &bytes[header_len..];
        if !verify_catalog_checksum(payload, u32::from_be_bytes(checksum)) {
            return Err(DatabaseError::CatalogCorrupted {
                reason: "checksum mismatch".to_string(),
            });
        }
        let (schemas, _) = bincode::serde::decode_from_slice::<Vec<TableSchema>, _>(
            payload,
            bincode::config::standard(),
        )
        .map_err(|e| DatabaseError::SerializationError {
            details: e.to_string(),
        })?;
        Ok(schemas)
    }

    fn persist(&self) -> Result<(), DatabaseError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let schemas: Vec<&TableSchema> = self.table_schemas.values().collect();
        let bytes = Self::encode(&schemas)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Get a table schema by name
    pub fn get_table_schema(&self, table_name: &str) -> Option<&TableSchema> {
        self.table_schemas.get(table_name)
    }
}

impl Catalog for SchemaManager {
    fn columns(&self, table_name: &str) -> Vec<ColumnSchema> {
        self.table_schemas
            .get(table_name)
            .map(|schema| schema.columns.clone())
            .unwrap_or_default()
    }

    fn table_metadata_exists(&self, table_name: &str) -> bool {
        self.table_schemas.contains_key(table_name)
    }

    fn table_names(&self) -> Vec<String> {
        self.table_schemas.keys().cloned().collect()
    }

    fn register_table(&mut self, schema: TableSchema) -> Result<(), DatabaseError> {
        if self.table_schemas.contains_key(&schema.table_name) {
            return Err(DatabaseError::TableAlreadyExists {
                name: schema.table_name,
            });
        }
        self.table_schemas.insert(schema.table_name.clone(), schema);
        self.persist()
    }

    fn remove_table(&mut self, table_name: &str) -> Result<Option<TableSchema>, DatabaseError> {
        let removed = self.table_schemas.remove(table_name);
        if removed.is_some() {
            self.persist()?;
        }
        Ok(removed)
    }
}
