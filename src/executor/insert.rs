use crate::{
    storage::{block_store::BlockStore, free_space::FreeSpaceManager, schema::TableSchema},
    types::{
        FREE_MARKER, SlotId,
        error::DatabaseError,
        record::{Row, is_live},
    },
};

/// Trait for inserting data into database tables
pub trait Inserter {
    /// Insert a single row into the table
    fn insert(&mut self, row: Row) -> Result<SlotId, DatabaseError>;

    /// Insert multiple rows in a batch operation
    fn insert_batch(&mut self, rows: Vec<Row>) -> Result<Vec<SlotId>, DatabaseError>;

    /// Get the table name this inserter operates on
    fn table_name(&self) -> &str;
}

/// Table inserter implementation that handles insertion operations for a specific table
pub struct TableInserter {
    schema: TableSchema,
    store: BlockStore,
}

impl TableInserter {
    pub fn new(schema: TableSchema, store: BlockStore) -> Self {
        Self { schema, store }
    }

    /// Encode a row and make sure the free list can tell it apart from a
    /// free slot. Nothing is written on failure.
    fn encode_row(&self, row: &Row) -> Result<Vec<u8>, DatabaseError> {
        let record = self.schema.encode_row(row)?;
        if !is_live(&record) {
            let details = if record.last() == Some(&FREE_MARKER) {
                format!(
                    "last byte of a '{}' record may not be 0x{:02x}",
                    self.schema.table_name, FREE_MARKER
                )
            } else {
                format!("'{}' record would be all zero bytes", self.schema.table_name)
            };
            return Err(DatabaseError::InvalidData { details });
        }
        Ok(record)
    }

    fn free_space(&self) -> Result<FreeSpaceManager<'_>, DatabaseError> {
        FreeSpaceManager::new(
            &self.store,
            &self.schema.table_name,
            self.schema.record_length(),
        )
    }
}

impl Inserter for TableInserter {
    fn insert(&mut self, row: Row) -> Result<SlotId, DatabaseError> {
        let record = self.encode_row(&row)?;
        self.free_space()?.place_record(&record)
    }

    fn insert_batch(&mut self, rows: Vec<Row>) -> Result<Vec<SlotId>, DatabaseError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // Validate all rows before starting batch insertion
        let records = rows
            .iter()
            .map(|row| self.encode_row(row))
            .collect::<Result<Vec<_>, _>>()?;

        let free_space = self.free_space()?;
        records
            .iter()
            .map(|record| free_space.place_record(record))
            .collect()
    }

    fn table_name(&self) -> &str {
        &self.schema.table_name
    }
}
