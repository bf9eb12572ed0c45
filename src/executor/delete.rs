use tracing::debug;

use crate::{
    executor::{predicate::PrimaryKeyPredicate, sequential_scan::SequentialScanner},
    storage::{block_store::BlockStore, free_space::FreeSpaceManager, schema::TableSchema},
    types::{SlotId, error::DatabaseError},
};

/// Removes records by primary key, returning their slot to the free list.
pub struct TableDeleter {
    schema: TableSchema,
    store: BlockStore,
}

impl TableDeleter {
    pub fn new(schema: TableSchema, store: BlockStore) -> Self {
        Self { schema, store }
    }

    /// Delete the live record whose primary key equals `pk_values`.
    /// The file is left untouched when nothing matches.
    pub fn delete<V: AsRef<[u8]>>(&self, pk_values: &[V]) -> Result<SlotId, DatabaseError> {
        let predicate = PrimaryKeyPredicate::new(pk_values);
        let mut scanner = SequentialScanner::for_table(self.store.clone(), &self.schema);
        let Some(found) = predicate.find_first(&mut scanner, &self.schema)? else {
            return Err(DatabaseError::RecordNotFound {
                table: self.schema.table_name.clone(),
            });
        };

        let slot = found.location.slot_id(self.schema.blocking_factor());
        FreeSpaceManager::new(
            &self.store,
            &self.schema.table_name,
            self.schema.record_length(),
        )?
        .free_slot(slot)?;
        debug!(
            "Deleted record at block {} slot {} of '{}'",
            found.location.block_index, found.location.slot_index, self.schema.table_name
        );
        Ok(slot)
    }
}
