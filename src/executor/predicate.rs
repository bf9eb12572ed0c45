use crate::{
    executor::sequential_scan::{ScannedRecord, SequentialScanner},
    storage::schema::TableSchema,
    types::error::DatabaseError,
};

/// Exact match on every primary-key column, compared after trimming the
/// zero padding.
#[derive(Debug, Clone)]
pub struct PrimaryKeyPredicate {
    values: Vec<Vec<u8>>,
}

impl PrimaryKeyPredicate {
    pub fn new<V: AsRef<[u8]>>(values: &[V]) -> Self {
        Self {
            values: values.iter().map(|v| v.as_ref().to_vec()).collect(),
        }
    }

    /// Check that one value was given per primary-key column.
    pub fn validate_against_schema(&self, schema: &TableSchema) -> Result<(), DatabaseError> {
        let expected = schema.primary_key_columns().len();
        if self.values.len() != expected {
            return Err(DatabaseError::ArityMismatch {
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    pub fn evaluate(&self, record: &[u8], schema: &TableSchema) -> bool {
        schema.matches_primary_key(record, &self.values)
    }

    /// First live record of the scan that satisfies the predicate.
    pub fn find_first(
        &self,
        scanner: &mut SequentialScanner,
        schema: &TableSchema,
    ) -> Result<Option<ScannedRecord>, DatabaseError> {
        self.validate_against_schema(schema)?;
        while let Some(record) = scanner.next_record()? {
            if self.evaluate(&record.bytes, schema) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}
