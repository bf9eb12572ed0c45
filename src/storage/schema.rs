use serde::{Deserialize, Serialize};

use crate::types::{
    BLOCK_SIZE, MIN_RECORD_LENGTH,
    block::Block,
    error::DatabaseError,
    record::{self, Row, trim},
};

pub const MAX_NAME_LENGTH: usize = 30;

/// Represents a column definition in a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub position: usize,
    pub width: usize,
    pub primary_key: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, position: usize, width: usize) -> Self {
        Self {
            name: name.into(),
            position,
            width,
            primary_key: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// Represents a complete table schema with all column definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>, mut columns: Vec<ColumnSchema>) -> Self {
        columns.sort_by_key(|col| col.position);
        Self {
            table_name: table_name.into(),
            columns,
        }
    }

    /// Build a schema from `(name, width, is_primary_key)` triples, numbering
    /// positions in the given order.
    pub fn from_definitions(table_name: impl Into<String>, definitions: &[(&str, usize, bool)]) -> Self {
        let columns = definitions
            .iter()
            .enumerate()
            .map(|(position, (name, width, pk))| {
                let column = ColumnSchema::new(*name, position, *width);
                if *pk { column.primary_key() } else { column }
            })
            .collect();
        Self::new(table_name, columns)
    }

    pub fn record_length(&self) -> usize {
        self.columns.iter().map(|col| col.width).sum()
    }

    pub fn blocking_factor(&self) -> usize {
        Block::blocking_factor(self.record_length())
    }

    pub fn widths(&self) -> Vec<usize> {
        self.columns.iter().map(|col| col.width).collect()
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Byte offset and width of a column inside a record
    pub fn column_range(&self, name: &str) -> Result<std::ops::Range<usize>, DatabaseError> {
        let mut offset = 0;
        for col in &self.columns {
            if col.name == name {
                return Ok(offset..offset + col.width);
            }
            offset += col.width;
        }
        Err(DatabaseError::ColumnNotFound {
            name: name.to_string(),
            table: self.table_name.clone(),
        })
    }

    /// Get all column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }

    /// Get primary key columns
    pub fn primary_key_columns(&self) -> Vec<&ColumnSchema> {
        self.columns.iter().filter(|col| col.primary_key).collect()
    }

    /// Check naming and sizing rules before a table file is created.
    pub fn validate(&self) -> Result<(), DatabaseError> {
        let invalid = |reason: String| Err(DatabaseError::InvalidSchema { reason });

        validate_name("table", &self.table_name)?;
        if self.table_name.contains(['/', '\\', '.']) {
            return invalid(format!(
                "table name '{}' is not a valid file name",
                self.table_name
            ));
        }
        if self.columns.is_empty() {
            return invalid("a table needs at least one column".to_string());
        }
        for (i, column) in self.columns.iter().enumerate() {
            validate_name("column", &column.name)?;
            // Column names end up in partition file names
            if column.name.contains(['/', '\\']) {
                return invalid(format!(
                    "column name '{}' is not a valid file name",
                    column.name
                ));
            }
            if column.width == 0 {
                return invalid(format!("column '{}' has zero width", column.name));
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return invalid(format!("duplicate column '{}'", column.name));
            }
        }
        if self.primary_key_columns().is_empty() {
            return invalid("a table needs at least one primary key column".to_string());
        }
        let record_length = self.record_length();
        if record_length > BLOCK_SIZE {
            return invalid(format!(
                "record length {} exceeds block size {}",
                record_length, BLOCK_SIZE
            ));
        }
        if record_length < MIN_RECORD_LENGTH {
            return invalid(format!(
                "record length {} is below the minimum of {}",
                record_length, MIN_RECORD_LENGTH
            ));
        }
        Ok(())
    }

    /// Encode a row, naming the offending column on overflow.
    pub fn encode_row(&self, row: &Row) -> Result<Vec<u8>, DatabaseError> {
        for (value, col) in row.values.iter().zip(&self.columns) {
            if value.len() > col.width {
                return Err(DatabaseError::ValueTooLong {
                    column: col.name.clone(),
                    length: value.len(),
                    width: col.width,
                });
            }
        }
        record::encode(&row.values, &self.widths())
    }

    pub fn decode_record(&self, record: &[u8]) -> Result<Row, DatabaseError> {
        record::decode(record, &self.widths())
    }

    /// Compare the primary-key fields of a raw record with `pk_values`,
    /// both sides stripped of zero padding.
    pub fn matches_primary_key<V: AsRef<[u8]>>(&self, record: &[u8], pk_values: &[V]) -> bool {
        let mut offset = 0;
        let mut matched = 0;
        for col in &self.columns {
            if col.primary_key {
                let Some(expected) = pk_values.get(matched) else {
                    return false;
                };
                if trim(&record[offset..offset + col.width]) != trim(expected.as_ref()) {
                    return false;
                }
                matched += 1;
            }
            offset += col.width;
        }
        matched == pk_values.len()
    }
}

fn validate_name(kind: &str, name: &str) -> Result<(), DatabaseError> {
    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return Err(DatabaseError::InvalidSchema {
            reason: format!(
                "{} name '{}' must be 1..={} bytes",
                kind, name, MAX_NAME_LENGTH
            ),
        });
    }
    Ok(())
}
