use thiserror::Error;

use crate::types::{BlockIndex, SlotId};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Short block I/O on block {block_index}: expected {expected} bytes, got {actual}")]
    ShortBlock {
        block_index: BlockIndex,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid slot index {index} (max: {max})")]
    InvalidSlotIndex { index: usize, max: usize },

    #[error("Slot {slot} lies outside the table file")]
    SlotOutOfBounds { slot: SlotId },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Table '{name}' already exists")]
    TableAlreadyExists { name: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Value for column '{column}' is {length} bytes but the column holds {width}")]
    ValueTooLong {
        column: String,
        length: usize,
        width: usize,
    },

    #[error("Expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("No record in table '{table}' matches the given primary key")]
    RecordNotFound { table: String },

    #[error("Invalid schema: {reason}")]
    InvalidSchema { reason: String },

    #[error("Invalid data: {details}")]
    InvalidData { details: String },

    #[error("Corrupted table '{table}': {reason}")]
    CorruptedTable { table: String, reason: String },

    #[error("Corrupted catalog: {reason}")]
    CatalogCorrupted { reason: String },

    #[error("Serialization/deserialization error: {details}")]
    SerializationError { details: String },
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
