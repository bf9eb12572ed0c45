//! Fixed-width record codec.
//!
//! A record is the concatenation of its fields in schema order, each field
//! left-justified and zero-padded to its column width.

use std::borrow::Cow;

use crate::types::{FREE_MARKER, error::DatabaseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub values: Vec<Vec<u8>>,
}

impl Row {
    pub fn new(values: Vec<Vec<u8>>) -> Self {
        Self { values }
    }

    pub fn from_strs(values: &[&str]) -> Self {
        Self {
            values: values.iter().map(|v| v.as_bytes().to_vec()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_value(&self, column_index: usize) -> Option<&[u8]> {
        self.values.get(column_index).map(|v| v.as_slice())
    }

    /// Lossy text view of a field, for display.
    pub fn text(&self, column_index: usize) -> Option<Cow<'_, str>> {
        self.get_value(column_index).map(String::from_utf8_lossy)
    }

    pub fn texts(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .collect()
    }
}

/// Strip the trailing zero padding of a field.
pub fn trim(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

pub fn encode<V: AsRef<[u8]>>(values: &[V], widths: &[usize]) -> Result<Vec<u8>, DatabaseError> {
    if values.len() != widths.len() {
        return Err(DatabaseError::ArityMismatch {
            expected: widths.len(),
            actual: values.len(),
        });
    }

    let record_length = widths.iter().sum();
    let mut buffer = vec![0u8; record_length];
    let mut offset = 0;
    for (i, (value, width)) in values.iter().zip(widths).enumerate() {
        let value = value.as_ref();
        if value.len() > *width {
            return Err(DatabaseError::ValueTooLong {
                column: format!("#{}", i),
                length: value.len(),
                width: *width,
            });
        }
        buffer[offset..offset + value.len()].copy_from_slice(value);
        offset += width;
    }
    Ok(buffer)
}

pub fn decode(buffer: &[u8], widths: &[usize]) -> Result<Row, DatabaseError> {
    let record_length: usize = widths.iter().sum();
    if buffer.len() != record_length {
        return Err(DatabaseError::SerializationError {
            details: format!(
                "record is {} bytes, schema expects {}",
                buffer.len(),
                record_length
            ),
        });
    }

    let mut values = Vec::with_capacity(widths.len());
    let mut offset = 0;
    for width in widths {
        values.push(trim(&buffer[offset..offset + width]).to_vec());
        offset += width;
    }
    Ok(Row::new(values))
}

/// A slot holds a live record unless it is all zeros (never written) or
/// carries the free-slot marker in its last byte.
pub fn is_live(record: &[u8]) -> bool {
    match record.last() {
        None => false,
        Some(&FREE_MARKER) => false,
        Some(_) => record.iter().any(|b| *b != 0),
    }
}
