use crate::types::{BLOCK_SIZE, SlotIndex, error::DatabaseError};

/*
 * Block Layout on Disk (fixed-length slots, no block header)
 * ┌──────────────────────────────────────────────────────────────┐
 * │ slot 0 │ slot 1 │ slot 2 │ ... │ slot bf-1 │ unused tail     │
 * └──────────────────────────────────────────────────────────────┘
 *   each slot is `record_length` bytes, bf = BLOCK_SIZE / record_length
 *   slot 0 of block 0 is the header slot of a table file
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    data: Vec<u8>,
}

impl Block {
    pub fn new() -> Self {
        Self {
            data: vec![0; BLOCK_SIZE],
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatabaseError> {
        if bytes.len() != BLOCK_SIZE {
            return Err(DatabaseError::InvalidData {
                details: format!("block must be {} bytes, got {}", BLOCK_SIZE, bytes.len()),
            });
        }
        Ok(Self {
            data: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn blocking_factor(record_length: usize) -> usize {
        if record_length == 0 {
            return 0;
        }
        BLOCK_SIZE / record_length
    }

    fn slot_range(
        slot_index: SlotIndex,
        record_length: usize,
    ) -> Result<std::ops::Range<usize>, DatabaseError> {
        let start = slot_index * record_length;
        let end = start + record_length;
        if record_length == 0 || end > BLOCK_SIZE {
            return Err(DatabaseError::InvalidSlotIndex {
                index: slot_index,
                max: Self::blocking_factor(record_length).saturating_sub(1),
            });
        }
        Ok(start..end)
    }

    pub fn slot(&self, slot_index: SlotIndex, record_length: usize) -> Result<&[u8], DatabaseError> {
        let range = Self::slot_range(slot_index, record_length)?;
        Ok(&self.data[range])
    }

    pub fn write_slot(
        &mut self,
        slot_index: SlotIndex,
        record_length: usize,
        bytes: &[u8],
    ) -> Result<(), DatabaseError> {
        if bytes.len() != record_length {
            return Err(DatabaseError::InvalidData {
                details: format!(
                    "slot expects {} bytes, got {}",
                    record_length,
                    bytes.len()
                ),
            });
        }
        let range = Self::slot_range(slot_index, record_length)?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}
