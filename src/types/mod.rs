pub mod block;
pub mod error;
pub mod record;

// Common type aliases
pub type BlockIndex = u32;
pub type SlotIndex = usize;

// Binary layout constants
pub const BLOCK_SIZE: usize = 140;
pub const LINK_SIZE: usize = 4; // big-endian u32 free-list link
pub const FREE_MARKER: u8 = 0x01; // last byte of a free slot (SOH)
pub const MIN_RECORD_LENGTH: usize = LINK_SIZE + 1;

/// Global slot number shared by the header pointer and the free-list links.
///
/// Slot `n` lives in block `n / blocking_factor` at position
/// `n % blocking_factor`. Slot 0 is the header slot and is never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub u32);

impl SlotId {
    pub const HEADER: SlotId = SlotId(0);
    pub const FIRST_DATA: SlotId = SlotId(1);

    pub fn from_position(block_index: BlockIndex, slot_index: SlotIndex, blocking_factor: usize) -> Self {
        SlotId(block_index * blocking_factor as u32 + slot_index as u32)
    }

    pub fn block_index(&self, blocking_factor: usize) -> BlockIndex {
        self.0 / blocking_factor as u32
    }

    pub fn slot_index(&self, blocking_factor: usize) -> SlotIndex {
        (self.0 % blocking_factor as u32) as SlotIndex
    }

    pub fn next(&self) -> SlotId {
        SlotId(self.0 + 1)
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Physical location of a record: (block index, slot index within block)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLocation {
    pub block_index: BlockIndex,
    pub slot_index: SlotIndex,
}

impl RecordLocation {
    pub fn slot_id(&self, blocking_factor: usize) -> SlotId {
        SlotId::from_position(self.block_index, self.slot_index, blocking_factor)
    }
}
