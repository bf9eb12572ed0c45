//! Intrusive free list threaded through unused slots.
//!
//! This is the only module that knows a free slot stores a link. Layout of a
//! free slot (and of the header slot, slot 0 of block 0):
//!
//! ```text
//! ┌────────────────┬──────────────────────────┬────────┐
//! │ next (u32, BE) │ zero fill                │ 0x01   │
//! └────────────────┴──────────────────────────┴────────┘
//! ```
//!
//! The header slot's link is the free-list head. A slot whose bytes are all
//! zero was never written: the head may point at it, in which case slots are
//! handed out linearly from there.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::{
    storage::block_store::BlockStore,
    types::{
        FREE_MARKER, LINK_SIZE, MIN_RECORD_LENGTH, SlotId,
        block::Block,
        error::DatabaseError,
        record::is_live,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationKind {
    /// Slot lies past the end of the file; a fresh block is written.
    Append,
    /// Slot is inside an existing block but was never written.
    Linear,
    /// Slot was explicitly freed and is popped off the list.
    Reuse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAllocation {
    pub slot: SlotId,
    pub next_head: SlotId,
    pub kind: AllocationKind,
}

/// Snapshot of the free list: explicitly freed slots in pop order, followed
/// by the slot where linear allocation resumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeList {
    pub nodes: Vec<SlotId>,
    pub append_cursor: SlotId,
}

pub fn encode_free_slot(next: SlotId, record_length: usize) -> Vec<u8> {
    let mut slot = vec![0u8; record_length];
    slot[..LINK_SIZE].copy_from_slice(&next.0.to_be_bytes());
    slot[record_length - 1] = FREE_MARKER;
    slot
}

pub fn decode_link(slot: &[u8]) -> SlotId {
    let mut link = [0u8; LINK_SIZE];
    link.copy_from_slice(&slot[..LINK_SIZE]);
    SlotId(u32::from_be_bytes(link))
}

fn is_free_marked(slot: &[u8]) -> bool {
    slot.last() == Some(&FREE_MARKER)
}

pub struct FreeSpaceManager<'a> {
    store: &'a BlockStore,
    table_name: &'a str,
    record_length: usize,
    blocking_factor: usize,
}

impl<'a> FreeSpaceManager<'a> {
    pub fn new(
        store: &'a BlockStore,
        table_name: &'a str,
        record_length: usize,
    ) -> Result<Self, DatabaseError> {
        let blocking_factor = Block::blocking_factor(record_length);
        if record_length < MIN_RECORD_LENGTH || blocking_factor == 0 {
            return Err(DatabaseError::InvalidSchema {
                reason: format!(
                    "record length {} cannot hold a free-list link",
                    record_length
                ),
            });
        }
        Ok(Self {
            store,
            table_name,
            record_length,
            blocking_factor,
        })
    }

    /// Block 0 of a brand new table file: header pointing at slot 1.
    pub fn initial_block(record_length: usize) -> Result<Block, DatabaseError> {
        let mut block = Block::new();
        block.write_slot(
            0,
            record_length,
            &encode_free_slot(SlotId::FIRST_DATA, record_length),
        )?;
        Ok(block)
    }

    pub fn blocking_factor(&self) -> usize {
        self.blocking_factor
    }

    fn corrupted(&self, reason: String) -> DatabaseError {
        DatabaseError::CorruptedTable {
            table: self.table_name.to_string(),
            reason,
        }
    }

    /// Read the persisted head pointer. Always hits the file.
    pub fn read_header(&self) -> Result<SlotId, DatabaseError> {
        let block = self.store.read_block(0)?;
        let header = block.slot(0, self.record_length)?;
        let head = decode_link(header);
        if head == SlotId::HEADER {
            return Err(self.corrupted("header pointer names the header slot".to_string()));
        }
        Ok(head)
    }

    fn write_header(&self, head: SlotId) -> Result<(), DatabaseError> {
        let mut block = self.store.read_block(0)?;
        block.write_slot(0, self.record_length, &encode_free_slot(head, self.record_length))?;
        self.store.write_block(0, &block)
    }

    /// Decide which slot the next record goes to without touching the file.
    pub fn allocate_slot(&self) -> Result<SlotAllocation, DatabaseError> {
        let head = self.read_header()?;
        let block_index = head.block_index(self.blocking_factor);

        if self.store.is_beyond_end(block_index)? {
            return Ok(SlotAllocation {
                slot: head,
                next_head: head.next(),
                kind: AllocationKind::Append,
            });
        }

        let block = self.store.read_block(block_index)?;
        let slot = block.slot(head.slot_index(self.blocking_factor), self.record_length)?;
        let link = decode_link(slot);
        if link == SlotId::HEADER {
            if slot.iter().any(|b| *b != 0) {
                return Err(self.corrupted(format!("head {} is not a free slot", head)));
            }
            return Ok(SlotAllocation {
                slot: head,
                next_head: head.next(),
                kind: AllocationKind::Linear,
            });
        }
        if !is_free_marked(slot) {
            return Err(self.corrupted(format!("head {} points at a live record", head)));
        }
        Ok(SlotAllocation {
            slot: head,
            next_head: link,
            kind: AllocationKind::Reuse,
        })
    }

    /// Allocate a slot, write `record` into it and advance the header.
    pub fn place_record(&self, record: &[u8]) -> Result<SlotId, DatabaseError> {
        let allocation = self.allocate_slot()?;
        let block_index = allocation.slot.block_index(self.blocking_factor);
        let mut block = match allocation.kind {
            AllocationKind::Append => Block::new(),
            AllocationKind::Linear | AllocationKind::Reuse => self.store.read_block(block_index)?,
        };
        block.write_slot(
            allocation.slot.slot_index(self.blocking_factor),
            self.record_length,
            record,
        )?;
        self.store.write_block(block_index, &block)?;
        self.write_header(allocation.next_head)?;
        debug!(
            "Placed record in {} slot {} ({:?}), head -> {}",
            self.table_name, allocation.slot, allocation.kind, allocation.next_head
        );
        Ok(allocation.slot)
    }

    /// Push `slot` onto the head of the free list.
    pub fn free_slot(&self, slot: SlotId) -> Result<(), DatabaseError> {
        if slot == SlotId::HEADER {
            return Err(DatabaseError::InvalidSlotIndex {
                index: 0,
                max: self.blocking_factor - 1,
            });
        }
        let block_index = slot.block_index(self.blocking_factor);
        if self.store.is_beyond_end(block_index)? {
            return Err(DatabaseError::SlotOutOfBounds { slot });
        }

        let old_head = self.read_header()?;
        let mut block = self.store.read_block(block_index)?;
        let slot_index = slot.slot_index(self.blocking_factor);
        if !is_live(block.slot(slot_index, self.record_length)?) {
            return Err(self.corrupted(format!("slot {} is already free", slot)));
        }
        block.write_slot(
            slot_index,
            self.record_length,
            &encode_free_slot(old_head, self.record_length),
        )?;
        self.store.write_block(block_index, &block)?;
        self.write_header(slot)?;
        debug!(
            "Freed {} slot {}, next free {}",
            self.table_name, slot, old_head
        );
        Ok(())
    }

    /// Walk the explicit part of the free list.
    pub fn free_list(&self) -> Result<FreeList, DatabaseError> {
        let mut nodes = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.read_header()?;
        loop {
            let block_index = current.block_index(self.blocking_factor);
            if self.store.is_beyond_end(block_index)? {
                break;
            }
            let block = self.store.read_block(block_index)?;
            let slot = block.slot(current.slot_index(self.blocking_factor), self.record_length)?;
            if !is_free_marked(slot) {
                if is_live(slot) {
                    return Err(self.corrupted(format!("free list reaches live slot {}", current)));
                }
                break;
            }
            if !seen.insert(current) {
                return Err(self.corrupted(format!("free list cycles at {}", current)));
            }
            nodes.push(current);
            let next = decode_link(slot);
            trace!("Free list {} -> {}", current, next);
            current = next;
        }
        Ok(FreeList {
            nodes,
            append_cursor: current,
        })
    }
}
