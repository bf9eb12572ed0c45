use crate::{
    executor::scan::Scanner,
    storage::{block_store::BlockStore, schema::TableSchema},
    types::{
        BlockIndex, RecordLocation,
        block::Block,
        error::DatabaseError,
        record::{Row, decode, is_live},
    },
};

/// A live record as it sits on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRecord {
    pub location: RecordLocation,
    pub bytes: Vec<u8>,
}

/// Block-by-block, slot-by-slot scan of a table or partition file that
/// yields live records only.
///
/// Only one block is held at a time. The block count is taken when the scan
/// starts (and again on `reset`), so the scan is finite.
pub struct SequentialScanner {
    store: BlockStore,
    widths: Vec<usize>,
    record_length: usize,
    blocking_factor: usize,
    skip_header: bool,
    block_count: Option<BlockIndex>,
    current_block: Option<(BlockIndex, Block)>,
    next_block_index: BlockIndex,
    current_slot_index: usize,
    is_exhausted: bool,
}

impl SequentialScanner {
    /// Scan a table file; slot 0 of block 0 is the header and never yielded.
    pub fn for_table(store: BlockStore, schema: &TableSchema) -> Self {
        Self::new(store, schema, true)
    }

    /// Scan a partition file, which has no header slot.
    pub fn for_partition(store: BlockStore, schema: &TableSchema) -> Self {
        Self::new(store, schema, false)
    }

    fn new(store: BlockStore, schema: &TableSchema, skip_header: bool) -> Self {
        Self {
            store,
            widths: schema.widths(),
            record_length: schema.record_length(),
            blocking_factor: schema.blocking_factor(),
            skip_header,
            block_count: None,
            current_block: None,
            next_block_index: 0,
            current_slot_index: 0,
            is_exhausted: false,
        }
    }

    fn block_count(&mut self) -> Result<BlockIndex, DatabaseError> {
        match self.block_count {
            Some(count) => Ok(count),
            None => {
                let count = if self.store.path().exists() {
                    self.store.block_count()?
                } else {
                    0
                };
                self.block_count = Some(count);
                Ok(count)
            }
        }
    }

    fn load_next_block(&mut self) -> Result<bool, DatabaseError> {
        if self.next_block_index >= self.block_count()? {
            self.current_block = None;
            return Ok(false);
        }
        let block = self.store.read_block(self.next_block_index)?;
        self.current_block = Some((self.next_block_index, block));
        self.next_block_index += 1;
        self.current_slot_index = 0;
        Ok(true)
    }

    /// Next live record in raw form, with its location.
    pub fn next_record(&mut self) -> Result<Option<ScannedRecord>, DatabaseError> {
        if self.is_exhausted || self.blocking_factor == 0 {
            return Ok(None);
        }
        loop {
            if self.current_slot_index >= self.blocking_factor || self.current_block.is_none() {
                if !self.load_next_block()? {
                    self.is_exhausted = true;
                    return Ok(None);
                }
            }
            let Some((block_index, block)) = &self.current_block else {
                continue;
            };
            let slot_index = self.current_slot_index;
            self.current_slot_index += 1;
            if self.skip_header && *block_index == 0 && slot_index == 0 {
                continue;
            }
            let bytes = block.slot(slot_index, self.record_length)?;
            if !is_live(bytes) {
                continue;
            }
            return Ok(Some(ScannedRecord {
                location: RecordLocation {
                    block_index: *block_index,
                    slot_index,
                },
                bytes: bytes.to_vec(),
            }));
        }
    }
}

impl Scanner for SequentialScanner {
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError> {
        match self.next_record()? {
            Some(record) => Ok(Some(decode(&record.bytes, &self.widths)?)),
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<(), DatabaseError> {
        self.block_count = None;
        self.current_block = None;
        self.next_block_index = 0;
        self.current_slot_index = 0;
        self.is_exhausted = false;
        Ok(())
    }
}
