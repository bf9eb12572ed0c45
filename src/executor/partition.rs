use std::{
    collections::BTreeMap,
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    executor::sequential_scan::SequentialScanner,
    storage::{block_store::BlockStore, schema::TableSchema},
    types::{BLOCK_SIZE, error::DatabaseError, record::trim},
    utils::hash::bucket_for,
};

/// Name of the scratch file holding bucket `index` of `table` keyed on `column`.
pub fn partition_file_name(table_name: &str, column_name: &str, index: usize) -> String {
    format!("{}.{}-part{}", table_name, column_name, index)
}

/// Remove the partition files of `table_name` whose name starts with
/// `{table}.{column}-part` (or `{table}.` when no column is given) and ends
/// in a bucket number.
pub fn remove_partition_files(
    temp_dir: &Path,
    table_name: &str,
    column_name: Option<&str>,
) -> Result<usize, DatabaseError> {
    if !temp_dir.is_dir() {
        return Ok(0);
    }
    let prefix = match column_name {
        Some(column) => format!("{}.{}-part", table_name, column),
        None => format!("{}.", table_name),
    };
    let mut removed = 0;
    for entry in fs::read_dir(temp_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(rest) = name.strip_prefix(&prefix) else {
            continue;
        };
        let suffix = match column_name {
            Some(_) => Some(rest),
            None => rest.rsplit_once("-part").map(|(_, n)| n),
        };
        if suffix.is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())) {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// The on-disk buckets produced for one side of a join.
#[derive(Debug, Clone)]
pub struct PartitionSet {
    pub schema: TableSchema,
    pub key_range: Range<usize>,
    pub partition_count: usize,
    buckets: BTreeMap<usize, BlockStore>,
}

impl PartitionSet {
    /// Bucket indices that received at least one record, ascending
    pub fn bucket_indices(&self) -> Vec<usize> {
        self.buckets.keys().copied().collect()
    }

    pub fn bucket(&self, index: usize) -> Option<&BlockStore> {
        self.buckets.get(&index)
    }

    pub fn scanner(&self, index: usize) -> Option<SequentialScanner> {
        self.buckets
            .get(&index)
            .map(|store| SequentialScanner::for_partition(store.clone(), &self.schema))
    }

    /// Join key of a record of this side, zero padding removed
    pub fn key_of<'r>(&self, record: &'r [u8]) -> &'r [u8] {
        trim(&record[self.key_range.clone()])
    }
}

struct BucketBuffer {
    data: Vec<u8>,
    filled: usize,
}

/// Splits a table's live records into `partition_count` scratch files by
/// hashing the join column.
pub struct Partitioner {
    temp_dir: PathBuf,
    partition_count: usize,
}

impl Partitioner {
    pub fn new(temp_dir: impl Into<PathBuf>, partition_count: usize) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            partition_count: partition_count.max(1),
        }
    }

    pub fn partition(
        &self,
        store: BlockStore,
        schema: &TableSchema,
        column_name: &str,
    ) -> Result<PartitionSet, DatabaseError> {
        let key_range = schema.column_range(column_name)?;
        let record_length = schema.record_length();
        fs::create_dir_all(&self.temp_dir)?;
        let stale = remove_partition_files(&self.temp_dir, &schema.table_name, Some(column_name))?;
        if stale > 0 {
            debug!("Removed {} stale partitions of {}.{}", stale, schema.table_name, column_name);
        }

        let bucket_store = |index: usize| {
            BlockStore::at(self.temp_dir.join(partition_file_name(
                &schema.table_name,
                column_name,
                index,
            )))
        };
        let mut buffers: Vec<BucketBuffer> = (0..self.partition_count)
            .map(|_| BucketBuffer {
                data: vec![0; BLOCK_SIZE],
                filled: 0,
            })
            .collect();
        let mut buckets = BTreeMap::new();
        let mut record_count = 0usize;

        let mut scanner = SequentialScanner::for_table(store, schema);
        while let Some(record) = scanner.next_record()? {
            let key = trim(&record.bytes[key_range.clone()]);
            let index = bucket_for(key, self.partition_count);
            let buffer = &mut buffers[index];
            if buffer.filled + record_length > BLOCK_SIZE {
                let target = buckets.entry(index).or_insert_with(|| bucket_store(index));
                target.append_bytes(&buffer.data)?;
                buffer.data.fill(0);
                buffer.filled = 0;
            }
            buffer.data[buffer.filled..buffer.filled + record_length].copy_from_slice(&record.bytes);
            buffer.filled += record_length;
            record_count += 1;
        }

        for (index, buffer) in buffers.iter().enumerate() {
            if buffer.filled > 0 {
                let target = buckets.entry(index).or_insert_with(|| bucket_store(index));
                target.append_bytes(&buffer.data)?;
            }
        }

        info!(
            "Partitioned {} records of {}.{} into {} of {} buckets",
            record_count,
            schema.table_name,
            column_name,
            buckets.len(),
            self.partition_count
        );
        Ok(PartitionSet {
            schema: schema.clone(),
            key_range,
            partition_count: self.partition_count,
            buckets,
        })
    }
}
