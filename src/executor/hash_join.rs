//! Grace hash join: partition both inputs with the same hash, then for each
//! bucket present on both sides build an in-memory table from the left bucket
//! and probe it with the right bucket.
//!
//! Every build table must fit in memory; buckets are never re-partitioned.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::{
    executor::partition::{PartitionSet, Partitioner},
    storage::{block_store::BlockStore, schema::TableSchema},
    types::{error::DatabaseError, record::Row},
};

/// One input of the join: a table and the column compared for equality.
#[derive(Debug, Clone)]
pub struct JoinInput {
    pub store: BlockStore,
    pub schema: TableSchema,
    pub column: String,
}

/// Output of a join: each row is a left record followed by a right record.
#[derive(Debug, Clone)]
pub struct JoinResult {
    pub left: TableSchema,
    pub right: TableSchema,
    pub rows: Vec<Vec<u8>>,
}

impl JoinResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Left columns then right columns
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.left.column_names();
        names.extend(self.right.column_names());
        names
    }

    pub fn split<'r>(&self, row: &'r [u8]) -> (&'r [u8], &'r [u8]) {
        row.split_at(self.left.record_length())
    }

    pub fn decode_row(&self, row: &[u8]) -> Result<(Row, Row), DatabaseError> {
        let (left, right) = self.split(row);
        Ok((self.left.decode_record(left)?, self.right.decode_record(right)?))
    }

    pub fn decode_rows(&self) -> Result<Vec<(Row, Row)>, DatabaseError> {
        self.rows.iter().map(|row| self.decode_row(row)).collect()
    }
}

pub struct HashJoinExecutor {
    partitioner: Partitioner,
}

impl HashJoinExecutor {
    pub fn new(partitioner: Partitioner) -> Self {
        Self { partitioner }
    }

    pub fn execute(&self, left: JoinInput, right: JoinInput) -> Result<JoinResult, DatabaseError> {
        let build = self
            .partitioner
            .partition(left.store, &left.schema, &left.column)?;
        let probe = self
            .partitioner
            .partition(right.store, &right.schema, &right.column)?;

        let rows = Self::join_partitions(&build, &probe)?;
        info!(
            "Joined {}.{} with {}.{}: {} rows",
            left.schema.table_name,
            left.column,
            right.schema.table_name,
            right.column,
            rows.len()
        );
        Ok(JoinResult {
            left: left.schema,
            right: right.schema,
            rows,
        })
    }

    /// Build + probe over the buckets both sides have in common, in ascending
    /// bucket order.
    pub fn join_partitions(
        build: &PartitionSet,
        probe: &PartitionSet,
    ) -> Result<Vec<Vec<u8>>, DatabaseError> {
        let mut output = Vec::new();
        for index in build.bucket_indices() {
            let (Some(mut build_scan), Some(mut probe_scan)) =
                (build.scanner(index), probe.scanner(index))
            else {
                continue;
            };

            // Keyed by the exact key bytes, never by bucket: different keys
            // share a bucket whenever their hashes collide mod K.
            let mut table: HashMap<Vec<u8>, Vec<Vec<u8>>> = HashMap::new();
            let mut build_count = 0usize;
            while let Some(record) = build_scan.next_record()? {
                let key = build.key_of(&record.bytes).to_vec();
                table.entry(key).or_default().push(record.bytes);
                build_count += 1;
            }

            let before = output.len();
            while let Some(record) = probe_scan.next_record()? {
                let Some(matches) = table.get(probe.key_of(&record.bytes)) else {
                    continue;
                };
                for left in matches {
                    let mut joined = Vec::with_capacity(left.len() + record.bytes.len());
                    joined.extend_from_slice(left);
                    joined.extend_from_slice(&record.bytes);
                    output.push(joined);
                }
            }
            debug!(
                "Bucket {}: {} build records, {} distinct keys, {} matches",
                index,
                build_count,
                table.len(),
                output.len() - before
            );
        }
        Ok(output)
    }
}
