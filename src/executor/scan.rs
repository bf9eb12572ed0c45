use crate::types::{error::DatabaseError, record::Row};

/// Pull-based source of decoded live records.
pub trait Scanner {
    /// Next record, or `None` once the source is exhausted.
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError>;

    /// Up to `batch_size` records; an empty batch means the scan is done.
    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = Vec::with_capacity(batch_size);
        while rows.len() < batch_size {
            match self.scan()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Start over from the first record, picking up writes made since.
    fn reset(&mut self) -> Result<(), DatabaseError>;
}

/// Adapts a `Scanner` to `Iterator`, for the lazy full-scan sequence.
pub struct ScanIterator<S: Scanner> {
    scanner: S,
}

impl<S: Scanner> ScanIterator<S> {
    pub fn new(scanner: S) -> Self {
        Self { scanner }
    }

    pub fn restart(&mut self) -> Result<(), DatabaseError> {
        self.scanner.reset()
    }
}

impl<S: Scanner> Iterator for ScanIterator<S> {
    type Item = Result<Row, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scanner.scan().transpose()
    }
}
