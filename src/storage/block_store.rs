use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, trace};

use crate::types::{BLOCK_SIZE, BlockIndex, block::Block, error::DatabaseError};

/// Fixed-size block I/O against a single file.
///
/// Every call is an independent open-seek-operate-close unit; nothing is
/// cached between calls, so two handles on the same path always observe the
/// file as it is on disk.
#[derive(Debug, Clone)]
pub struct BlockStore {
    path: PathBuf,
}

impl BlockStore {
    /// Create a new file whose block 0 is `first_block`.
    /// Fails if the file already exists.
    pub fn create<P: AsRef<Path>>(path: P, first_block: &Block) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(first_block.as_bytes())?;
        file.flush()?;
        debug!("Created block file {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DatabaseError::Io(std::io::Error::new(
                ErrorKind::NotFound,
                format!("block file {} does not exist", path.display()),
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Handle on a file that may not exist yet (scratch files are created on
    /// first append).
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn block_offset(block_index: BlockIndex) -> u64 {
        block_index as u64 * BLOCK_SIZE as u64
    }

    pub fn file_len(&self) -> Result<u64, DatabaseError> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Number of whole blocks in the file.
    pub fn block_count(&self) -> Result<BlockIndex, DatabaseError> {
        Ok((self.file_len()? / BLOCK_SIZE as u64) as BlockIndex)
    }

    /// True when `block_index` starts at or past the end of the file.
    pub fn is_beyond_end(&self, block_index: BlockIndex) -> Result<bool, DatabaseError> {
        Ok(Self::block_offset(block_index) >= self.file_len()?)
    }

    pub fn read_block(&self, block_index: BlockIndex) -> Result<Block, DatabaseError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(Self::block_offset(block_index)))?;
        let mut buffer = vec![0u8; BLOCK_SIZE];
        let mut filled = 0;
        while filled < BLOCK_SIZE {
            match file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if filled != BLOCK_SIZE {
            return Err(DatabaseError::ShortBlock {
                block_index,
                expected: BLOCK_SIZE,
                actual: filled,
            });
        }
        trace!("Read block {} of {}", block_index, self.path.display());
        Block::from_bytes(&buffer)
    }

    /// Write a full block; writing past the end grows the file.
    pub fn write_block(&self, block_index: BlockIndex, block: &Block) -> Result<(), DatabaseError> {
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(Self::block_offset(block_index)))?;
        file.write_all(block.as_bytes()).map_err(|e| {
            if e.kind() == ErrorKind::WriteZero {
                DatabaseError::ShortBlock {
                    block_index,
                    expected: BLOCK_SIZE,
                    actual: 0,
                }
            } else {
                DatabaseError::Io(e)
            }
        })?;
        file.flush()?;
        trace!("Wrote block {} of {}", block_index, self.path.display());
        Ok(())
    }

    /// Append raw bytes at the end of the file, creating it if needed.
    pub fn append_bytes(&self, bytes: &[u8]) -> Result<(), DatabaseError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }
}
