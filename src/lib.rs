//! # slotdb
//!
//! Single-file-per-table storage engine for fixed-length records, with an
//! on-disk free list threaded through unused slots and a grace hash
//! equi-join operator.
//!
//! ```text
//!   StorageManager (create / insert / delete / scan / lookup / join)
//!        │
//!        ├── Catalog ─────────── table + column metadata
//!        ├── FreeSpaceManager ── header pointer + free-slot links
//!        ├── record codec ────── fixed-width, zero-padded fields
//!        └── BlockStore ──────── 140-byte block I/O
//!
//!   HashJoinExecutor ── Partitioner ── SequentialScanner
//! ```

pub mod config;
pub mod executor;
pub mod storage;
pub mod types;
pub mod utils;

pub use config::Config;
pub use storage::storage_manager::StorageManager;
pub use types::error::{DatabaseError, Result};

/// Current version of slotdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
