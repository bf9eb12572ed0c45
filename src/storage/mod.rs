pub mod block_store;
pub mod catalog;
pub mod free_space;
pub mod schema;
pub mod storage_manager;

const CATALOG_MAGIC: &[u8; 8] = b"SLOTCAT1";
