use std::fs;

use slotdb::{
    storage::{
        block_store::BlockStore,
        free_space::{AllocationKind, FreeSpaceManager, encode_free_slot},
        schema::TableSchema,
    },
    types::{BLOCK_SIZE, SlotId, error::DatabaseError, record::Row},
    utils::mock::TempDatabase,
};

// id:4 + val:6 => record length 10, blocking factor 14
fn pairs_schema(name: &str) -> TableSchema {
    TableSchema::from_definitions(name, &[("id", 4, true), ("val", 6, false)])
}

fn row(id: usize) -> Row {
    Row::from_strs(&[id.to_string().as_str(), "v"])
}

#[test]
fn test_linear_fill_then_append() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("fs_linear");
    let storage = temp_db.create_storage_manager()?;
    storage.create_table(pairs_schema("t"))?;

    for i in 1..=13 {
        assert_eq!(storage.insert_tuple("t", row(i))?, SlotId(i as u32));
    }
    assert_eq!(fs::metadata(storage.table_path("t"))?.len(), BLOCK_SIZE as u64);
    assert_eq!(storage.header_pointer("t")?, SlotId(14));

    // Slot 14 is slot 0 of block 1, past the end of the file
    assert_eq!(storage.insert_tuple("t", row(14))?, SlotId(14));
    assert_eq!(fs::metadata(storage.table_path("t"))?.len(), 2 * BLOCK_SIZE as u64);
    assert_eq!(storage.header_pointer("t")?, SlotId(15));
    assert_eq!(storage.scan_table("t")?.len(), 14);
    Ok(())
}

#[test]
fn test_freed_slots_are_reused_lifo() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("fs_lifo");
    let storage = temp_db.create_storage_manager()?;
    storage.create_table(pairs_schema("t"))?;
    for i in 1..=5 {
        storage.insert_tuple("t", row(i))?;
    }

    assert_eq!(storage.delete_tuple("t", &["2"])?, SlotId(2));
    assert_eq!(storage.delete_tuple("t", &["4"])?, SlotId(4));
    assert_eq!(storage.header_pointer("t")?, SlotId(4));

    let free_list = storage.free_list("t")?;
    assert_eq!(free_list.nodes, vec![SlotId(4), SlotId(2)]);
    assert_eq!(free_list.append_cursor, SlotId(6));

    assert_eq!(storage.insert_tuple("t", row(40))?, SlotId(4));
    assert_eq!(storage.insert_tuple("t", row(20))?, SlotId(2));
    assert_eq!(storage.insert_tuple("t", row(6))?, SlotId(6));
    assert_eq!(storage.free_list("t")?.nodes, Vec::<SlotId>::new());
    Ok(())
}

#[test]
fn test_freed_slot_bytes_on_disk() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("fs_bytes");
    let storage = temp_db.create_storage_manager()?;
    storage.create_table(pairs_schema("t"))?;
    storage.insert_tuple("t", row(1))?;
    storage.insert_tuple("t", row(2))?;
    storage.delete_tuple("t", &["2"])?;

    let bytes = fs::read(storage.table_path("t"))?;
    // Header now points at slot 2
    assert_eq!(&bytes[0..10], encode_free_slot(SlotId(2), 10).as_slice());
    // Slot 2 links to the old head, slot 3
    assert_eq!(&bytes[20..30], encode_free_slot(SlotId(3), 10).as_slice());
    Ok(())
}

#[test]
fn test_live_or_free_after_interleaving() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("fs_interleave");
    let storage = temp_db.create_storage_manager()?;
    storage.create_table(pairs_schema("t"))?;

    let mut live_ids = Vec::new();
    for i in 1..=40 {
        storage.insert_tuple("t", row(i))?;
        live_ids.push(i);
        if i % 3 == 0 {
            let victim = live_ids.remove(live_ids.len() / 2);
            storage.delete_tuple("t", &[victim.to_string()])?;
        }
        if i % 7 == 0 {
            storage.insert_tuple("t", row(1000 + i))?;
            live_ids.push(1000 + i);
        }
    }

    let free_list = storage.free_list("t")?;
    let mut scanned: Vec<usize> = storage
        .scan_table("t")?
        .iter()
        .map(|r| r.text(0).unwrap_or_default().parse().unwrap())
        .collect();
    scanned.sort();
    live_ids.sort();
    assert_eq!(scanned, live_ids);

    // Every slot below the linear cursor is exactly one of live or listed
    let bf = pairs_schema("t").blocking_factor();
    let mut live_slots = Vec::new();
    let mut scanner = storage.create_scanner("t")?;
    while let Some(record) = scanner.next_record()? {
        live_slots.push(record.location.slot_id(bf));
    }
    for n in 1..free_list.append_cursor.0 {
        let slot = SlotId(n);
        let is_live = live_slots.contains(&slot);
        let is_listed = free_list.nodes.contains(&slot);
        assert!(is_live ^ is_listed, "slot {} live={} listed={}", slot, is_live, is_listed);
    }
    assert_eq!(live_slots.len() + free_list.nodes.len(), free_list.append_cursor.0 as usize - 1);
    Ok(())
}

#[test]
fn test_header_survives_reopen() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("fs_reopen");
    {
        let storage = temp_db.create_storage_manager()?;
        storage.create_table(pairs_schema("t"))?;
        for i in 1..=3 {
            storage.insert_tuple("t", row(i))?;
        }
        storage.delete_tuple("t", &["1"])?;
    }

    let storage = temp_db.create_storage_manager()?;
    assert_eq!(storage.header_pointer("t")?, SlotId(1));
    assert_eq!(storage.insert_tuple("t", row(9))?, SlotId(1));
    assert_eq!(storage.insert_tuple("t", row(4))?, SlotId(4));
    Ok(())
}

#[test]
fn test_allocate_slot_reports_kind_without_writing() -> Result<(), DatabaseError> {
    let dir = tempfile::tempdir()?;
    let store = BlockStore::create(dir.path().join("t"), &FreeSpaceManager::initial_block(70)?)?;
    let manager = FreeSpaceManager::new(&store, "t", 70)?;
    assert_eq!(manager.blocking_factor(), 2);

    let before = fs::read(store.path())?;
    let allocation = manager.allocate_slot()?;
    assert_eq!(allocation.slot, SlotId(1));
    assert_eq!(allocation.kind, AllocationKind::Linear);
    assert_eq!(fs::read(store.path())?, before);

    let record = vec![7u8; 70];
    assert_eq!(manager.place_record(&record)?, SlotId(1));
    let allocation = manager.allocate_slot()?;
    assert_eq!(allocation.kind, AllocationKind::Append);
    assert_eq!(allocation.next_head, SlotId(3));

    manager.free_slot(SlotId(1))?;
    let allocation = manager.allocate_slot()?;
    assert_eq!(allocation.kind, AllocationKind::Reuse);
    assert_eq!(allocation.next_head, SlotId(2));
    Ok(())
}

#[test]
fn test_free_slot_rejects_bad_targets() -> Result<(), DatabaseError> {
    let dir = tempfile::tempdir()?;
    let store = BlockStore::create(dir.path().join("t"), &FreeSpaceManager::initial_block(10)?)?;
    let manager = FreeSpaceManager::new(&store, "t", 10)?;
    manager.place_record(&[b'a'; 10])?;

    assert!(matches!(
        manager.free_slot(SlotId::HEADER),
        Err(DatabaseError::InvalidSlotIndex { index: 0, .. })
    ));
    assert!(matches!(
        manager.free_slot(SlotId(14)),
        Err(DatabaseError::SlotOutOfBounds { .. })
    ));
    // Never written
    assert!(matches!(
        manager.free_slot(SlotId(5)),
        Err(DatabaseError::CorruptedTable { .. })
    ));
    manager.free_slot(SlotId(1))?;
    assert!(matches!(
        manager.free_slot(SlotId(1)),
        Err(DatabaseError::CorruptedTable { .. })
    ));
    Ok(())
}

#[test]
fn test_record_too_short_for_link() {
    let dir = tempfile::tempdir().unwrap();
    let store = BlockStore::at(dir.path().join("t"));
    assert!(matches!(
        FreeSpaceManager::new(&store, "t", 4),
        Err(DatabaseError::InvalidSchema { .. })
    ));
    assert!(matches!(
        FreeSpaceManager::new(&store, "t", 141),
        Err(DatabaseError::InvalidSchema { .. })
    ));
}

#[test]
fn test_zero_header_is_corruption() -> Result<(), DatabaseError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("t");
    fs::write(&path, vec![0u8; BLOCK_SIZE])?;
    let store = BlockStore::open(&path)?;
    let manager = FreeSpaceManager::new(&store, "t", 10)?;
    assert!(matches!(
        manager.read_header(),
        Err(DatabaseError::CorruptedTable { .. })
    ));
    Ok(())
}
