use std::fs;

use slotdb::{
    Config, StorageManager,
    executor::scan::Scanner,
    storage::{
        catalog::{Catalog, SchemaManager},
        schema::TableSchema,
    },
    types::{RecordLocation, SlotId, error::DatabaseError, record::Row},
    utils::mock::TempDatabase,
};

fn users_schema() -> TableSchema {
    TableSchema::from_definitions("users", &[("id", 4, true), ("name", 10, false)])
}

fn products_schema() -> TableSchema {
    TableSchema::from_definitions(
        "products",
        &[("sku", 8, true), ("title", 20, false), ("price", 6, false)],
    )
}

fn create_user_row(id: u32, name: &str) -> Row {
    Row::from_strs(&[id.to_string().as_str(), name])
}

#[test]
fn test_storage_manager_creation_new_database() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("new_db_test");
    let storage_manager = temp_db.create_storage_manager()?;
    assert!(storage_manager.get_table_names().is_empty());
    assert!(storage_manager.config.data_dir.is_dir());
    assert!(storage_manager.config.temp_dir.is_dir());
    Ok(())
}

#[test]
fn test_storage_manager_open_existing_database() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("existing_db_test");
    {
        let mut storage_manager = StorageManager::open(temp_db.config.clone())?;
        storage_manager.create_table(users_schema())?;
        storage_manager.insert_tuple("users", create_user_row(1, "alice"))?;
    }

    let storage_manager = StorageManager::open(temp_db.config.clone())?;
    assert!(storage_manager.table_exists("users"));
    assert_eq!(storage_manager.get_table_schema("users")?, users_schema());
    let rows = storage_manager.scan_table("users")?;
    assert_eq!(rows, vec![create_user_row(1, "alice")]);
    Ok(())
}

#[test]
fn test_multiple_tables() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("multi_table_test");
    let storage_manager = temp_db.create_storage_manager()?;
    storage_manager.create_table(users_schema())?;
    storage_manager.create_table(products_schema())?;

    storage_manager.insert_tuple("users", create_user_row(1, "alice"))?;
    storage_manager.insert_tuple("products", Row::from_strs(&["A-1", "lamp", "19.99"]))?;
    storage_manager.insert_tuple("products", Row::from_strs(&["A-2", "desk", "120"]))?;

    assert_eq!(storage_manager.get_table_names(), vec!["products", "users"]);
    assert_eq!(storage_manager.scan_table("users")?.len(), 1);
    assert_eq!(storage_manager.scan_table("products")?.len(), 2);
    Ok(())
}

#[test]
fn test_unknown_table_everywhere() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("unknown_table_test");
    let storage_manager = temp_db.create_storage_manager()?;

    let is_not_found = |result: Result<(), DatabaseError>| {
        matches!(result, Err(DatabaseError::TableNotFound { name }) if name == "ghost")
    };
    assert!(is_not_found(storage_manager.scan_table("ghost").map(|_| ())));
    assert!(is_not_found(storage_manager.insert_tuple("ghost", create_user_row(1, "a")).map(|_| ())));
    assert!(is_not_found(storage_manager.delete_tuple("ghost", &["1"]).map(|_| ())));
    assert!(is_not_found(storage_manager.get_by_pk("ghost", &["1"]).map(|_| ())));
    assert!(is_not_found(storage_manager.header_pointer("ghost").map(|_| ())));
    assert!(is_not_found(storage_manager.drop_table("ghost")));
    Ok(())
}

#[test]
fn test_missing_file_is_not_a_table() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("missing_file_test");
    let storage_manager = temp_db.create_storage_manager()?;
    storage_manager.create_table(users_schema())?;
    fs::remove_file(storage_manager.table_path("users"))?;

    assert!(!storage_manager.table_exists("users"));
    assert!(storage_manager.get_table_names().is_empty());
    assert!(matches!(
        storage_manager.scan_table("users"),
        Err(DatabaseError::TableNotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_drop_table() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("drop_table_test");
    let storage_manager = temp_db.create_storage_manager()?;
    storage_manager.create_table(users_schema())?;
    storage_manager.insert_tuple("users", create_user_row(1, "alice"))?;
    storage_manager.hash_equi_join(("users", "id"), ("users", "id"))?;
    let temp_dir = storage_manager.config.temp_dir.clone();
    assert!(fs::read_dir(&temp_dir)?.count() > 0);

    storage_manager.drop_table("users")?;
    assert!(!storage_manager.table_exists("users"));
    assert!(!storage_manager.table_path("users").exists());
    assert_eq!(fs::read_dir(&temp_dir)?.count(), 0);

    // The name is free again
    storage_manager.create_table(users_schema())?;
    assert!(storage_manager.scan_table("users")?.is_empty());
    Ok(())
}

#[test]
fn test_point_lookup_by_pk() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("lookup_test");
    let storage_manager = temp_db.create_storage_manager()?;
    storage_manager.create_table(users_schema())?;
    for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
        storage_manager.insert_tuple("users", create_user_row(id, name))?;
    }

    assert_eq!(
        storage_manager.point_lookup_by_pk("users", &["2"])?,
        Some(RecordLocation {
            block_index: 0,
            slot_index: 2
        })
    );
    assert_eq!(
        storage_manager.get_by_pk("users", &["3"])?,
        Some(create_user_row(3, "carol"))
    );
    assert_eq!(storage_manager.get_by_pk("users", &["9"])?, None);
    Ok(())
}

#[test]
fn test_full_scan_is_restartable() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("full_scan_test");
    let storage_manager = temp_db.create_storage_manager()?;
    storage_manager.create_table(users_schema())?;
    storage_manager.insert_tuple("users", create_user_row(1, "alice"))?;
    storage_manager.insert_tuple("users", create_user_row(2, "bob"))?;

    let mut iter = storage_manager.full_scan("users")?;
    let first: Vec<Row> = iter.by_ref().collect::<Result<_, _>>()?;
    assert_eq!(first.len(), 2);
    assert!(iter.next().is_none());

    // Picks up writes made after the first pass
    storage_manager.insert_tuple("users", create_user_row(3, "carol"))?;
    iter.restart()?;
    let second: Vec<Row> = iter.collect::<Result<_, _>>()?;
    assert_eq!(second.len(), 3);
    Ok(())
}

#[test]
fn test_custom_catalog() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("custom_catalog_test");
    let mut catalog = SchemaManager::new();
    catalog.register_table(products_schema())?;
    let mut storage_manager = StorageManager::with_catalog(temp_db.config.clone(), catalog)?;

    // Metadata without a file is not a table yet
    assert!(!storage_manager.table_exists("products"));
    storage_manager.create_table(users_schema())?;
    assert!(storage_manager.catalog().table_metadata_exists("users"));
    assert_eq!(storage_manager.insert_tuple("users", create_user_row(5, "eve"))?, SlotId(1));

    let mut scanner = storage_manager.create_scanner("users")?;
    assert_eq!(scanner.scan()?, Some(create_user_row(5, "eve")));
    assert_eq!(scanner.scan()?, None);
    Ok(())
}

#[test]
fn test_config_builder_layout() {
    let config = Config::builder()
        .data_dir("/tmp/slotdb-data")
        .temp_dir("/tmp/slotdb-scratch")
        .catalog_file("meta.bin")
        .partition_count(0)
        .build();
    assert_eq!(config.partition_count, 1);
    assert_eq!(config.table_path("users"), std::path::Path::new("/tmp/slotdb-data/users"));
    assert_eq!(config.catalog_path(), std::path::Path::new("/tmp/slotdb-data/meta.bin"));
}
