use contentmap_core::db::migrations::latest_version;
use contentmap_core::db::{open_db, open_db_in_memory};
use contentmap_core::{ContentStore, SqliteContentStore, StoreError, RECYCLE_BIN_NODE_ID};
use rusqlite::Connection;

#[test]
fn migration_creates_store_tables() {
    let conn = open_db_in_memory().unwrap();

    for table in ["nodes", "node_fields", "type_fields", "node_markup"] {
        let exists: i64 = conn
            .query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
                );",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1, "table `{table}` should exist");
    }

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn migration_seeds_root_and_recycle_bin() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteContentStore::try_new(&conn).unwrap();

    let root = store.get_node(1).unwrap().unwrap();
    assert_eq!(root.type_tag, "Root");
    assert_eq!(root.path, ",1,");

    let bin = store.get_node(RECYCLE_BIN_NODE_ID).unwrap().unwrap();
    assert_eq!(bin.type_tag, "RecycleBin");
    assert!(bin.path_contains(RECYCLE_BIN_NODE_ID));
}

#[test]
fn store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let Err(err) = SqliteContentStore::try_new(&conn) else {
        panic!("unmigrated connection should be rejected");
    };
    assert!(matches!(
        err,
        StoreError::UninitializedConnection { actual_version: 0, .. }
    ));
}

#[test]
fn file_backed_open_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content.db");

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteContentStore::try_new(&conn).unwrap();
        store
            .create_node("Persisted", 1, "Page", uuid::Uuid::new_v4())
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = SqliteContentStore::try_new(&conn).unwrap();
    let children = store.children_of(1).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "Persisted");
}
