use petition_core::db::migrations::latest_version;
use petition_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "books",
        "sections",
        "paragraphs",
        "resolutions",
        "petitions",
        "petition_targets",
        "petition_versions",
        "committees",
        "committee_memberships",
        "committee_jurisdictions",
        "petition_assignments",
        "committee_actions",
        "plenary_sessions",
        "calendar_items",
        "plenary_actions",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("petitions.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "petition_assignments");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO petition_assignments (id, petition_id, committee_id, assigned_by)
             VALUES ('a', 'missing-petition', 'missing-committee', 'u');",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn duplicate_assignment_pair_is_a_unique_violation() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO petitions (id, conference_id, display_number, title, submitter_id)
         VALUES ('p', 'c', 'P-0001', 't', 'u');
         INSERT INTO committees (id, name, abbreviation) VALUES ('k', 'Finance', 'FA');
         INSERT INTO petition_assignments (id, petition_id, committee_id, assigned_by)
         VALUES ('a1', 'p', 'k', 'u');",
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO petition_assignments (id, petition_id, committee_id, assigned_by)
             VALUES ('a2', 'p', 'k', 'u');",
            [],
        )
        .unwrap_err();
    assert!(petition_core::db::is_unique_violation(&err));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
