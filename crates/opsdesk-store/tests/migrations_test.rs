// Integration tests for the migration framework

use opsdesk_store::migrations::{applied_migrations, apply_migrations};
use opsdesk_store::Database;
use rusqlite::Connection;
use tempfile::TempDir;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    let mut conn = setup_test_db();

    let result = apply_migrations(&mut conn);
    assert!(
        result.is_ok(),
        "Migrations should succeed: {:?}",
        result.err()
    );

    let tables = get_table_names(&conn);
    for expected in [
        "schema_version",
        "system_meta",
        "users",
        "system_config",
        "audit_logs",
        "api_commands",
    ] {
        assert!(
            tables.contains(&expected.to_string()),
            "Missing table: {}",
            expected
        );
    }
}

#[test]
fn test_initialized_flag_seeded() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    let value: String = conn
        .query_row(
            "SELECT value FROM system_meta WHERE key = 'db_initialized'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(value, "true");
}

#[test]
fn test_migration_idempotency() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    apply_migrations(&mut conn).unwrap();

    let applied = applied_migrations(&conn).unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].migration_id, "001_initial_schema");
    assert_eq!(applied[0].checksum.as_ref().map(|c| c.len()), Some(64));

    let flags: i64 = conn
        .query_row("SELECT COUNT(*) FROM system_meta", [], |row| row.get(0))
        .unwrap();
    assert_eq!(flags, 1, "Re-running must not re-seed system_meta");
}

#[test]
fn test_unmigrated_db_reports_no_migrations() {
    let conn = setup_test_db();
    assert!(applied_migrations(&conn).unwrap().is_empty());
}

#[test]
fn test_file_database_persists_across_handles() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("ops.db").display());

    {
        let db = Database::connect(&url).unwrap();
        assert_eq!(db.migrate().unwrap(), 1);
    }

    let reopened = Database::connect(&url).unwrap();
    assert_eq!(reopened.migrate().unwrap(), 0);
    assert!(reopened.is_initialized().unwrap());
}
