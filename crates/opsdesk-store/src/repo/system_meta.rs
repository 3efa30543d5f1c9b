use crate::errors::{from_rusqlite, Result};
use rusqlite::{Connection, OptionalExtension};

/// Key/value flags about the database itself
pub struct SystemMetaRepo;

impl SystemMetaRepo {
    /// Read a flag; `None` when unset or when the table does not exist yet
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        let has_table: bool = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'system_meta'",
                [],
                |_| Ok(true),
            )
            .optional()
            .map_err(from_rusqlite)?
            .unwrap_or(false);
        if !has_table {
            return Ok(None);
        }

        conn.query_row(
            "SELECT value FROM system_meta WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// Insert or overwrite a flag
    pub fn set(conn: &Connection, key: &str, value: &str, now: i64) -> Result<()> {
        conn.execute(
            "INSERT INTO system_meta (key, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value, now],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }
}
