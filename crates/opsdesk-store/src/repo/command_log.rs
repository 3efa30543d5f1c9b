use crate::errors::{from_rusqlite, json_column, Result};
use opsdesk_core::model::{CommandLogEntry, CommandLogSummary, CommandStatus};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};

const COLUMNS: &str = "command_id, entity, operation, request_data, response_data, status, \
                       duration, error_message, executed_at";

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Persistence for the append-only `api_commands` table
pub struct CommandLogRepo;

impl CommandLogRepo {
    pub fn insert(conn: &Connection, entry: &CommandLogEntry) -> Result<()> {
        let request = encode(&entry.request_data, "request_data")?;
        let response = encode(&entry.response_data, "response_data")?;
        conn.execute(
            "INSERT INTO api_commands
                (command_id, entity, operation, request_data, response_data,
                 status, duration, error_message, executed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                entry.command_id,
                entry.entity,
                entry.operation,
                request,
                response,
                entry.status.as_str(),
                entry.duration,
                entry.error_message,
                entry.executed_at,
            ],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn get(conn: &Connection, command_id: &str) -> Result<Option<CommandLogEntry>> {
        conn.query_row(
            &format!("SELECT {} FROM api_commands WHERE command_id = ?1", COLUMNS),
            [command_id],
            map_entry,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// Most recent entries first
    pub fn recent(conn: &Connection, limit: u32) -> Result<Vec<CommandLogEntry>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM api_commands ORDER BY executed_at DESC, id DESC LIMIT ?1",
                COLUMNS
            ))
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([limit], map_entry)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }

    pub fn count(conn: &Connection) -> Result<u64> {
        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM api_commands", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
        Ok(total.max(0) as u64)
    }

    /// Totals overall, over the last hour and day, and by outcome
    pub fn summary(conn: &Connection, now: i64) -> Result<CommandLogSummary> {
        conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN executed_at >= ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN executed_at >= ?2 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0)
             FROM api_commands",
            [now - HOUR_MS, now - DAY_MS],
            |row| {
                let count = |idx: usize| row.get::<_, i64>(idx).map(|n| n.max(0) as u64);
                Ok(CommandLogSummary {
                    total: count(0)?,
                    last_hour: count(1)?,
                    last_day: count(2)?,
                    successful: count(3)?,
                    failed: count(4)?,
                })
            },
        )
        .map_err(from_rusqlite)
    }
}

fn encode(value: &Option<serde_json::Value>, column: &str) -> Result<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| json_column(column, e))
}

fn decode(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<serde_json::Value>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<CommandLogEntry> {
    let status: String = row.get(5)?;
    let status = status.parse::<CommandStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })?;
    Ok(CommandLogEntry {
        command_id: row.get(0)?,
        entity: row.get(1)?,
        operation: row.get(2)?,
        request_data: decode(row, 3)?,
        response_data: decode(row, 4)?,
        status,
        duration: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
        error_message: row.get(7)?,
        executed_at: row.get(8)?,
    })
}
