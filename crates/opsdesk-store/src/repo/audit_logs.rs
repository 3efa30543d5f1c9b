use super::Predicate;
use crate::errors::{from_rusqlite, json_column, Result};
use opsdesk_core::model::{AuditLog, AuditLogFilter, NewAuditEntry, Page, PageRequest};
use rusqlite::types::Type;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, action, entity, entity_id, user_id, details, timestamp, ip_address";

/// Persistence for the `audit_logs` table
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append an audit entry; returns its id
    pub fn insert(conn: &Connection, entry: &NewAuditEntry) -> Result<i64> {
        let details = entry
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| json_column("details", e))?;
        conn.execute(
            "INSERT INTO audit_logs (action, entity, entity_id, user_id, details, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                entry.action,
                entry.entity,
                entry.entity_id,
                entry.user_id,
                details,
                entry.timestamp,
            ],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<AuditLog>> {
        conn.query_row(
            &format!("SELECT {} FROM audit_logs WHERE id = ?1", COLUMNS),
            [id],
            map_audit_log,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// Newest first, plus the filtered total
    pub fn list(
        conn: &Connection,
        filter: &AuditLogFilter,
        page: PageRequest,
    ) -> Result<Page<AuditLog>> {
        let predicate = predicate(filter);
        let sql = format!(
            "SELECT {} FROM audit_logs{} ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
            COLUMNS,
            predicate.where_sql()
        );

        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let items = stmt
            .query_map(
                params_from_iter(predicate.params_with_page(page.limit, page.offset)),
                map_audit_log,
            )
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        Ok(Page {
            items,
            total: count_where(conn, &predicate)?,
            limit: page.limit,
            offset: page.offset,
        })
    }

    pub fn count(conn: &Connection, filter: &AuditLogFilter) -> Result<u64> {
        count_where(conn, &predicate(filter))
    }

    /// Delete every entry at or before the cutoff; returns how many went
    pub fn delete_older_than(conn: &Connection, cutoff: i64) -> Result<usize> {
        let removed = conn
            .execute("DELETE FROM audit_logs WHERE timestamp <= ?1", [cutoff])
            .map_err(from_rusqlite)?;
        tracing::debug!(removed, cutoff, "audit logs pruned");
        Ok(removed)
    }
}

fn predicate(filter: &AuditLogFilter) -> Predicate {
    let mut p = Predicate::default();
    p.push_opt("entity = ?", filter.entity.clone());
    p.push_opt("action = ?", filter.action.clone());
    p.push_opt("user_id = ?", filter.user_id.clone());
    p.push_opt("timestamp >= ?", filter.start);
    p.push_opt("timestamp <= ?", filter.end);
    p
}

fn count_where(conn: &Connection, predicate: &Predicate) -> Result<u64> {
    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM audit_logs{}", predicate.where_sql()),
            params_from_iter(predicate.params()),
            |row| row.get(0),
        )
        .map_err(from_rusqlite)?;
    Ok(total.max(0) as u64)
}

fn map_audit_log(row: &Row<'_>) -> rusqlite::Result<AuditLog> {
    let details = row
        .get::<_, Option<String>>(5)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(AuditLog {
        id: row.get(0)?,
        action: row.get(1)?,
        entity: row.get(2)?,
        entity_id: row.get(3)?,
        user_id: row.get(4)?,
        details,
        timestamp: row.get(6)?,
        ip_address: row.get(7)?,
    })
}
