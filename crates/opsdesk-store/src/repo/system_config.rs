use super::{bool_to_sql, Predicate};
use crate::errors::{from_rusqlite, json_column, Result};
use opsdesk_core::model::{
    NewSystemConfig, Page, PageRequest, SystemConfig, SystemConfigFilter, SystemConfigPatch,
};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

const COLUMNS: &str =
    "id, config_key, config_value, description, is_active, created_at, updated_at";

/// Persistence for the `system_config` table
///
/// `config_value` is stored as JSON text and decoded on read.
pub struct SystemConfigRepo;

impl SystemConfigRepo {
    pub fn insert(conn: &Connection, config: &NewSystemConfig, now: i64) -> Result<SystemConfig> {
        let value = serde_json::to_string(&config.config_value)
            .map_err(|e| json_column("config_value", e))?;
        conn.execute(
            "INSERT INTO system_config
                (config_key, config_value, description, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?4)",
            rusqlite::params![config.config_key, value, config.description, now],
        )
        .map_err(from_rusqlite)?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, key = %config.config_key, "config inserted");
        conn.query_row(
            &format!("SELECT {} FROM system_config WHERE id = ?1", COLUMNS),
            [id],
            map_config,
        )
        .map_err(from_rusqlite)
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<SystemConfig>> {
        conn.query_row(
            &format!("SELECT {} FROM system_config WHERE id = ?1", COLUMNS),
            [id],
            map_config,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    pub fn get_by_key(conn: &Connection, key: &str) -> Result<Option<SystemConfig>> {
        conn.query_row(
            &format!("SELECT {} FROM system_config WHERE config_key = ?1", COLUMNS),
            [key],
            map_config,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// One page ordered by id, plus the filtered total
    pub fn list(
        conn: &Connection,
        filter: &SystemConfigFilter,
        page: PageRequest,
    ) -> Result<Page<SystemConfig>> {
        let predicate = predicate(filter);
        let sql = format!(
            "SELECT {} FROM system_config{} ORDER BY id ASC LIMIT ? OFFSET ?",
            COLUMNS,
            predicate.where_sql()
        );

        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let items = stmt
            .query_map(
                params_from_iter(predicate.params_with_page(page.limit, page.offset)),
                map_config,
            )
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM system_config{}", predicate.where_sql()),
                params_from_iter(predicate.params()),
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;

        Ok(Page {
            items,
            total: total.max(0) as u64,
            limit: page.limit,
            offset: page.offset,
        })
    }

    /// Apply a partial update and refresh `updated_at`
    pub fn update(
        conn: &Connection,
        id: i64,
        patch: &SystemConfigPatch,
        now: i64,
    ) -> Result<Option<SystemConfig>> {
        let mut sets = vec!["updated_at = MAX(?, updated_at + 1)"];
        let mut params: Vec<SqlValue> = vec![SqlValue::Integer(now)];
        if let Some(value) = &patch.config_value {
            let text = serde_json::to_string(value).map_err(|e| json_column("config_value", e))?;
            sets.push("config_value = ?");
            params.push(text.into());
        }
        if let Some(description) = &patch.description {
            sets.push("description = ?");
            params.push(description.clone().into());
        }
        if let Some(active) = patch.is_active {
            sets.push("is_active = ?");
            params.push(bool_to_sql(active).into());
        }
        params.push(SqlValue::Integer(id));

        let changed = conn
            .execute(
                &format!("UPDATE system_config SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(params),
            )
            .map_err(from_rusqlite)?;

        if changed == 0 {
            return Ok(None);
        }
        Self::get(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let removed = conn
            .execute("DELETE FROM system_config WHERE id = ?1", [id])
            .map_err(from_rusqlite)?;
        Ok(removed > 0)
    }
}

fn predicate(filter: &SystemConfigFilter) -> Predicate {
    let mut p = Predicate::default();
    p.push_opt("is_active = ?", filter.is_active.map(bool_to_sql));
    p
}

fn map_config(row: &Row<'_>) -> rusqlite::Result<SystemConfig> {
    let raw: String = row.get(2)?;
    let config_value = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    Ok(SystemConfig {
        id: row.get(0)?,
        config_key: row.get(1)?,
        config_value,
        description: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
