use super::{bool_to_sql, Predicate};
use crate::errors::{from_rusqlite, Result};
use opsdesk_core::model::{
    NewUser, Page, PageRequest, SortOrder, User, UserFilter, UserPatch, UserSortKey,
};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

const COLUMNS: &str =
    "id, username, email, role, is_active, last_login_at, created_at, updated_at";

/// Persistence for the `users` table
pub struct UserRepo;

impl UserRepo {
    /// Insert a user and return the stored row
    ///
    /// # Errors
    ///
    /// A duplicate username or email surfaces as `ExErrorKind::AlreadyExists`.
    pub fn insert(conn: &Connection, user: &NewUser, now: i64) -> Result<User> {
        conn.execute(
            "INSERT INTO users (username, email, role, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?4)",
            rusqlite::params![user.username, user.email, user.role, now],
        )
        .map_err(from_rusqlite)?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, "user inserted");
        Self::require(conn, id)
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<User>> {
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", COLUMNS),
            [id],
            map_user,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// One page of users under the filter, plus the filtered total
    pub fn list(
        conn: &Connection,
        filter: &UserFilter,
        sort_by: UserSortKey,
        order: SortOrder,
        page: PageRequest,
    ) -> Result<Page<User>> {
        let predicate = predicate(filter);
        let sql = format!(
            "SELECT {} FROM users{} ORDER BY {} {}, id {} LIMIT ? OFFSET ?",
            COLUMNS,
            predicate.where_sql(),
            sort_by.column(),
            order.sql(),
            order.sql(),
        );

        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let items = stmt
            .query_map(
                params_from_iter(predicate.params_with_page(page.limit, page.offset)),
                map_user,
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

    pub fn count(conn: &Connection, filter: &UserFilter) -> Result<u64> {
        count_where(conn, &predicate(filter))
    }

    /// Apply a partial update and refresh `updated_at`
    ///
    /// Returns `None` when no row has the id.
    pub fn update(conn: &Connection, id: i64, patch: &UserPatch, now: i64) -> Result<Option<User>> {
        let mut sets = vec!["updated_at = MAX(?, updated_at + 1)"];
        let mut params: Vec<SqlValue> = vec![SqlValue::Integer(now)];
        if let Some(username) = &patch.username {
            sets.push("username = ?");
            params.push(username.clone().into());
        }
        if let Some(email) = &patch.email {
            sets.push("email = ?");
            params.push(email.clone().into());
        }
        if let Some(role) = &patch.role {
            sets.push("role = ?");
            params.push(role.clone().into());
        }
        if let Some(active) = patch.is_active {
            sets.push("is_active = ?");
            params.push(bool_to_sql(active).into());
        }
        params.push(SqlValue::Integer(id));

        let changed = conn
            .execute(
                &format!("UPDATE users SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(params),
            )
            .map_err(from_rusqlite)?;

        if changed == 0 {
            return Ok(None);
        }
        Self::get(conn, id)
    }

    /// Remove a user; returns whether a row was deleted
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let removed = conn
            .execute("DELETE FROM users WHERE id = ?1", [id])
            .map_err(from_rusqlite)?;
        Ok(removed > 0)
    }

    fn require(conn: &Connection, id: i64) -> Result<User> {
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", COLUMNS),
            [id],
            map_user,
        )
        .map_err(from_rusqlite)
    }
}

fn predicate(filter: &UserFilter) -> Predicate {
    let mut p = Predicate::default();
    p.push_opt("role = ?", filter.role.clone());
    p.push_opt("is_active = ?", filter.is_active.map(bool_to_sql));
    p
}

fn count_where(conn: &Connection, predicate: &Predicate) -> Result<u64> {
    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM users{}", predicate.where_sql()),
            params_from_iter(predicate.params()),
            |row| row.get(0),
        )
        .map_err(from_rusqlite)?;
    Ok(total.max(0) as u64)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
        last_login_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
