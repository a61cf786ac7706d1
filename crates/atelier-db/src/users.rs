use rusqlite::Connection;

use crate::error::OptionalExt;
use crate::models::UserRow;
use crate::{Database, Result, StoreError};

const DUPLICATE_ACCOUNT: &str = "email or username already in use";

impl Database {
    /// Insert a new user. The email/username pre-check gives a friendly
    /// conflict; the UNIQUE constraints are the real guarantee against
    /// concurrent writers.
    pub fn create_user(
        &self,
        uid: &str,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let taken: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM users WHERE email = ?1 OR username = ?2",
                    (email, username),
                    |row| row.get(0),
                )
                .optional()?;
            if taken.is_some() {
                return Err(StoreError::Conflict(DUPLICATE_ACCOUNT));
            }

            conn.execute(
                "INSERT INTO users (uid, email, username, password) VALUES (?1, ?2, ?3, ?4)",
                (uid, email, username, password_hash),
            )
            .map_err(|e| StoreError::conflict_on_unique(e, DUPLICATE_ACCOUNT))?;

            query_user_by_id(conn, uid)?.ok_or(StoreError::NotFound("user"))
        })
    }

    pub fn get_user(&self, uid: &str) -> Result<UserRow> {
        self.with_conn(|conn| query_user_by_id(conn, uid)?.ok_or(StoreError::NotFound("user")))
    }

    /// Option rather than NotFound: login must not reveal whether the
    /// username exists.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT uid, email, username, password, created_at FROM users WHERE username = ?1",
            )?;
            stmt.query_row([username], map_user_row).optional()
        })
    }

    pub fn list_users(&self, limit: u32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT uid, email, username, password, created_at FROM users
                 ORDER BY created_at, uid
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_email(&self, uid: &str, email: &str) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let changed = conn
                .execute("UPDATE users SET email = ?1 WHERE uid = ?2", (email, uid))
                .map_err(|e| StoreError::conflict_on_unique(e, "email already in use"))?;
            if changed == 0 {
                return Err(StoreError::NotFound("user"));
            }
            query_user_by_id(conn, uid)?.ok_or(StoreError::NotFound("user"))
        })
    }

    pub fn update_username(&self, uid: &str, username: &str) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let changed = conn
                .execute(
                    "UPDATE users SET username = ?1 WHERE uid = ?2",
                    (username, uid),
                )
                .map_err(|e| StoreError::conflict_on_unique(e, "username already in use"))?;
            if changed == 0 {
                return Err(StoreError::NotFound("user"));
            }
            query_user_by_id(conn, uid)?.ok_or(StoreError::NotFound("user"))
        })
    }

    /// Apply any combination of account field changes as one
    /// transaction: a conflict on one field must not leave another
    /// half-applied.
    pub fn update_account(
        &self,
        uid: &str,
        email: Option<&str>,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_user_by_id(&tx, uid)?.is_none() {
                return Err(StoreError::NotFound("user"));
            }

            if let Some(email) = email {
                tx.execute("UPDATE users SET email = ?1 WHERE uid = ?2", (email, uid))
                    .map_err(|e| StoreError::conflict_on_unique(e, "email already in use"))?;
            }
            if let Some(username) = username {
                tx.execute(
                    "UPDATE users SET username = ?1 WHERE uid = ?2",
                    (username, uid),
                )
                .map_err(|e| StoreError::conflict_on_unique(e, "username already in use"))?;
            }
            if let Some(hash) = password_hash {
                tx.execute("UPDATE users SET password = ?1 WHERE uid = ?2", (hash, uid))?;
            }

            let row = query_user_by_id(&tx, uid)?.ok_or(StoreError::NotFound("user"))?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn update_password(&self, uid: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?1 WHERE uid = ?2",
                (password_hash, uid),
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("user"));
            }
            Ok(())
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, uid: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn
        .prepare("SELECT uid, email, username, password, created_at FROM users WHERE uid = ?1")?;
    stmt.query_row([uid], map_user_row).optional()
}

pub(crate) fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        uid: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}
