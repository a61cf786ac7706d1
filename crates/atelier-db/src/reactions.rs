use rusqlite::Connection;

use crate::error::OptionalExt;
use crate::models::ReactionRow;
use crate::projects::query_project;
use crate::{Database, Result, StoreError};

impl Database {
    /// Upsert keyed by (pid, uid): one reaction per user per project,
    /// last write wins. A fresh `rid` is only consumed on insert; an
    /// update keeps the existing row's id.
    pub fn upsert_reaction(
        &self,
        rid: &str,
        pid: &str,
        uid: &str,
        kind: &str,
    ) -> Result<ReactionRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_project(&tx, pid)?.is_none() {
                return Err(StoreError::NotFound("project"));
            }

            match query_reaction(&tx, pid, uid)? {
                Some(existing) => {
                    if existing.kind != kind {
                        tx.execute(
                            "UPDATE reactions SET type = ?1 WHERE pid = ?2 AND uid = ?3",
                            (kind, pid, uid),
                        )?;
                    }
                }
                None => {
                    // UNIQUE(pid, uid) backstops a race between the check
                    // and this insert.
                    tx.execute(
                        "INSERT INTO reactions (rid, pid, uid, type) VALUES (?1, ?2, ?3, ?4)",
                        (rid, pid, uid, kind),
                    )
                    .map_err(|e| {
                        StoreError::conflict_on_unique(e, "user has already reacted to this project")
                    })?;
                }
            }

            let row =
                query_reaction(&tx, pid, uid)?.ok_or(StoreError::NotFound("reaction"))?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn count_reactions_by_type(&self, pid: &str, kind: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(rid) FROM reactions WHERE pid = ?1 AND type = ?2",
                (pid, kind),
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    pub fn count_reactions(&self, pid: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(rid) FROM reactions WHERE pid = ?1",
                [pid],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

fn query_reaction(conn: &Connection, pid: &str, uid: &str) -> Result<Option<ReactionRow>> {
    let mut stmt = conn.prepare(
        "SELECT rid, pid, uid, type, created_at FROM reactions WHERE pid = ?1 AND uid = ?2",
    )?;
    stmt.query_row((pid, uid), |row| {
        Ok(ReactionRow {
            rid: row.get(0)?,
            pid: row.get(1)?,
            uid: row.get(2)?,
            kind: row.get(3)?,
            created_at: row.get(4)?,
        })
    })
    .optional()
}
