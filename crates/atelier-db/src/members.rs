use rusqlite::Connection;

use atelier_types::models::Role;

use crate::error::OptionalExt;
use crate::models::{MemberRow, MemberWithUser};
use crate::projects::{query_project, query_roster};
use crate::users::query_user_by_id;
use crate::{Database, Result, StoreError};

const ALREADY_MEMBER: &str = "user is already a member of this project";

impl Database {
    /// Fails on any existing (pid, uid) row, a PETITION included; role
    /// changes go through `update_member`.
    pub fn add_member(&self, pid: &str, uid: &str, role: Role) -> Result<MemberRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let row = insert_member(&tx, pid, uid, role)?;
            tx.commit()?;
            Ok(row)
        })
    }

    /// Upsert: overwrites the role of an existing row, inserts when
    /// there is none. The only sanctioned path for promoting a PETITION
    /// to an approved role.
    pub fn update_member(&self, pid: &str, uid: &str, role: Role) -> Result<MemberRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let row = if query_member(&tx, pid, uid)?.is_some() {
                tx.execute(
                    "UPDATE project_members SET role = ?1 WHERE pid = ?2 AND uid = ?3",
                    (role.as_str(), pid, uid),
                )?;
                query_member(&tx, pid, uid)?.ok_or(StoreError::NotFound("membership"))?
            } else {
                insert_member(&tx, pid, uid, role)?
            };

            tx.commit()?;
            Ok(row)
        })
    }

    pub fn get_member(&self, pid: &str, uid: &str) -> Result<Option<MemberRow>> {
        self.with_conn(|conn| query_member(conn, pid, uid))
    }

    pub fn remove_member(&self, pid: &str, uid: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM project_members WHERE pid = ?1 AND uid = ?2",
                (pid, uid),
            )?;
            if deleted == 0 {
                return Err(StoreError::NotFound("membership"));
            }
            Ok(())
        })
    }

    pub fn get_roster(&self, pid: &str) -> Result<Vec<MemberWithUser>> {
        self.with_conn(|conn| query_roster(conn, pid))
    }
}

fn insert_member(conn: &Connection, pid: &str, uid: &str, role: Role) -> Result<MemberRow> {
    if query_project(conn, pid)?.is_none() {
        return Err(StoreError::NotFound("project"));
    }
    if query_user_by_id(conn, uid)?.is_none() {
        return Err(StoreError::NotFound("user"));
    }
    if query_member(conn, pid, uid)?.is_some() {
        return Err(StoreError::Conflict(ALREADY_MEMBER));
    }

    conn.execute(
        "INSERT INTO project_members (pid, uid, role) VALUES (?1, ?2, ?3)",
        (pid, uid, role.as_str()),
    )
    .map_err(|e| StoreError::conflict_on_unique(e, ALREADY_MEMBER))?;

    query_member(conn, pid, uid)?.ok_or(StoreError::NotFound("membership"))
}

pub(crate) fn query_member(conn: &Connection, pid: &str, uid: &str) -> Result<Option<MemberRow>> {
    let mut stmt = conn
        .prepare("SELECT pid, uid, role FROM project_members WHERE pid = ?1 AND uid = ?2")?;
    stmt.query_row((pid, uid), |row| {
        Ok(MemberRow {
            pid: row.get(0)?,
            uid: row.get(1)?,
            role: row.get(2)?,
        })
    })
    .optional()
}
