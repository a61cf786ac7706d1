use rusqlite::Connection;

use atelier_types::models::Role;

use crate::error::OptionalExt;
use crate::models::{MemberRow, MemberWithUser, ProjectRow, UserRow};
use crate::users::query_user_by_id;
use crate::{Database, Result, StoreError};

/// Projects carrying this status are publicly listed.
pub const STATUS_PUBLISHED: &str = "PUBLISHED";
pub const STATUS_DRAFT: &str = "DRAFT";

impl Database {
    /// Insert the project and its OWNER membership row in one
    /// transaction; a project must never exist without its owner on the
    /// roster.
    pub fn create_project(
        &self,
        pid: &str,
        owner_uid: &str,
        name: &str,
        description: Option<&str>,
        status: &str,
    ) -> Result<ProjectRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_user_by_id(&tx, owner_uid)?.is_none() {
                return Err(StoreError::NotFound("user"));
            }

            tx.execute(
                "INSERT INTO projects (pid, name, description, status, owner_uid)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (pid, name, description, status, owner_uid),
            )?;
            tx.execute(
                "INSERT INTO project_members (pid, uid, role) VALUES (?1, ?2, ?3)",
                (pid, owner_uid, Role::Owner.as_str()),
            )?;

            let row = query_project(&tx, pid)?.ok_or(StoreError::NotFound("project"))?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn get_project(&self, pid: &str) -> Result<ProjectRow> {
        self.with_conn(|conn| query_project(conn, pid)?.ok_or(StoreError::NotFound("project")))
    }

    /// Project, owner, and the full roster with each member's user
    /// resolved — one consistent read under the connection lock.
    pub fn get_project_detail(
        &self,
        pid: &str,
    ) -> Result<(ProjectRow, UserRow, Vec<MemberWithUser>)> {
        self.with_conn(|conn| {
            let project = query_project(conn, pid)?.ok_or(StoreError::NotFound("project"))?;
            let owner = query_user_by_id(conn, &project.owner_uid)?
                .ok_or(StoreError::NotFound("user"))?;
            let members = query_roster(conn, pid)?;
            Ok((project, owner, members))
        })
    }

    pub fn list_published(&self) -> Result<Vec<ProjectRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT pid, name, description, status, owner_uid, created_at FROM projects
                 WHERE status = ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([STATUS_PUBLISHED], map_project_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Full replace of the mutable fields.
    pub fn update_project(
        &self,
        pid: &str,
        name: &str,
        description: Option<&str>,
        status: &str,
    ) -> Result<ProjectRow> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE projects SET name = ?1, description = ?2, status = ?3 WHERE pid = ?4",
                (name, description, status, pid),
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("project"));
            }
            query_project(conn, pid)?.ok_or(StoreError::NotFound("project"))
        })
    }

    /// Memberships and reactions go with the project (ON DELETE CASCADE).
    pub fn delete_project(&self, pid: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM projects WHERE pid = ?1", [pid])?;
            if deleted == 0 {
                return Err(StoreError::NotFound("project"));
            }
            Ok(())
        })
    }
}

pub(crate) fn query_project(conn: &Connection, pid: &str) -> Result<Option<ProjectRow>> {
    let mut stmt = conn.prepare(
        "SELECT pid, name, description, status, owner_uid, created_at FROM projects WHERE pid = ?1",
    )?;
    stmt.query_row([pid], map_project_row).optional()
}

pub(crate) fn query_roster(conn: &Connection, pid: &str) -> Result<Vec<MemberWithUser>> {
    let mut stmt = conn.prepare(
        "SELECT m.pid, m.uid, m.role, u.uid, u.email, u.username, u.password, u.created_at
         FROM project_members m
         JOIN users u ON u.uid = m.uid
         WHERE m.pid = ?1
         ORDER BY u.username",
    )?;
    let rows = stmt
        .query_map([pid], |row| {
            Ok(MemberWithUser {
                member: MemberRow {
                    pid: row.get(0)?,
                    uid: row.get(1)?,
                    role: row.get(2)?,
                },
                user: UserRow {
                    uid: row.get(3)?,
                    email: row.get(4)?,
                    username: row.get(5)?,
                    password: row.get(6)?,
                    created_at: row.get(7)?,
                },
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectRow> {
    Ok(ProjectRow {
        pid: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        owner_uid: row.get(4)?,
        created_at: row.get(5)?,
    })
}
