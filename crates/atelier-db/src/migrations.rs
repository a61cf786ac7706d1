use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            uid         TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS projects (
            pid         TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            description TEXT,
            status      TEXT NOT NULL DEFAULT 'DRAFT',
            owner_uid   TEXT NOT NULL REFERENCES users(uid),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_projects_owner
            ON projects(owner_uid);
        CREATE INDEX IF NOT EXISTS idx_projects_status
            ON projects(status);

        -- One row per (project, user) pair; the composite PK carries the
        -- membership uniqueness invariant.
        CREATE TABLE IF NOT EXISTS project_members (
            pid     TEXT NOT NULL REFERENCES projects(pid) ON DELETE CASCADE,
            uid     TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            role    TEXT NOT NULL DEFAULT 'VIEWER',
            PRIMARY KEY (pid, uid)
        );

        CREATE INDEX IF NOT EXISTS idx_members_user
            ON project_members(uid);

        -- Directed at creation; the unordered-pair invariant is checked
        -- in the service query on top of this PK.
        CREATE TABLE IF NOT EXISTS friend_requests (
            requestor_uid   TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            recipient_uid   TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            status          TEXT NOT NULL DEFAULT 'PENDING',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (requestor_uid, recipient_uid)
        );

        CREATE INDEX IF NOT EXISTS idx_friend_requests_recipient
            ON friend_requests(recipient_uid);

        CREATE TABLE IF NOT EXISTS reactions (
            rid         TEXT PRIMARY KEY,
            pid         TEXT NOT NULL REFERENCES projects(pid) ON DELETE CASCADE,
            uid         TEXT NOT NULL REFERENCES users(uid) ON DELETE CASCADE,
            type        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (pid, uid)
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_project
            ON reactions(pid);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
