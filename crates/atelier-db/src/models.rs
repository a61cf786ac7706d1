//! Database row types — these map directly to SQLite rows.
//! Ids and timestamps are stored as TEXT; conversion to the typed
//! atelier-types models happens here, in one place.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use atelier_types::models::{FriendRequest, FriendStatus, Project, ProjectMember, Reaction, Role, User};

pub struct UserRow {
    pub uid: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct ProjectRow {
    pub pid: String,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub owner_uid: String,
    pub created_at: String,
}

pub struct MemberRow {
    pub pid: String,
    pub uid: String,
    pub role: String,
}

pub struct FriendRequestRow {
    pub requestor_uid: String,
    pub recipient_uid: String,
    pub status: String,
    pub created_at: String,
}

pub struct ReactionRow {
    pub rid: String,
    pub pid: String,
    pub uid: String,
    pub kind: String,
    pub created_at: String,
}

/// A roster entry with its user resolved.
pub struct MemberWithUser {
    pub member: MemberRow,
    pub user: UserRow,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            uid: parse_uuid(&self.uid, "user uid"),
            email: self.email,
            username: self.username,
            created_at: parse_timestamp(&self.created_at),
        }
    }
}

impl ProjectRow {
    pub fn into_project(self) -> Project {
        Project {
            pid: parse_uuid(&self.pid, "project pid"),
            name: self.name,
            description: self.description,
            status: self.status,
            owner_uid: parse_uuid(&self.owner_uid, "project owner_uid"),
            created_at: parse_timestamp(&self.created_at),
        }
    }
}

impl MemberRow {
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_else(|e| {
            warn!("Corrupt membership role '{}': {}", self.role, e);
            Role::Viewer
        })
    }

    pub fn into_member(self) -> ProjectMember {
        let role = self.role();
        ProjectMember {
            pid: parse_uuid(&self.pid, "membership pid"),
            uid: parse_uuid(&self.uid, "membership uid"),
            role,
        }
    }
}

impl FriendRequestRow {
    pub fn into_request(self) -> FriendRequest {
        let status = self.status.parse().unwrap_or_else(|e| {
            warn!("Corrupt friend request status '{}': {}", self.status, e);
            FriendStatus::Pending
        });
        FriendRequest {
            requestor_uid: parse_uuid(&self.requestor_uid, "requestor_uid"),
            recipient_uid: parse_uuid(&self.recipient_uid, "recipient_uid"),
            status,
            created_at: parse_timestamp(&self.created_at),
        }
    }
}

impl ReactionRow {
    pub fn into_reaction(self) -> Reaction {
        Reaction {
            rid: parse_uuid(&self.rid, "reaction rid"),
            pid: parse_uuid(&self.pid, "reaction pid"),
            uid: parse_uuid(&self.uid, "reaction uid"),
            kind: self.kind,
            created_at: parse_timestamp(&self.created_at),
        }
    }
}

fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}': {}", raw, e);
            DateTime::default()
        })
}
