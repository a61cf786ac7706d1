use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub uid: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub pid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub owner_uid: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Membership role for one (project, user) pair. `Petition` is a pending
/// join request, not an approved role; every other variant grants full
/// project visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Editor,
    Viewer,
    Petition,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Editor => "EDITOR",
            Role::Viewer => "VIEWER",
            Role::Petition => "PETITION",
        }
    }

    /// True for every role except `Petition`.
    pub fn is_approved(&self) -> bool {
        !matches!(self, Role::Petition)
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWNER" => Ok(Role::Owner),
            "EDITOR" => Ok(Role::Editor),
            "VIEWER" => Ok(Role::Viewer),
            "PETITION" => Ok(Role::Petition),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendStatus::Pending => "PENDING",
            FriendStatus::Accepted => "ACCEPTED",
            FriendStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for FriendStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(FriendStatus::Pending),
            "ACCEPTED" => Ok(FriendStatus::Accepted),
            "REJECTED" => Ok(FriendStatus::Rejected),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for FriendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMember {
    pub pid: Uuid,
    pub uid: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    pub requestor_uid: Uuid,
    pub recipient_uid: Uuid,
    pub status: FriendStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub rid: Uuid,
    pub pid: Uuid,
    pub uid: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// What a given user is allowed to see of one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAccess {
    /// Owner, or any membership row with an approved role.
    Full,
    /// Has a PETITION row; waiting on the owner.
    AwaitingApproval,
    /// No membership row at all; must petition to join.
    MustPetition,
}

/// Visibility rule for project detail: the owner and every member whose
/// role is not PETITION see everything; a petitioner is told to wait;
/// anyone else is directed to petition.
pub fn project_access(owner_uid: Uuid, viewer_uid: Uuid, role: Option<Role>) -> ProjectAccess {
    if viewer_uid == owner_uid {
        return ProjectAccess::Full;
    }
    match role {
        Some(r) if r.is_approved() => ProjectAccess::Full,
        Some(_) => ProjectAccess::AwaitingApproval,
        None => ProjectAccess::MustPetition,
    }
}
