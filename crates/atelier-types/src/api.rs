use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Project, Role, User};

// -- JWT Claims --

/// JWT claims shared between the auth handlers and the require_auth
/// middleware. Canonical definition lives here in atelier-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub uid: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub uid: Uuid,
    pub username: String,
    pub token: String,
}

// -- Users --

/// PATCH /users/me — every field optional, present fields are applied.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

// -- Projects --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// PUT /projects/{pid} — full replace of the mutable fields.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RosterEntry {
    pub user: User,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: Project,
    pub owner: User,
    pub members: Vec<RosterEntry>,
}

// -- Membership --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddMemberRequest {
    pub uid: Uuid,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Viewer
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMemberRequest {
    pub role: Role,
}

// -- Friends --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendFriendRequest {
    pub recipient_uid: Uuid,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactRequest {
    #[serde(rename = "type")]
    pub kind: String,
}
