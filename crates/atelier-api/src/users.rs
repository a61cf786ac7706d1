use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use atelier_types::api::{Claims, UpdateAccountRequest};
use atelier_types::models::User;

use crate::auth::{AppState, hash_password, validate_email, validate_password, validate_username};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let limit = query.limit.min(500);

    let rows = tokio::task::spawn_blocking(move || db.db.list_users(limit))
        .await
        .map_err(ApiError::internal)??;

    let users: Vec<User> = rows.into_iter().map(|r| r.into_user()).collect();
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_user(&uid.to_string()))
        .await
        .map_err(ApiError::internal)??;

    Ok(Json(row.into_user()))
}

/// PATCH /users/me — applies whichever of email/username/password are
/// present, each with the same validation as registration.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.is_none() && req.username.is_none() && req.password.is_none() {
        return Err(ApiError::BadRequest("no fields to update"));
    }

    if let Some(email) = &req.email {
        validate_email(email)?;
    }
    if let Some(username) = &req.username {
        validate_username(username)?;
    }
    let password_hash = match &req.password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    // One transaction for the whole request: a conflict on any field
    // leaves the account untouched.
    let db = state.clone();
    let uid = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db.update_account(
            &uid,
            req.email.as_deref(),
            req.username.as_deref(),
            password_hash.as_deref(),
        )
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(row.into_user()))
}
