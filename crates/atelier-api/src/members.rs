use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use atelier_types::api::{AddMemberRequest, Claims, UpdateMemberRequest};
use atelier_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::projects::ensure_owner;

/// Owner adds a user directly, bypassing the petition flow. Conflicts
/// on any existing row; promotions go through `update_member`.
pub async fn add_member(
    State(state): State<AppState>,
    Path(pid): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        ensure_owner(&db.db, &pid.to_string(), &caller)?;
        Ok::<_, ApiError>(
            db.db
                .add_member(&pid.to_string(), &req.uid.to_string(), req.role)?,
        )
    })
    .await
    .map_err(ApiError::internal)??;

    Ok((StatusCode::CREATED, Json(row.into_member())))
}

/// Role overwrite / petition approval. Behaves as add when no row
/// exists yet.
pub async fn update_member(
    State(state): State<AppState>,
    Path((pid, uid)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        ensure_owner(&db.db, &pid.to_string(), &caller)?;
        Ok::<_, ApiError>(
            db.db
                .update_member(&pid.to_string(), &uid.to_string(), req.role)?,
        )
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(row.into_member()))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((pid, uid)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller = claims.sub.to_string();
    tokio::task::spawn_blocking(move || {
        let project = ensure_owner(&db.db, &pid.to_string(), &caller)?;
        if project.owner_uid == uid.to_string() {
            return Err(ApiError::BadRequest(
                "the owner cannot be removed from their own project",
            ));
        }
        Ok(db.db.remove_member(&pid.to_string(), &uid.to_string())?)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(StatusCode::NO_CONTENT)
}

/// Current user asks to join: a membership row with role PETITION,
/// promoted (or removed) later by the owner.
pub async fn petition(
    State(state): State<AppState>,
    Path(pid): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db.add_member(&pid.to_string(), &uid, Role::Petition)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok((StatusCode::CREATED, Json(row.into_member())))
}
