use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use atelier_types::api::{Claims, SendFriendRequest};
use atelier_types::models::{FriendRequest, User};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn send_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendFriendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let requestor = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db
            .send_friend_request(&requestor, &req.recipient_uid.to_string())
    })
    .await
    .map_err(ApiError::internal)??;

    Ok((StatusCode::CREATED, Json(row.into_request())))
}

/// The record is keyed by its original direction; only the recipient of
/// that directed request can accept it.
pub async fn accept_request(
    State(state): State<AppState>,
    Path(requestor_uid): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let recipient = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db
            .accept_friend_request(&requestor_uid.to_string(), &recipient)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(row.into_request()))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path(requestor_uid): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let recipient = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db
            .reject_friend_request(&requestor_uid.to_string(), &recipient)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(row.into_request()))
}

pub async fn list_friends(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.get_friends(&uid))
        .await
        .map_err(ApiError::internal)??;

    let friends: Vec<User> = rows.into_iter().map(|r| r.into_user()).collect();
    Ok(Json(friends))
}

pub async fn list_pending(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || db.db.pending_requests_for(&uid))
        .await
        .map_err(ApiError::internal)??;

    let requests: Vec<FriendRequest> = rows.into_iter().map(|r| r.into_request()).collect();
    Ok(Json(requests))
}
