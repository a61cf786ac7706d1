use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use atelier_types::api::{Claims, ReactRequest};

use crate::auth::AppState;
use crate::error::ApiError;

/// PUT is deliberate: one reaction per user per project, last write
/// wins, so reacting twice with the same type is a no-op.
pub async fn react(
    State(state): State<AppState>,
    Path(pid): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ReactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.kind.trim().is_empty() {
        return Err(ApiError::BadRequest("reaction type must not be empty"));
    }

    let rid = Uuid::new_v4();
    let db = state.clone();
    let uid = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db.upsert_reaction(
            &rid.to_string(),
            &pid.to_string(),
            &uid,
            req.kind.trim(),
        )
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(row.into_reaction()))
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// `?type=UPVOTE` counts that type; without it, all reactions on the
/// project.
pub async fn counts(
    State(state): State<AppState>,
    Path(pid): Path<Uuid>,
    Query(query): Query<CountQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let count = tokio::task::spawn_blocking(move || {
        // Counting on a missing project is not an error, just zero.
        match &query.kind {
            Some(kind) => db.db.count_reactions_by_type(&pid.to_string(), kind),
            None => db.db.count_reactions(&pid.to_string()),
        }
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(serde_json::json!({ "count": count })))
}
