use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use atelier_db::Database;
use atelier_db::models::ProjectRow;
use atelier_db::projects::STATUS_DRAFT;
use atelier_types::api::{
    Claims, CreateProjectRequest, ProjectDetailResponse, RosterEntry, UpdateProjectRequest,
};
use atelier_types::models::{Project, ProjectAccess, project_access};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn create_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("project name must not be empty"));
    }

    let pid = Uuid::new_v4();
    let db = state.clone();
    let owner_uid = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        db.db.create_project(
            &pid.to_string(),
            &owner_uid,
            req.name.trim(),
            req.description.as_deref(),
            req.status.as_deref().unwrap_or(STATUS_DRAFT),
        )
    })
    .await
    .map_err(ApiError::internal)??;

    Ok((StatusCode::CREATED, Json(row.into_project())))
}

pub async fn list_published(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_published())
        .await
        .map_err(ApiError::internal)??;

    let projects: Vec<Project> = rows.into_iter().map(|r| r.into_project()).collect();
    Ok(Json(projects))
}

/// Full detail is gated on the roster: the owner and approved members
/// see everything; a petitioner is told to wait; everyone else is
/// directed to petition.
pub async fn get_project(
    State(state): State<AppState>,
    Path(pid): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let viewer_uid = claims.sub;

    let (project, owner, members, viewer_role) = tokio::task::spawn_blocking(move || {
        let (project, owner, members) = db.db.get_project_detail(&pid.to_string())?;
        let viewer_role = db
            .db
            .get_member(&pid.to_string(), &viewer_uid.to_string())?
            .map(|m| m.role());
        Ok::<_, atelier_db::StoreError>((project, owner, members, viewer_role))
    })
    .await
    .map_err(ApiError::internal)??;

    let project = project.into_project();
    match project_access(project.owner_uid, viewer_uid, viewer_role) {
        ProjectAccess::Full => {}
        ProjectAccess::AwaitingApproval => {
            return Err(ApiError::Forbidden(
                "your petition to join this project is awaiting approval",
            ));
        }
        ProjectAccess::MustPetition => {
            return Err(ApiError::Forbidden(
                "petition to join this project to view its details",
            ));
        }
    }

    let members = members
        .into_iter()
        .map(|m| RosterEntry {
            role: m.member.role(),
            user: m.user.into_user(),
        })
        .collect();

    Ok(Json(ProjectDetailResponse {
        project,
        owner: owner.into_user(),
        members,
    }))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(pid): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("project name must not be empty"));
    }

    let db = state.clone();
    let uid = claims.sub.to_string();
    let row = tokio::task::spawn_blocking(move || {
        ensure_owner(&db.db, &pid.to_string(), &uid)?;
        Ok::<_, ApiError>(db.db.update_project(
            &pid.to_string(),
            req.name.trim(),
            req.description.as_deref(),
            &req.status,
        )?)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(row.into_project()))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(pid): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let uid = claims.sub.to_string();
    tokio::task::spawn_blocking(move || {
        ensure_owner(&db.db, &pid.to_string(), &uid)?;
        Ok::<_, ApiError>(db.db.delete_project(&pid.to_string())?)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(StatusCode::NO_CONTENT)
}

/// Roster mutations and project edits are owner-only.
pub(crate) fn ensure_owner(db: &Database, pid: &str, uid: &str) -> Result<ProjectRow, ApiError> {
    let project = db.get_project(pid)?;
    if project.owner_uid != uid {
        return Err(ApiError::Forbidden("only the project owner can do that"));
    }
    Ok(project)
}
