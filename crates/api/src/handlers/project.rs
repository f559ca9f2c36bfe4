//! Handlers for the `/projects` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use timeasy_core::types::EntityId;

use crate::dto::{ProjectDto, ProjectInput, ProjectTeamAssignmentInput};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::extract::{ApiPath, ValidatedJson};
use crate::state::AppState;

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(input): ValidatedJson<ProjectInput>,
) -> AppResult<(StatusCode, Json<ProjectDto>)> {
    let project = state.services.projects.create(&input.name, &caller).await?;
    Ok((StatusCode::CREATED, Json(project.into())))
}

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> AppResult<Json<Vec<ProjectDto>>> {
    let projects = state.services.projects.list(&caller).await?;
    Ok(Json(projects.into_iter().map(ProjectDto::from).collect()))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> AppResult<Json<ProjectDto>> {
    let project = state.services.projects.read(id, &caller).await?;
    Ok(Json(project.into()))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ValidatedJson(input): ValidatedJson<ProjectInput>,
) -> AppResult<Json<ProjectDto>> {
    let project = state
        .services
        .projects
        .update(id, &input.name, &caller)
        .await?;
    Ok(Json(project.into()))
}

/// DELETE /api/v1/projects/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> AppResult<StatusCode> {
    state.services.projects.delete(id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/team-assignment
pub async fn assign_to_team(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(input): ValidatedJson<ProjectTeamAssignmentInput>,
) -> AppResult<Json<ProjectDto>> {
    let project = state
        .services
        .projects
        .assign_to_team(input.project_id, input.team_id, &caller)
        .await?;
    Ok(Json(project.into()))
}

/// DELETE /api/v1/projects/{id}/team
pub async fn clear_team(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> AppResult<Json<ProjectDto>> {
    let project = state.services.projects.clear_team(id, &caller).await?;
    Ok(Json(project.into()))
}
