//! Handlers for the `/timeentries` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use timeasy_core::types::EntityId;

use crate::dto::{TimeEntryDto, TimeEntryInputDto, TimeEntryQuery};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::state::AppState;

/// POST /api/v1/timeentries
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(input): ValidatedJson<TimeEntryInputDto>,
) -> AppResult<(StatusCode, Json<TimeEntryDto>)> {
    let entry = state
        .services
        .time_entries
        .create(input.into(), &caller)
        .await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET /api/v1/timeentries?projectId=&userId=
///
/// Without `userId` the caller's own entries are listed.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiQuery(query): ApiQuery<TimeEntryQuery>,
) -> AppResult<Json<Vec<TimeEntryDto>>> {
    let service = &state.services.time_entries;
    let entries = match query.project_id {
        Some(project_id) => {
            service
                .list_for_user_and_project(&caller, query.user_id, project_id)
                .await?
        }
        None => service.list_for_user(&caller, query.user_id).await?,
    };
    Ok(Json(entries.into_iter().map(TimeEntryDto::from).collect()))
}

/// GET /api/v1/timeentries/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> AppResult<Json<TimeEntryDto>> {
    let entry = state.services.time_entries.read(id, &caller).await?;
    Ok(Json(entry.into()))
}

/// PUT /api/v1/timeentries/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ValidatedJson(input): ValidatedJson<TimeEntryInputDto>,
) -> AppResult<Json<TimeEntryDto>> {
    let entry = state
        .services
        .time_entries
        .update(id, input.into(), &caller)
        .await?;
    Ok(Json(entry.into()))
}

/// DELETE /api/v1/timeentries/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> AppResult<StatusCode> {
    state.services.time_entries.delete(id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
