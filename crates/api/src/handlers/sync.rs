//! Handlers for the `/sync` change feed and inbound batches.

use axum::extract::State;
use axum::Json;
use timeasy_core::sync::{SyncBatch, SyncSummary};
use timeasy_core::types::{from_unix, Timestamp};

use crate::dto::{ChangedProjectDto, ChangedTimeEntryDto, SyncEntries};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::extract::{ApiPath, ValidatedJson};
use crate::state::AppState;

fn cursor(since: i64) -> AppResult<Timestamp> {
    from_unix(since).ok_or_else(|| AppError::BadRequest(format!("invalid sync cursor {since}")))
}

/// GET /api/v1/sync/changed/{since}
pub async fn changed(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(since): ApiPath<i64>,
) -> AppResult<Json<SyncEntries>> {
    let changes = state.services.sync.changed(&caller, cursor(since)?).await?;
    Ok(Json(SyncEntries {
        projects: changes
            .projects
            .into_iter()
            .map(ChangedProjectDto::from)
            .collect(),
        time_entries: changes
            .time_entries
            .into_iter()
            .map(ChangedTimeEntryDto::from)
            .collect(),
    }))
}

/// GET /api/v1/sync/projects/{since}
pub async fn changed_projects(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(since): ApiPath<i64>,
) -> AppResult<Json<Vec<ChangedProjectDto>>> {
    let changes = state
        .services
        .sync
        .changed_projects(&caller, cursor(since)?)
        .await?;
    Ok(Json(changes.into_iter().map(ChangedProjectDto::from).collect()))
}

/// GET /api/v1/sync/timeentries/{since}
pub async fn changed_time_entries(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(since): ApiPath<i64>,
) -> AppResult<Json<Vec<ChangedTimeEntryDto>>> {
    let changes = state
        .services
        .sync
        .changed_time_entries(&caller, cursor(since)?)
        .await?;
    Ok(Json(
        changes
            .into_iter()
            .map(ChangedTimeEntryDto::from)
            .collect(),
    ))
}

/// POST /api/v1/sync/changed
///
/// Applies the client's local changes all-or-nothing.
pub async fn apply(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(entries): ValidatedJson<SyncEntries>,
) -> AppResult<Json<SyncSummary>> {
    let batch = SyncBatch::from(entries);
    let summary = state.services.sync.apply(batch, &caller).await?;
    Ok(Json(summary))
}
