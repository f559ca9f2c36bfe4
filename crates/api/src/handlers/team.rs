//! Handlers for the `/teams` resource and its memberships.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use timeasy_core::types::EntityId;

use crate::dto::{parse_roles, AddMemberInput, MembershipDto, RolesInput, TeamDto, TeamInput};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::extract::{ApiPath, ValidatedJson};
use crate::state::AppState;

/// POST /api/v1/teams
///
/// The caller becomes the team's first admin.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(input): ValidatedJson<TeamInput>,
) -> AppResult<(StatusCode, Json<TeamDto>)> {
    let team = state.services.teams.create(input.into(), &caller).await?;
    Ok((StatusCode::CREATED, Json(team.into())))
}

/// GET /api/v1/teams
pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> AppResult<Json<Vec<TeamDto>>> {
    let teams = state.services.teams.list(&caller).await?;
    Ok(Json(teams.into_iter().map(TeamDto::from).collect()))
}

/// GET /api/v1/teams/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> AppResult<Json<TeamDto>> {
    let team = state.services.teams.read(id, &caller).await?;
    Ok(Json(team.into()))
}

/// PUT /api/v1/teams/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ValidatedJson(input): ValidatedJson<TeamInput>,
) -> AppResult<Json<TeamDto>> {
    let team = state
        .services
        .teams
        .update(id, input.into(), &caller)
        .await?;
    Ok(Json(team.into()))
}

/// DELETE /api/v1/teams/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> AppResult<StatusCode> {
    state.services.teams.delete(id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/teams/{id}/users
pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
) -> AppResult<Json<Vec<MembershipDto>>> {
    let members = state.services.teams.list_members(id, &caller).await?;
    Ok(Json(members.into_iter().map(MembershipDto::from).collect()))
}

/// POST /api/v1/teams/{id}/users
pub async fn add_member(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<EntityId>,
    ValidatedJson(input): ValidatedJson<AddMemberInput>,
) -> AppResult<(StatusCode, Json<MembershipDto>)> {
    let roles = parse_roles(&input.roles)?;
    let membership = state
        .services
        .teams
        .add_member(id, input.id, roles, &caller)
        .await?;
    Ok((StatusCode::CREATED, Json(membership.into())))
}

/// DELETE /api/v1/teams/{id}/users/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath((id, user_id)): ApiPath<(EntityId, EntityId)>,
) -> AppResult<StatusCode> {
    state
        .services
        .teams
        .remove_member(id, user_id, &caller)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/teams/{id}/users/{user_id}/roles
pub async fn set_member_roles(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath((id, user_id)): ApiPath<(EntityId, EntityId)>,
    ValidatedJson(input): ValidatedJson<RolesInput>,
) -> AppResult<Json<MembershipDto>> {
    let roles = parse_roles(&input.roles)?;
    let membership = state
        .services
        .teams
        .set_member_roles(id, user_id, roles, &caller)
        .await?;
    Ok(Json(membership.into()))
}
