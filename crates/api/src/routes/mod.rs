pub mod health;
pub mod project;
pub mod sync;
pub mod team;
pub mod time_entry;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every route requires a bearer token.
///
/// ```text
/// /projects                                   list, create
/// /projects/team-assignment                   assign a project to a team (POST)
/// /projects/{id}                              get, update, delete
/// /projects/{id}/team                         clear the project's team (DELETE)
///
/// /teams                                      list, create
/// /teams/{id}                                 get, update, delete
/// /teams/{id}/users                           list members, add member
/// /teams/{id}/users/{user_id}                 remove member (DELETE)
/// /teams/{id}/users/{user_id}/roles           replace member roles (PUT)
///
/// /timeentries                                list (?projectId=&userId=), create
/// /timeentries/{id}                           get, update, delete
///
/// /sync/changed/{since}                       projects and time entries changed after `since`
/// /sync/projects/{since}                      projects changed after `since`
/// /sync/timeentries/{since}                   time entries changed after `since`
/// /sync/changed                               apply a client batch (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/teams", team::router())
        .nest("/timeentries", time_entry::router())
        .nest("/sync", sync::router())
}
