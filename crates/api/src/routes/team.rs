use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::team;
use crate::state::AppState;

/// Routes mounted at `/teams`.
///
/// ```text
/// GET    /                              -> list
/// POST   /                              -> create
/// GET    /{id}                          -> get_by_id
/// PUT    /{id}                          -> update
/// DELETE /{id}                          -> delete
///
/// GET    /{id}/users                    -> list_members
/// POST   /{id}/users                    -> add_member
/// DELETE /{id}/users/{user_id}          -> remove_member
/// PUT    /{id}/users/{user_id}/roles    -> set_member_roles
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(team::list).post(team::create))
        .route(
            "/{id}",
            get(team::get_by_id).put(team::update).delete(team::delete),
        )
        .route(
            "/{id}/users",
            get(team::list_members).post(team::add_member),
        )
        .route("/{id}/users/{user_id}", delete(team::remove_member))
        .route("/{id}/users/{user_id}/roles", put(team::set_member_roles))
}
