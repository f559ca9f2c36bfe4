use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sync;
use crate::state::AppState;

/// Routes mounted at `/sync`. `{since}` is UNIX seconds.
///
/// ```text
/// GET    /changed/{since}        -> changed
/// GET    /projects/{since}       -> changed_projects
/// GET    /timeentries/{since}    -> changed_time_entries
/// POST   /changed                -> apply
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/changed", post(sync::apply))
        .route("/changed/{since}", get(sync::changed))
        .route("/projects/{since}", get(sync::changed_projects))
        .route("/timeentries/{since}", get(sync::changed_time_entries))
}
