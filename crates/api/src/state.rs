use std::sync::Arc;

use timeasy_usecase::Services;

use crate::auth::TokenVerifier;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: services and verifier sit behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub verifier: Arc<dyn TokenVerifier>,
    pub config: Arc<ServerConfig>,
    /// Present when the PostgreSQL adapter backs the services.
    pub pool: Option<timeasy_db::DbPool>,
}
