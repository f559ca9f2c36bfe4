use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use timeasy_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `timeasy_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed body, path or query.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Incomplete(errors.to_string()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => {
                let status = match core {
                    CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    CoreError::Incomplete(_) | CoreError::DependencyMissing(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                    CoreError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
                    CoreError::AlreadyExists(_) => StatusCode::CONFLICT,
                    CoreError::Conflict(_) | CoreError::Internal(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %core, code = core.code(), "Request failed");
                    "An internal error occurred".to_string()
                } else {
                    core.to_string()
                };
                (status, core.code(), message)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_per_kind() {
        let cases = [
            (CoreError::not_found("project", 1), StatusCode::NOT_FOUND),
            (CoreError::Incomplete("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::DependencyMissing("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (CoreError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (CoreError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (CoreError::Conflict("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (CoreError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let (status, _) = render(err.into()).await;
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn test_body_carries_message_and_code() {
        let (_, body) = render(CoreError::not_found("project", "p1").into()).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["error"], "project with id p1 not found");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (_, body) = render(CoreError::Conflict("sync batch rolled back: 40001".into()).into()).await;
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_bad_request() {
        let (status, body) = render(AppError::BadRequest("expected a uuid".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }
}
