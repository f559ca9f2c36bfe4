//! Conversion of sqlx failures into core error kinds.

use timeasy_core::error::CoreError;

/// Map a sqlx error outside a batch transaction.
///
/// - Unique violations (`23505`) become `AlreadyExists`.
/// - Foreign-key violations (`23503`) become `DependencyMissing`.
/// - Serialization failures and deadlocks (`40001`, `40P01`) become `Conflict`.
/// - Everything else is `Internal` and logged.
pub fn map_sqlx_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return CoreError::AlreadyExists(format!(
                    "duplicate value violates unique constraint: {constraint}"
                ));
            }
            Some("23503") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return CoreError::DependencyMissing(format!(
                    "referenced row does not exist: {constraint}"
                ));
            }
            Some("40001") | Some("40P01") => {
                return CoreError::Conflict(
                    "the transaction was aborted by a concurrent update".to_string(),
                );
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal("database error".to_string())
}

/// Map any failure inside a batch transaction to `Conflict`, keeping the
/// message of errors the core raised itself.
pub fn into_conflict(err: CoreError) -> CoreError {
    match err {
        CoreError::Conflict(_) => err,
        other => CoreError::Conflict(format!("sync batch rolled back: {other}")),
    }
}
