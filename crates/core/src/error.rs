/// Error kinds produced by the core and its persistence ports.
///
/// Each variant is a distinct kind so adapters can map them without
/// inspecting messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    /// Input violates an invariant (empty name, nil id, unknown role).
    #[error("{0}")]
    Incomplete(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthenticated(String),

    /// A referenced entity (e.g. the project of a time entry) does not exist.
    #[error("{0}")]
    DependencyMissing(String),

    /// A transaction was aborted; nothing was persisted.
    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias used by ports and services.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// The canonical "not found" error for an entity kind and id.
    ///
    /// Used verbatim for denied lookups too, so a caller cannot tell a hidden
    /// entity from a missing one.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} with id {id} not found"))
    }

    /// Short machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::Incomplete(_) => "INCOMPLETE",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::DependencyMissing(_) => "DEPENDENCY_MISSING",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
