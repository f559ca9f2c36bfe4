//! Input validation shared by the use-cases and the sync engine.
//!
//! Every failure is [`CoreError::Incomplete`].

use crate::error::{CoreError, CoreResult};
use crate::types::EntityId;

/// Reject names that are empty after trimming.
pub fn require_name(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::Incomplete(format!("the {field} must not be empty")));
    }
    Ok(())
}

/// Reject the nil UUID.
pub fn require_id(field: &str, id: EntityId) -> CoreResult<()> {
    if id.is_nil() {
        return Err(CoreError::Incomplete(format!("the {field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn names_must_have_content() {
        assert!(require_name("project name", "p1").is_ok());
        assert!(require_name("project name", "").is_err());
        assert!(require_name("project name", " \t").is_err());
    }

    #[test]
    fn nil_id_message_names_field() {
        let err = require_id("project id", Uuid::nil()).unwrap_err();
        assert_eq!(err.to_string(), "the project id must not be empty");
        assert!(require_id("project id", Uuid::new_v4()).is_ok());
    }
}
