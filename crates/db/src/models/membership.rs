use sqlx::FromRow;
use timeasy_core::error::CoreError;
use timeasy_core::models::Membership;
use timeasy_core::roles::RoleSet;
use timeasy_core::types::{EntityId, Timestamp};

/// A row from the `team_memberships` table. `roles` holds the canonical
/// comma-joined role string.
#[derive(Debug, Clone, FromRow)]
pub struct MembershipRow {
    pub user_id: EntityId,
    pub team_id: EntityId,
    pub roles: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = CoreError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        let roles = RoleSet::from_column(&row.roles).map_err(|e| {
            CoreError::Internal(format!(
                "stored roles of user {} in team {} are invalid: {e}",
                row.user_id, row.team_id
            ))
        })?;
        Ok(Membership {
            user_id: row.user_id,
            team_id: row.team_id,
            roles,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use timeasy_core::roles::Role;
    use uuid::Uuid;

    use super::*;

    fn row(roles: &str) -> MembershipRow {
        MembershipRow {
            user_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            roles: roles.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_roles_column_is_parsed() {
        let membership = Membership::try_from(row("USER,ADMIN")).unwrap();
        assert!(membership.roles.contains(Role::User));
        assert!(membership.is_admin());
    }

    #[test]
    fn test_corrupt_roles_column_is_internal() {
        assert_matches!(
            Membership::try_from(row("OWNER")),
            Err(CoreError::Internal(_))
        );
    }
}
