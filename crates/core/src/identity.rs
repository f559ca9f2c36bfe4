//! The verified caller identity supplied per request by the request adapter.

use crate::roles::{Role, RoleSet};
use crate::types::EntityId;

/// A caller whose token has already been verified by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: EntityId,
    pub roles: RoleSet,
}

impl Caller {
    pub fn new(user_id: EntityId, roles: RoleSet) -> Self {
        Self { user_id, roles }
    }

    /// A caller carrying only the `USER` role.
    pub fn user(user_id: EntityId) -> Self {
        Self::new(user_id, RoleSet::only(Role::User))
    }

    /// A caller carrying the global `ADMIN` role.
    pub fn admin(user_id: EntityId) -> Self {
        Self::new(user_id, [Role::User, Role::Admin].into_iter().collect())
    }

    /// Global admins bypass ownership and team checks.
    pub fn is_global_admin(&self) -> bool {
        self.roles.is_admin()
    }
}
