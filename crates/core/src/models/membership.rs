//! Team membership: the link carrying a user's roles inside one team.

use crate::roles::RoleSet;
use crate::types::{EntityId, Timestamp};

/// At most one membership exists per `(user_id, team_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub user_id: EntityId,
    pub team_id: EntityId,
    pub roles: RoleSet,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Membership {
    pub fn is_admin(&self) -> bool {
        self.roles.is_admin()
    }
}

/// Message used whenever a change would leave a team without any admin.
pub const LAST_ADMIN_MESSAGE: &str = "a team must retain at least one admin";

/// Returns `true` when replacing the roles of `user_id` with `new_roles`
/// (`None` meaning the membership is removed) would leave a team that
/// currently has an admin with none.
pub fn leaves_team_without_admin(
    members: &[Membership],
    user_id: EntityId,
    new_roles: Option<&RoleSet>,
) -> bool {
    let admins_before = members.iter().filter(|m| m.is_admin()).count();
    if admins_before == 0 {
        return false;
    }
    let admins_after = members
        .iter()
        .filter(|m| {
            if m.user_id == user_id {
                new_roles.is_some_and(RoleSet::is_admin)
            } else {
                m.is_admin()
            }
        })
        .count();
    admins_after == 0
}
