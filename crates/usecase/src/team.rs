//! Team use-case: team lifecycle and member management.
//!
//! Removing a member or deleting a team can hide a team's projects and
//! their time entries from users who could read them before. The change
//! feed records no `DELETED` rows for that loss of access, so clients
//! must run a full resync (cursor `0`) after leaving or losing a team.

use std::sync::Arc;

use async_trait::async_trait;
use timeasy_core::access::{self, TeamAction};
use timeasy_core::error::{CoreError, CoreResult};
use timeasy_core::identity::Caller;
use timeasy_core::models::{Membership, NewTeam, Team, TeamNames};
use timeasy_core::ports::{MembershipRepository, TeamRepository};
use timeasy_core::roles::{Role, RoleSet};
use timeasy_core::types::EntityId;
use timeasy_core::validation::require_id;

use crate::lookup::TeamLookup;

#[derive(Clone)]
pub struct TeamService {
    teams: Arc<dyn TeamRepository>,
    memberships: Arc<dyn MembershipRepository>,
}

impl TeamService {
    pub fn new(teams: Arc<dyn TeamRepository>, memberships: Arc<dyn MembershipRepository>) -> Self {
        Self { teams, memberships }
    }

    /// Load the team and check `action`. Denials on a team the caller cannot
    /// read look exactly like a missing team.
    async fn authorize(&self, team_id: EntityId, caller: &Caller, action: TeamAction) -> CoreResult<Team> {
        let team = self
            .teams
            .find_by_id(team_id)
            .await?
            .ok_or_else(|| CoreError::not_found("team", team_id))?;
        let membership = if caller.is_global_admin() {
            None
        } else {
            self.memberships.find(team_id, caller.user_id).await?
        };
        if access::team(caller, team_id, membership.as_ref(), action).is_allowed() {
            return Ok(team);
        }
        let can_read =
            access::team(caller, team_id, membership.as_ref(), TeamAction::Read).is_allowed();
        tracing::debug!(team_id = %team_id, user_id = %caller.user_id, ?action, "Team action denied");
        Err(access::team_refusal(team_id, action, can_read))
    }

    /// Create a team; the caller becomes its sole admin.
    pub async fn create(&self, names: TeamNames, caller: &Caller) -> CoreResult<Team> {
        names.validate()?;
        let (team, _) = self
            .teams
            .create_with_founder(&NewTeam::new(names), caller.user_id)
            .await?;
        tracing::info!(team_id = %team.id, user_id = %caller.user_id, "Team created");
        Ok(team)
    }

    pub async fn read(&self, id: EntityId, caller: &Caller) -> CoreResult<Team> {
        self.authorize(id, caller, TeamAction::Read).await
    }

    /// Teams the caller belongs to, or every team for a global admin.
    pub async fn list(&self, caller: &Caller) -> CoreResult<Vec<Team>> {
        if caller.is_global_admin() {
            self.teams.list_all().await
        } else {
            self.teams.list_for_user(caller.user_id).await
        }
    }

    pub async fn update(&self, id: EntityId, names: TeamNames, caller: &Caller) -> CoreResult<Team> {
        names.validate()?;
        self.authorize(id, caller, TeamAction::Update).await?;
        let team = self.teams.update(id, &names).await?;
        tracing::info!(team_id = %id, user_id = %caller.user_id, "Team updated");
        Ok(team)
    }

    /// Soft-delete the team. Its memberships go with it and its projects are
    /// detached.
    pub async fn delete(&self, id: EntityId, caller: &Caller) -> CoreResult<()> {
        self.authorize(id, caller, TeamAction::Delete).await?;
        self.teams.soft_delete(id).await?;
        tracing::info!(team_id = %id, user_id = %caller.user_id, "Team deleted");
        Ok(())
    }

    pub async fn list_members(&self, team_id: EntityId, caller: &Caller) -> CoreResult<Vec<Membership>> {
        self.authorize(team_id, caller, TeamAction::ListMembers).await?;
        self.memberships.list_for_team(team_id).await
    }

    /// Add a user to the team. An empty role set means `{USER}`.
    pub async fn add_member(
        &self,
        team_id: EntityId,
        user_id: EntityId,
        roles: RoleSet,
        caller: &Caller,
    ) -> CoreResult<Membership> {
        require_id("user id", user_id)?;
        let roles = if roles.is_empty() {
            RoleSet::only(Role::User)
        } else {
            roles
        };
        self.authorize(team_id, caller, TeamAction::AddMember).await?;
        let membership = self.memberships.insert(team_id, user_id, &roles).await?;
        tracing::info!(
            team_id = %team_id,
            member_id = %user_id,
            roles = %membership.roles,
            "Member added to team"
        );
        Ok(membership)
    }

    pub async fn remove_member(&self, team_id: EntityId, user_id: EntityId, caller: &Caller) -> CoreResult<()> {
        self.authorize(team_id, caller, TeamAction::RemoveMember).await?;
        self.memberships.remove(team_id, user_id).await?;
        tracing::info!(team_id = %team_id, member_id = %user_id, "Member removed from team");
        Ok(())
    }

    /// Replace a member's roles. The new set must not be empty.
    pub async fn set_member_roles(
        &self,
        team_id: EntityId,
        user_id: EntityId,
        roles: RoleSet,
        caller: &Caller,
    ) -> CoreResult<Membership> {
        if roles.is_empty() {
            return Err(CoreError::Incomplete("the roles must not be empty".to_string()));
        }
        self.authorize(team_id, caller, TeamAction::SetMemberRoles).await?;
        let membership = self.memberships.set_roles(team_id, user_id, &roles).await?;
        tracing::info!(
            team_id = %team_id,
            member_id = %user_id,
            roles = %membership.roles,
            "Member roles changed"
        );
        Ok(membership)
    }
}

#[async_trait]
impl TeamLookup for TeamService {
    async fn membership(&self, team_id: EntityId, user_id: EntityId) -> CoreResult<Option<Membership>> {
        self.memberships.find(team_id, user_id).await
    }

    async fn team_exists(&self, team_id: EntityId) -> CoreResult<bool> {
        Ok(self.teams.find_by_id(team_id).await?.is_some())
    }
}
