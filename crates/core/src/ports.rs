//! Persistence ports.
//!
//! One trait per repository. Adapters stamp `created_at`, `updated_at` and
//! `deleted_at` themselves from their clock; callers never pass timestamps
//! for bookkeeping columns. Lookups return `Ok(None)` for a missing row and
//! leave the choice of error to the use-case.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::models::{
    Membership, NewProject, NewTeam, NewTimeEntry, Project, Team, TeamNames, TimeEntry,
    TimeEntryUpdate,
};
use crate::roles::RoleSet;
use crate::sync::BatchPlan;
use crate::types::{EntityId, Timestamp};

/// Whose rows a change-feed query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every row (global admins).
    All,
    /// Rows visible to this user: owned entries, and owned or team-shared
    /// projects.
    User(EntityId),
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Insert the team and the founder's `{ADMIN}` membership in one
    /// transaction.
    async fn create_with_founder(
        &self,
        team: &NewTeam,
        founder: EntityId,
    ) -> CoreResult<(Team, Membership)>;

    async fn find_by_id(&self, id: EntityId) -> CoreResult<Option<Team>>;

    /// All live teams ordered by `name1`.
    async fn list_all(&self) -> CoreResult<Vec<Team>>;

    /// Live teams the user has a membership in, ordered by `name1`.
    async fn list_for_user(&self, user_id: EntityId) -> CoreResult<Vec<Team>>;

    async fn update(&self, id: EntityId, names: &TeamNames) -> CoreResult<Team>;

    /// Soft-delete the team, remove its memberships and detach its projects.
    async fn soft_delete(&self, id: EntityId) -> CoreResult<()>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn find(&self, team_id: EntityId, user_id: EntityId) -> CoreResult<Option<Membership>>;

    async fn list_for_team(&self, team_id: EntityId) -> CoreResult<Vec<Membership>>;

    /// Fails with `AlreadyExists` if the user is already a member.
    async fn insert(
        &self,
        team_id: EntityId,
        user_id: EntityId,
        roles: &RoleSet,
    ) -> CoreResult<Membership>;

    /// Fails with `NotFound` for a non-member and `Forbidden` if the change
    /// would leave the team without an admin.
    async fn set_roles(
        &self,
        team_id: EntityId,
        user_id: EntityId,
        roles: &RoleSet,
    ) -> CoreResult<Membership>;

    /// Same failure modes as [`MembershipRepository::set_roles`].
    async fn remove(&self, team_id: EntityId, user_id: EntityId) -> CoreResult<()>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn insert(&self, project: &NewProject) -> CoreResult<Project>;

    /// Live projects only.
    async fn find_by_id(&self, id: EntityId) -> CoreResult<Option<Project>>;

    async fn find_by_id_including_deleted(&self, id: EntityId) -> CoreResult<Option<Project>>;

    /// All live projects ordered by name.
    async fn list_all(&self) -> CoreResult<Vec<Project>>;

    /// Live projects the user owns or shares through a team, ordered by name.
    async fn list_visible_to(&self, user_id: EntityId) -> CoreResult<Vec<Project>>;

    async fn update_name(&self, id: EntityId, name: &str) -> CoreResult<Project>;

    async fn set_team(&self, id: EntityId, team_id: Option<EntityId>) -> CoreResult<Project>;

    /// Soft-delete the project and its live time entries at one instant.
    async fn soft_delete(&self, id: EntityId) -> CoreResult<()>;
}

#[async_trait]
pub trait TimeEntryRepository: Send + Sync {
    async fn insert(&self, entry: &NewTimeEntry) -> CoreResult<TimeEntry>;

    /// All-or-nothing.
    async fn insert_many(&self, entries: &[NewTimeEntry]) -> CoreResult<Vec<TimeEntry>>;

    /// Live entries only.
    async fn find_by_id(&self, id: EntityId) -> CoreResult<Option<TimeEntry>>;

    async fn find_by_id_including_deleted(&self, id: EntityId) -> CoreResult<Option<TimeEntry>>;

    /// Live entries ordered by `start_time desc, end_time desc`.
    async fn list_for_user(&self, user_id: EntityId) -> CoreResult<Vec<TimeEntry>>;

    async fn list_for_user_and_project(
        &self,
        user_id: EntityId,
        project_id: EntityId,
    ) -> CoreResult<Vec<TimeEntry>>;

    async fn update(&self, update: &TimeEntryUpdate) -> CoreResult<TimeEntry>;

    /// All-or-nothing.
    async fn update_many(&self, updates: &[TimeEntryUpdate]) -> CoreResult<Vec<TimeEntry>>;

    async fn soft_delete(&self, id: EntityId) -> CoreResult<()>;
}

#[async_trait]
pub trait SyncRepository: Send + Sync {
    /// Projects in scope (deleted ones included) last touched after `since`.
    async fn changed_projects(&self, scope: Scope, since: Timestamp) -> CoreResult<Vec<Project>>;

    /// Time entries in scope (deleted ones included) last touched after
    /// `since`.
    async fn changed_time_entries(
        &self,
        scope: Scope,
        since: Timestamp,
    ) -> CoreResult<Vec<TimeEntry>>;

    /// Apply the plan in one transaction. Any row failure rolls back the
    /// whole batch and is reported as `Conflict`.
    async fn apply_batch(&self, plan: &BatchPlan) -> CoreResult<()>;
}
