//! Team capabilities other use-cases depend on.
//!
//! Project and time-entry rules need to know a caller's membership in a
//! project's team. They get it through [`TeamLookup`] instead of the team
//! service's concrete type.

use async_trait::async_trait;
use timeasy_core::access::{self, Decision, ProjectAction, TeamAction};
use timeasy_core::error::{CoreError, CoreResult};
use timeasy_core::identity::Caller;
use timeasy_core::models::{Membership, Project};
use timeasy_core::types::EntityId;

#[async_trait]
pub trait TeamLookup: Send + Sync {
    /// The user's membership in a team, if any.
    async fn membership(&self, team_id: EntityId, user_id: EntityId)
        -> CoreResult<Option<Membership>>;

    /// Whether a live team with this id exists.
    async fn team_exists(&self, team_id: EntityId) -> CoreResult<bool>;

    async fn is_admin_in_team(&self, user_id: EntityId, team_id: EntityId) -> CoreResult<bool> {
        Ok(self
            .membership(team_id, user_id)
            .await?
            .is_some_and(|m| m.is_admin()))
    }

    async fn is_member_of_team(&self, user_id: EntityId, team_id: EntityId) -> CoreResult<bool> {
        Ok(self.membership(team_id, user_id).await?.is_some())
    }
}

/// The caller's membership in the team of `project`. Global admins and
/// projects without a team skip the lookup.
pub(crate) async fn project_membership(
    teams: &dyn TeamLookup,
    caller: &Caller,
    project: &Project,
) -> CoreResult<Option<Membership>> {
    match project.team_id {
        Some(team_id) if !caller.is_global_admin() => {
            teams.membership(team_id, caller.user_id).await
        }
        _ => Ok(None),
    }
}

/// Decide `action` and, for a denial, whether the caller may at least read.
pub(crate) async fn decide_project(
    teams: &dyn TeamLookup,
    caller: &Caller,
    project: &Project,
    action: ProjectAction,
) -> CoreResult<(Decision, bool)> {
    let membership = project_membership(teams, caller, project).await?;
    let decision = access::project(caller, project, membership.as_ref(), action);
    let can_read = decision.is_allowed()
        || access::project(caller, project, membership.as_ref(), ProjectAction::Read).is_allowed();
    Ok((decision, can_read))
}

/// `Ok(())` when allowed, otherwise the refusal the caller may see.
pub(crate) async fn authorize_project(
    teams: &dyn TeamLookup,
    caller: &Caller,
    project: &Project,
    action: ProjectAction,
) -> CoreResult<()> {
    let (decision, can_read) = decide_project(teams, caller, project, action).await?;
    if decision.is_allowed() {
        return Ok(());
    }
    tracing::debug!(
        project_id = %project.id,
        user_id = %caller.user_id,
        ?action,
        "Project action denied"
    );
    Err(access::project_refusal(project, action, can_read))
}

/// Check that the caller may accept a project into `team_id`: the team must
/// exist and the caller must be one of its admins (or a global admin).
pub(crate) async fn authorize_attach(
    teams: &dyn TeamLookup,
    caller: &Caller,
    team_id: EntityId,
) -> CoreResult<()> {
    if !teams.team_exists(team_id).await? {
        return Err(CoreError::not_found("team", team_id));
    }
    let membership = if caller.is_global_admin() {
        None
    } else {
        teams.membership(team_id, caller.user_id).await?
    };
    if access::team(caller, team_id, membership.as_ref(), TeamAction::AttachProject).is_allowed() {
        return Ok(());
    }
    let can_read = membership.is_some();
    tracing::debug!(team_id = %team_id, user_id = %caller.user_id, "Project attach denied");
    Err(access::team_refusal(team_id, TeamAction::AttachProject, can_read))
}
