//! Authorisation kernel.
//!
//! Pure decision functions: given the caller, the already-loaded target and
//! (where relevant) the caller's membership in the target's team, return
//! [`Decision::Allow`] or [`Decision::Deny`]. The kernel never fails; turning
//! a denial into an error is [`refusal`]'s job.
//!
//! Rules, first match wins:
//! 1. A global admin is allowed everything.
//! 2. The owner of a project or time entry is allowed everything on it.
//! 3. For a project shared with a team, any member may read it and team
//!    admins may update, delete or re-assign it. Clearing the team is
//!    reserved for the owner.
//! 4. Anyone may create a team; members may read it and list its members;
//!    every other team verb requires a team admin.
//! 5. Time entries are private to their owner. Team membership grants
//!    nothing on other users' entries.

use crate::error::CoreError;
use crate::identity::Caller;
use crate::models::{Membership, Project, TimeEntry};
use crate::types::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    Read,
    Update,
    Delete,
    /// Move the project into a (different) team.
    AssignToTeam,
    /// Detach the project from its team.
    ClearTeam,
}

impl ProjectAction {
    fn verb(self) -> &'static str {
        match self {
            ProjectAction::Read => "read",
            ProjectAction::Update => "update",
            ProjectAction::Delete => "delete",
            ProjectAction::AssignToTeam => "assign",
            ProjectAction::ClearTeam => "remove the team of",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamAction {
    Create,
    Read,
    ListMembers,
    Update,
    Delete,
    AddMember,
    RemoveMember,
    SetMemberRoles,
    /// Accept a project into the team.
    AttachProject,
}

impl TeamAction {
    fn verb(self) -> &'static str {
        match self {
            TeamAction::Create => "create",
            TeamAction::Read | TeamAction::ListMembers => "read",
            TeamAction::Update => "update",
            TeamAction::Delete => "delete",
            TeamAction::AddMember => "add users to",
            TeamAction::RemoveMember => "remove users from",
            TeamAction::SetMemberRoles => "change member roles of",
            TeamAction::AttachProject => "assign projects to",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEntryAction {
    Read,
    Update,
    Delete,
}

impl TimeEntryAction {
    fn verb(self) -> &'static str {
        match self {
            TimeEntryAction::Read => "read",
            TimeEntryAction::Update => "update",
            TimeEntryAction::Delete => "delete",
        }
    }
}

/// Keep only a membership that really is the caller's in `team_id`.
fn own_membership<'a>(
    caller: &Caller,
    team_id: EntityId,
    membership: Option<&'a Membership>,
) -> Option<&'a Membership> {
    membership.filter(|m| m.user_id == caller.user_id && m.team_id == team_id)
}

/// Decide a project verb. `membership` is the caller's membership in the
/// project's current team, if the project has one and the caller belongs to it.
pub fn project(
    caller: &Caller,
    project: &Project,
    membership: Option<&Membership>,
    action: ProjectAction,
) -> Decision {
    if caller.is_global_admin() || project.is_owned_by(caller.user_id) {
        return Decision::Allow;
    }
    if action == ProjectAction::ClearTeam {
        return Decision::Deny;
    }
    let Some(team_id) = project.team_id else {
        return Decision::Deny;
    };
    let Some(membership) = own_membership(caller, team_id, membership) else {
        return Decision::Deny;
    };
    match action {
        ProjectAction::Read => Decision::Allow,
        ProjectAction::Update | ProjectAction::Delete | ProjectAction::AssignToTeam => {
            Decision::from_bool(membership.is_admin())
        }
        ProjectAction::ClearTeam => Decision::Deny,
    }
}

/// Decide a team verb. `membership` is the caller's membership in `team_id`.
pub fn team(
    caller: &Caller,
    team_id: EntityId,
    membership: Option<&Membership>,
    action: TeamAction,
) -> Decision {
    if caller.is_global_admin() || action == TeamAction::Create {
        return Decision::Allow;
    }
    let Some(membership) = own_membership(caller, team_id, membership) else {
        return Decision::Deny;
    };
    match action {
        TeamAction::Read | TeamAction::ListMembers => Decision::Allow,
        _ => Decision::from_bool(membership.is_admin()),
    }
}

/// Decide a time-entry verb.
pub fn time_entry(caller: &Caller, entry: &TimeEntry, _action: TimeEntryAction) -> Decision {
    Decision::from_bool(caller.is_global_admin() || entry.is_owned_by(caller.user_id))
}

/// Turn a denial into the error the caller is allowed to see.
///
/// A caller who may read the target learns that the verb is forbidden; one
/// who may not even read it gets the exact error a missing entity produces,
/// so existence does not leak.
pub fn refusal(entity: &str, id: EntityId, verb: &str, caller_can_read: bool) -> CoreError {
    if caller_can_read {
        CoreError::Forbidden(format!("you are not allowed to {verb} this {entity}"))
    } else {
        CoreError::not_found(entity, id)
    }
}

pub fn project_refusal(project: &Project, action: ProjectAction, caller_can_read: bool) -> CoreError {
    refusal("project", project.id, action.verb(), caller_can_read)
}

pub fn team_refusal(team_id: EntityId, action: TeamAction, caller_can_read: bool) -> CoreError {
    refusal("team", team_id, action.verb(), caller_can_read)
}

/// Time entries are never readable by a denied caller, so this is always
/// the not-found outcome.
pub fn time_entry_refusal(entry: &TimeEntry, action: TimeEntryAction) -> CoreError {
    refusal("time entry", entry.id, action.verb(), false)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::roles::{Role, RoleSet};

    fn project_of(owner: EntityId, team_id: Option<EntityId>) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            name: "p1".into(),
            owner_user_id: owner,
            team_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn entry_of(owner: EntityId) -> TimeEntry {
        let now = Utc::now();
        TimeEntry {
            id: Uuid::new_v4(),
            owner_user_id: owner,
            project_id: Uuid::new_v4(),
            start_time: now,
            end_time: None,
            description: String::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn membership(user_id: EntityId, team_id: EntityId, role: Role) -> Membership {
        let now = Utc::now();
        let mut roles = RoleSet::only(Role::User);
        roles.insert(role);
        Membership {
            user_id,
            team_id,
            roles,
            created_at: now,
            updated_at: now,
        }
    }

    const MUTATIONS: [ProjectAction; 3] = [
        ProjectAction::Update,
        ProjectAction::Delete,
        ProjectAction::AssignToTeam,
    ];

    #[test]
    fn owner_may_do_everything_on_own_project() {
        let alice = Caller::user(Uuid::new_v4());
        let p = project_of(alice.user_id, None);
        for action in [ProjectAction::Read, ProjectAction::ClearTeam]
            .into_iter()
            .chain(MUTATIONS)
        {
            assert!(project(&alice, &p, None, action).is_allowed(), "{action:?}");
        }
    }

    #[test]
    fn stranger_is_denied_private_project() {
        let bob = Caller::user(Uuid::new_v4());
        let p = project_of(Uuid::new_v4(), None);
        assert_eq!(project(&bob, &p, None, ProjectAction::Read), Decision::Deny);
        for action in MUTATIONS {
            assert_eq!(project(&bob, &p, None, action), Decision::Deny);
        }
    }

    #[test]
    fn global_admin_overrides_ownership() {
        let carol = Caller::admin(Uuid::new_v4());
        let p = project_of(Uuid::new_v4(), Some(Uuid::new_v4()));
        assert!(project(&carol, &p, None, ProjectAction::Read).is_allowed());
        assert!(project(&carol, &p, None, ProjectAction::ClearTeam).is_allowed());
        let e = entry_of(Uuid::new_v4());
        assert!(time_entry(&carol, &e, TimeEntryAction::Delete).is_allowed());
    }

    #[test]
    fn team_member_may_read_but_not_mutate() {
        let team_id = Uuid::new_v4();
        let bob = Caller::user(Uuid::new_v4());
        let m = membership(bob.user_id, team_id, Role::User);
        let p = project_of(Uuid::new_v4(), Some(team_id));
        assert!(project(&bob, &p, Some(&m), ProjectAction::Read).is_allowed());
        for action in MUTATIONS {
            assert_eq!(project(&bob, &p, Some(&m), action), Decision::Deny);
        }
        assert_eq!(
            project(&bob, &p, Some(&m), ProjectAction::ClearTeam),
            Decision::Deny
        );
    }

    #[test]
    fn team_admin_may_mutate_but_not_clear_team() {
        let team_id = Uuid::new_v4();
        let bob = Caller::user(Uuid::new_v4());
        let m = membership(bob.user_id, team_id, Role::Admin);
        let p = project_of(Uuid::new_v4(), Some(team_id));
        for action in MUTATIONS {
            assert!(project(&bob, &p, Some(&m), action).is_allowed());
        }
        assert_eq!(
            project(&bob, &p, Some(&m), ProjectAction::ClearTeam),
            Decision::Deny
        );
    }

    #[test]
    fn membership_of_another_team_grants_nothing() {
        let bob = Caller::user(Uuid::new_v4());
        let m = membership(bob.user_id, Uuid::new_v4(), Role::Admin);
        let p = project_of(Uuid::new_v4(), Some(Uuid::new_v4()));
        assert_eq!(project(&bob, &p, Some(&m), ProjectAction::Read), Decision::Deny);
    }

    #[test]
    fn someone_elses_membership_grants_nothing() {
        let team_id = Uuid::new_v4();
        let bob = Caller::user(Uuid::new_v4());
        let alices = membership(Uuid::new_v4(), team_id, Role::Admin);
        let p = project_of(Uuid::new_v4(), Some(team_id));
        assert_eq!(
            project(&bob, &p, Some(&alices), ProjectAction::Read),
            Decision::Deny
        );
    }

    #[test]
    fn team_verbs_follow_membership_roles() {
        let team_id = Uuid::new_v4();
        let bob = Caller::user(Uuid::new_v4());
        let member = membership(bob.user_id, team_id, Role::User);
        let admin = membership(bob.user_id, team_id, Role::Admin);

        assert!(team(&bob, team_id, None, TeamAction::Create).is_allowed());
        assert_eq!(team(&bob, team_id, None, TeamAction::Read), Decision::Deny);
        assert!(team(&bob, team_id, Some(&member), TeamAction::Read).is_allowed());
        assert!(team(&bob, team_id, Some(&member), TeamAction::ListMembers).is_allowed());

        for action in [
            TeamAction::Update,
            TeamAction::Delete,
            TeamAction::AddMember,
            TeamAction::RemoveMember,
            TeamAction::SetMemberRoles,
            TeamAction::AttachProject,
        ] {
            assert_eq!(team(&bob, team_id, Some(&member), action), Decision::Deny);
            assert!(team(&bob, team_id, Some(&admin), action).is_allowed());
        }
    }

    #[test]
    fn time_entries_are_owner_only() {
        let alice = Caller::user(Uuid::new_v4());
        let bob = Caller::user(Uuid::new_v4());
        let e = entry_of(alice.user_id);
        for action in [
            TimeEntryAction::Read,
            TimeEntryAction::Update,
            TimeEntryAction::Delete,
        ] {
            assert!(time_entry(&alice, &e, action).is_allowed());
            assert_eq!(time_entry(&bob, &e, action), Decision::Deny);
        }
    }

    #[test]
    fn refusal_hides_unreadable_targets() {
        let id = Uuid::new_v4();
        assert_matches!(refusal("project", id, "update", false), CoreError::NotFound(_));
        assert_eq!(
            refusal("project", id, "update", false),
            CoreError::not_found("project", id)
        );
        assert_matches!(refusal("project", id, "update", true), CoreError::Forbidden(_));
    }
}
