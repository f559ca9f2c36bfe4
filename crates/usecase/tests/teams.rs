//! Team use-case: founder membership, member management and the
//! last-admin rule.

mod common;

use assert_matches::assert_matches;
use common::{alice, bob, carol_admin, dave, harness};
use timeasy_core::error::CoreError;
use timeasy_core::models::membership::LAST_ADMIN_MESSAGE;
use timeasy_core::models::TeamNames;
use timeasy_core::roles::{Role, RoleSet};
use timeasy_usecase::TeamLookup;
use uuid::Uuid;

#[tokio::test]
async fn test_founder_is_sole_admin() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;

    let members = h.services.teams.list_members(t1.id, &alice()).await.unwrap();
    assert_eq!(members.len(), 1, "exactly one membership after create");
    assert_eq!(members[0].user_id, alice().user_id);
    assert_eq!(members[0].team_id, t1.id);
    assert_eq!(members[0].roles, RoleSet::only(Role::Admin));
}

#[tokio::test]
async fn test_create_requires_first_name() {
    let h = harness();
    let mut names = TeamNames::new("");
    names.name2 = "second".into();
    assert_matches!(
        h.services.teams.create(names, &alice()).await,
        Err(CoreError::Incomplete(_))
    );
}

#[tokio::test]
async fn test_member_management_scenario() {
    let h = harness();
    let teams = &h.services.teams;
    let t1 = h.team("t1", &alice()).await;

    teams
        .add_member(t1.id, bob().user_id, RoleSet::only(Role::User), &alice())
        .await
        .unwrap();

    let bobs_teams = teams.list(&bob()).await.unwrap();
    assert_eq!(bobs_teams.iter().map(|t| t.id).collect::<Vec<_>>(), vec![t1.id]);

    assert_matches!(
        teams
            .add_member(t1.id, dave().user_id, RoleSet::only(Role::User), &bob())
            .await,
        Err(CoreError::Forbidden(_))
    );
}

#[tokio::test]
async fn test_add_member_defaults_to_user_role() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    let membership = h
        .services
        .teams
        .add_member(t1.id, bob().user_id, RoleSet::new(), &alice())
        .await
        .unwrap();
    assert_eq!(membership.roles, RoleSet::only(Role::User));
}

#[tokio::test]
async fn test_re_adding_member_already_exists() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    let teams = &h.services.teams;
    teams
        .add_member(t1.id, bob().user_id, RoleSet::new(), &alice())
        .await
        .unwrap();
    assert_matches!(
        teams.add_member(t1.id, bob().user_id, RoleSet::new(), &alice()).await,
        Err(CoreError::AlreadyExists(_))
    );
}

#[tokio::test]
async fn test_remove_unknown_member_is_not_found() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    assert_matches!(
        h.services.teams.remove_member(t1.id, bob().user_id, &alice()).await,
        Err(CoreError::NotFound(_))
    );
}

#[tokio::test]
async fn test_removing_last_admin_is_forbidden() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    let teams = &h.services.teams;

    assert_matches!(
        teams.remove_member(t1.id, alice().user_id, &alice()).await,
        Err(CoreError::Forbidden(msg)) if msg == LAST_ADMIN_MESSAGE
    );
    assert_matches!(
        teams
            .set_member_roles(t1.id, alice().user_id, RoleSet::only(Role::User), &alice())
            .await,
        Err(CoreError::Forbidden(msg)) if msg == LAST_ADMIN_MESSAGE
    );

    // With a second admin the first may leave.
    teams
        .add_member(t1.id, bob().user_id, RoleSet::only(Role::Admin), &alice())
        .await
        .unwrap();
    teams
        .remove_member(t1.id, alice().user_id, &alice())
        .await
        .unwrap();
    let members = teams.list_members(t1.id, &bob()).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, bob().user_id);
}

#[tokio::test]
async fn test_empty_role_set_is_incomplete() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    assert_matches!(
        h.services
            .teams
            .set_member_roles(t1.id, alice().user_id, RoleSet::new(), &alice())
            .await,
        Err(CoreError::Incomplete(_))
    );
}

#[tokio::test]
async fn test_outsiders_cannot_see_team() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    let teams = &h.services.teams;

    assert_eq!(
        teams.read(t1.id, &bob()).await.unwrap_err(),
        CoreError::not_found("team", t1.id)
    );
    assert_matches!(
        teams.list_members(t1.id, &bob()).await,
        Err(CoreError::NotFound(_))
    );
    assert_matches!(
        teams.update(t1.id, TeamNames::new("mine"), &bob()).await,
        Err(CoreError::NotFound(_))
    );
    assert!(teams.list(&bob()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_members_read_but_only_admins_update() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    let teams = &h.services.teams;
    teams
        .add_member(t1.id, bob().user_id, RoleSet::new(), &alice())
        .await
        .unwrap();

    assert_eq!(teams.read(t1.id, &bob()).await.unwrap().id, t1.id);
    assert_eq!(teams.list_members(t1.id, &bob()).await.unwrap().len(), 2);
    assert_matches!(
        teams.update(t1.id, TeamNames::new("renamed"), &bob()).await,
        Err(CoreError::Forbidden(_))
    );
    assert_matches!(teams.delete(t1.id, &bob()).await, Err(CoreError::Forbidden(_)));

    let mut names = TeamNames::new("renamed");
    names.name3 = "third".into();
    let updated = teams.update(t1.id, names, &alice()).await.unwrap();
    assert_eq!(updated.name1, "renamed");
    assert_eq!(updated.name3, "third");
}

#[tokio::test]
async fn test_team_delete_detaches_projects_and_memberships() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    let teams = &h.services.teams;
    teams
        .add_member(t1.id, bob().user_id, RoleSet::new(), &alice())
        .await
        .unwrap();
    let p = h.project("p1", &alice()).await;
    h.services
        .projects
        .assign_to_team(p.id, t1.id, &alice())
        .await
        .unwrap();

    teams.delete(t1.id, &alice()).await.unwrap();

    assert_matches!(teams.read(t1.id, &alice()).await, Err(CoreError::NotFound(_)));
    assert!(!teams.is_member_of_team(bob().user_id, t1.id).await.unwrap());
    assert_eq!(
        h.services.projects.read(p.id, &alice()).await.unwrap().team_id,
        None
    );
    assert_matches!(
        h.services.projects.read(p.id, &bob()).await,
        Err(CoreError::NotFound(_))
    );
}

#[tokio::test]
async fn test_global_admin_manages_foreign_teams() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    let teams = &h.services.teams;
    let carol = carol_admin();

    assert_eq!(teams.list(&carol).await.unwrap().len(), 1);
    teams
        .add_member(t1.id, bob().user_id, RoleSet::new(), &carol)
        .await
        .unwrap();
    teams
        .set_member_roles(t1.id, bob().user_id, RoleSet::only(Role::Admin), &carol)
        .await
        .unwrap();
    assert!(teams.is_admin_in_team(bob().user_id, t1.id).await.unwrap());
    teams.delete(t1.id, &carol).await.unwrap();

    assert_matches!(
        teams.read(Uuid::new_v4(), &carol).await,
        Err(CoreError::NotFound(_))
    );
}
