//! Project use-case: ownership, team delegation, admin override and the
//! existence non-leak rule.

mod common;

use assert_matches::assert_matches;
use common::{alice, bob, carol_admin, dave, harness};
use timeasy_core::error::CoreError;
use timeasy_core::roles::{Role, RoleSet};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_owner_can_read_update_delete_private_project() {
    let h = harness();
    let p = h.project("p1", &alice()).await;

    assert_eq!(h.services.projects.read(p.id, &alice()).await.unwrap(), p);
    let renamed = h.services.projects.update(p.id, "p1x", &alice()).await.unwrap();
    assert_eq!(renamed.name, "p1x");
    h.services.projects.delete(p.id, &alice()).await.unwrap();
    assert_matches!(
        h.services.projects.read(p.id, &alice()).await,
        Err(CoreError::NotFound(_))
    );
}

#[tokio::test]
async fn test_stranger_sees_not_found_for_every_verb() {
    let h = harness();
    let p = h.project("p1", &alice()).await;
    let projects = &h.services.projects;

    assert_matches!(projects.read(p.id, &bob()).await, Err(CoreError::NotFound(_)));
    assert_matches!(
        projects.update(p.id, "stolen", &bob()).await,
        Err(CoreError::NotFound(_))
    );
    assert_matches!(projects.delete(p.id, &bob()).await, Err(CoreError::NotFound(_)));
    assert_matches!(projects.clear_team(p.id, &bob()).await, Err(CoreError::NotFound(_)));
    assert!(projects.list(&bob()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_rejects_blank_names() {
    let h = harness();
    assert_matches!(
        h.services.projects.create("  ", &alice()).await,
        Err(CoreError::Incomplete(_))
    );
    let p = h.project("p1", &alice()).await;
    assert_matches!(
        h.services.projects.update(p.id, "", &alice()).await,
        Err(CoreError::Incomplete(_))
    );
}

#[tokio::test]
async fn test_new_project_is_owned_by_caller_without_team() {
    let h = harness();
    let p = h.project("p1", &alice()).await;
    assert_eq!(p.owner_user_id, alice().user_id);
    assert_eq!(p.team_id, None);
    assert_eq!(p.created_at, p.updated_at);
}

// ---------------------------------------------------------------------------
// Existence non-leak
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_hidden_and_missing_projects_are_indistinguishable() {
    let h = harness();
    let hidden = h.project("p1", &alice()).await;
    let missing = Uuid::new_v4();
    let projects = &h.services.projects;

    let hidden_read = projects.read(hidden.id, &bob()).await.unwrap_err();
    let missing_read = projects.read(missing, &bob()).await.unwrap_err();
    assert_eq!(hidden_read, CoreError::not_found("project", hidden.id));
    assert_eq!(missing_read, CoreError::not_found("project", missing));

    let hidden_update = projects.update(hidden.id, "x", &bob()).await.unwrap_err();
    let missing_update = projects.update(missing, "x", &bob()).await.unwrap_err();
    assert_eq!(hidden_update.code(), missing_update.code());

    let hidden_delete = projects.delete(hidden.id, &bob()).await.unwrap_err();
    let missing_delete = projects.delete(missing, &bob()).await.unwrap_err();
    assert_eq!(hidden_delete, CoreError::not_found("project", hidden.id));
    assert_eq!(missing_delete, CoreError::not_found("project", missing));
}

// ---------------------------------------------------------------------------
// Team delegation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_team_members_read_but_only_admins_mutate() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    h.services
        .teams
        .add_member(t1.id, bob().user_id, RoleSet::new(), &alice())
        .await
        .unwrap();
    let p = h.project("p1", &alice()).await;
    h.services
        .projects
        .assign_to_team(p.id, t1.id, &alice())
        .await
        .unwrap();
    let projects = &h.services.projects;

    assert_eq!(projects.read(p.id, &bob()).await.unwrap().team_id, Some(t1.id));
    assert_eq!(projects.list(&bob()).await.unwrap().len(), 1);
    assert_matches!(
        projects.update(p.id, "p1x", &bob()).await,
        Err(CoreError::Forbidden(_))
    );
    assert_matches!(projects.delete(p.id, &bob()).await, Err(CoreError::Forbidden(_)));
    assert_matches!(projects.clear_team(p.id, &bob()).await, Err(CoreError::Forbidden(_)));

    // Dave is not in the team: the shared project stays invisible to him.
    assert_matches!(projects.read(p.id, &dave()).await, Err(CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_promoted_member_can_update() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    h.services
        .teams
        .add_member(t1.id, bob().user_id, RoleSet::only(Role::User), &alice())
        .await
        .unwrap();
    let p = h.project("p1", &alice()).await;
    h.services
        .projects
        .assign_to_team(p.id, t1.id, &alice())
        .await
        .unwrap();

    assert_eq!(h.services.projects.read(p.id, &bob()).await.unwrap().id, p.id);
    assert_matches!(
        h.services.projects.update(p.id, "p1x", &bob()).await,
        Err(CoreError::Forbidden(_))
    );

    h.services
        .teams
        .set_member_roles(
            t1.id,
            bob().user_id,
            [Role::User, Role::Admin].into_iter().collect(),
            &alice(),
        )
        .await
        .unwrap();

    let updated = h.services.projects.update(p.id, "p1x", &bob()).await.unwrap();
    assert_eq!(updated.name, "p1x");
}

#[tokio::test]
async fn test_assign_requires_admin_in_target_team() {
    let h = harness();
    let t_bob = h.team("bobs team", &bob()).await;
    let p = h.project("p1", &alice()).await;

    // Alice owns the project but is not in Bob's team.
    assert_matches!(
        h.services.projects.assign_to_team(p.id, t_bob.id, &alice()).await,
        Err(CoreError::NotFound(_))
    );

    h.services
        .teams
        .add_member(t_bob.id, alice().user_id, RoleSet::only(Role::User), &bob())
        .await
        .unwrap();
    assert_matches!(
        h.services.projects.assign_to_team(p.id, t_bob.id, &alice()).await,
        Err(CoreError::Forbidden(_))
    );

    h.services
        .teams
        .set_member_roles(t_bob.id, alice().user_id, RoleSet::only(Role::Admin), &bob())
        .await
        .unwrap();
    let assigned = h
        .services
        .projects
        .assign_to_team(p.id, t_bob.id, &alice())
        .await
        .unwrap();
    assert_eq!(assigned.team_id, Some(t_bob.id));
}

#[tokio::test]
async fn test_assign_to_unknown_team_is_not_found() {
    let h = harness();
    let p = h.project("p1", &alice()).await;
    assert_matches!(
        h.services.projects.assign_to_team(p.id, Uuid::new_v4(), &alice()).await,
        Err(CoreError::NotFound(msg)) if msg.starts_with("team")
    );
}

#[tokio::test]
async fn test_owner_clears_team() {
    let h = harness();
    let t1 = h.team("t1", &alice()).await;
    let p = h.project("p1", &alice()).await;
    h.services
        .projects
        .assign_to_team(p.id, t1.id, &alice())
        .await
        .unwrap();
    let cleared = h.services.projects.clear_team(p.id, &alice()).await.unwrap();
    assert_eq!(cleared.team_id, None);
}

// ---------------------------------------------------------------------------
// Admin override
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_global_admin_performs_every_verb() {
    let h = harness();
    let t1 = h.team("t1", &bob()).await;
    let p = h.project("p1", &alice()).await;
    let projects = &h.services.projects;
    let carol = carol_admin();

    assert_eq!(projects.read(p.id, &carol).await.unwrap().id, p.id);
    assert_eq!(projects.list(&carol).await.unwrap().len(), 1);
    projects.update(p.id, "renamed", &carol).await.unwrap();
    projects.assign_to_team(p.id, t1.id, &carol).await.unwrap();
    projects.clear_team(p.id, &carol).await.unwrap();
    projects.delete(p.id, &carol).await.unwrap();

    assert_matches!(
        projects.read(Uuid::new_v4(), &carol).await,
        Err(CoreError::NotFound(_))
    );
}

#[tokio::test]
async fn test_read_scenario_alice_bob_carol() {
    let h = harness();
    let p1 = h.project("p1", &alice()).await;
    assert_matches!(
        h.services.projects.read(p1.id, &bob()).await,
        Err(CoreError::NotFound(_))
    );
    assert_eq!(h.services.projects.read(p1.id, &alice()).await.unwrap(), p1);
    assert_eq!(h.services.projects.read(p1.id, &carol_admin()).await.unwrap(), p1);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_list_is_sorted_by_name_and_skips_deleted() {
    let h = harness();
    let b = h.project("beta", &alice()).await;
    h.project("alpha", &alice()).await;
    h.project("gamma", &alice()).await;
    h.services.projects.delete(b.id, &alice()).await.unwrap();

    let names: Vec<String> = h
        .services
        .projects
        .list(&alice())
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["alpha", "gamma"]);
}
