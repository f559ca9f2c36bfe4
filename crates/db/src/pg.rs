//! PostgreSQL implementation of the persistence ports.
//!
//! Multi-row units (team creation, membership changes guarded by the
//! last-admin rule, cascading deletes and sync batches) run in `SERIALIZABLE`
//! transactions. Everything else is a single statement on the pool.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, Transaction};
use timeasy_core::clock::Clock;
use timeasy_core::error::{CoreError, CoreResult};
use timeasy_core::models::membership::{leaves_team_without_admin, LAST_ADMIN_MESSAGE};
use timeasy_core::models::{
    Membership, NewProject, NewTeam, NewTimeEntry, Project, Team, TeamNames, TimeEntry,
    TimeEntryUpdate,
};
use timeasy_core::ports::{
    MembershipRepository, ProjectRepository, Scope, SyncRepository, TeamRepository,
    TimeEntryRepository,
};
use timeasy_core::roles::{Role, RoleSet};
use timeasy_core::sync::BatchPlan;
use timeasy_core::types::{EntityId, Timestamp};

use crate::error::{into_conflict, map_sqlx_error};
use crate::repositories::{MembershipRepo, ProjectRepo, TeamRepo, TimeEntryRepo};
use crate::DbPool;

/// Port adapter backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl PgStore {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn begin_serializable(&self) -> CoreResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(tx)
    }
}

fn membership_not_found(team_id: EntityId, user_id: EntityId) -> CoreError {
    CoreError::NotFound(format!(
        "user {user_id} is not a member of team {team_id}"
    ))
}

async fn load_members(conn: &mut PgConnection, team_id: EntityId) -> CoreResult<Vec<Membership>> {
    MembershipRepo::list_for_team(conn, team_id)
        .await
        .map_err(map_sqlx_error)?
        .into_iter()
        .map(Membership::try_from)
        .collect()
}

/// Reject a role change or removal that would leave the team adminless.
async fn guard_last_admin(
    conn: &mut PgConnection,
    team_id: EntityId,
    user_id: EntityId,
    new_roles: Option<&RoleSet>,
) -> CoreResult<()> {
    let members = load_members(conn, team_id).await?;
    if !members.iter().any(|m| m.user_id == user_id) {
        return Err(membership_not_found(team_id, user_id));
    }
    if leaves_team_without_admin(&members, user_id, new_roles) {
        return Err(CoreError::Forbidden(LAST_ADMIN_MESSAGE.to_string()));
    }
    Ok(())
}

#[async_trait]
impl TeamRepository for PgStore {
    async fn create_with_founder(
        &self,
        team: &NewTeam,
        founder: EntityId,
    ) -> CoreResult<(Team, Membership)> {
        let now = self.clock.now();
        let mut tx = self.begin_serializable().await?;
        let team_row = TeamRepo::create(&mut *tx, team, now)
            .await
            .map_err(map_sqlx_error)?;
        let membership_row =
            MembershipRepo::create(&mut *tx, team.id, founder, &RoleSet::only(Role::Admin), now)
                .await
                .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok((team_row.into(), Membership::try_from(membership_row)?))
    }

    async fn find_by_id(&self, id: EntityId) -> CoreResult<Option<Team>> {
        let row = TeamRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Team::from))
    }

    async fn list_all(&self) -> CoreResult<Vec<Team>> {
        let rows = TeamRepo::list(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn list_for_user(&self, user_id: EntityId) -> CoreResult<Vec<Team>> {
        let rows = TeamRepo::list_for_user(&self.pool, user_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn update(&self, id: EntityId, names: &TeamNames) -> CoreResult<Team> {
        TeamRepo::update(&self.pool, id, names, self.clock.now())
            .await
            .map_err(map_sqlx_error)?
            .map(Team::from)
            .ok_or_else(|| CoreError::not_found("team", id))
    }

    async fn soft_delete(&self, id: EntityId) -> CoreResult<()> {
        let now = self.clock.now();
        let mut tx = self.begin_serializable().await?;
        if !TeamRepo::soft_delete(&mut *tx, id, now)
            .await
            .map_err(map_sqlx_error)?
        {
            return Err(CoreError::not_found("team", id));
        }
        let removed = MembershipRepo::delete_for_team(&mut *tx, id)
            .await
            .map_err(map_sqlx_error)?;
        let detached = ProjectRepo::detach_team(&mut *tx, id, now)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
        tracing::debug!(team_id = %id, removed, detached, "Team soft-deleted");
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for PgStore {
    async fn find(&self, team_id: EntityId, user_id: EntityId) -> CoreResult<Option<Membership>> {
        MembershipRepo::find(&self.pool, team_id, user_id)
            .await
            .map_err(map_sqlx_error)?
            .map(Membership::try_from)
            .transpose()
    }

    async fn list_for_team(&self, team_id: EntityId) -> CoreResult<Vec<Membership>> {
        MembershipRepo::list_for_team(&self.pool, team_id)
            .await
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(Membership::try_from)
            .collect()
    }

    async fn insert(
        &self,
        team_id: EntityId,
        user_id: EntityId,
        roles: &RoleSet,
    ) -> CoreResult<Membership> {
        let row = MembershipRepo::create(&self.pool, team_id, user_id, roles, self.clock.now())
            .await
            .map_err(|err| match map_sqlx_error(err) {
                CoreError::AlreadyExists(_) => CoreError::AlreadyExists(format!(
                    "user {user_id} is already a member of team {team_id}"
                )),
                other => other,
            })?;
        Membership::try_from(row)
    }

    async fn set_roles(
        &self,
        team_id: EntityId,
        user_id: EntityId,
        roles: &RoleSet,
    ) -> CoreResult<Membership> {
        let now = self.clock.now();
        let mut tx = self.begin_serializable().await?;
        guard_last_admin(&mut tx, team_id, user_id, Some(roles)).await?;
        let row = MembershipRepo::set_roles(&mut *tx, team_id, user_id, roles, now)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| membership_not_found(team_id, user_id))?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Membership::try_from(row)
    }

    async fn remove(&self, team_id: EntityId, user_id: EntityId) -> CoreResult<()> {
        let mut tx = self.begin_serializable().await?;
        guard_last_admin(&mut tx, team_id, user_id, None).await?;
        MembershipRepo::delete(&mut *tx, team_id, user_id)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for PgStore {
    async fn insert(&self, project: &NewProject) -> CoreResult<Project> {
        let row = ProjectRepo::create(&self.pool, project, self.clock.now())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn find_by_id(&self, id: EntityId) -> CoreResult<Option<Project>> {
        let row = ProjectRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Project::from))
    }

    async fn find_by_id_including_deleted(&self, id: EntityId) -> CoreResult<Option<Project>> {
        let row = ProjectRepo::find_by_id_include_deleted(&self.pool, id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Project::from))
    }

    async fn list_all(&self) -> CoreResult<Vec<Project>> {
        let rows = ProjectRepo::list(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn list_visible_to(&self, user_id: EntityId) -> CoreResult<Vec<Project>> {
        let rows = ProjectRepo::list_visible_to(&self.pool, user_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn update_name(&self, id: EntityId, name: &str) -> CoreResult<Project> {
        ProjectRepo::update_name(&self.pool, id, name, self.clock.now())
            .await
            .map_err(map_sqlx_error)?
            .map(Project::from)
            .ok_or_else(|| CoreError::not_found("project", id))
    }

    async fn set_team(&self, id: EntityId, team_id: Option<EntityId>) -> CoreResult<Project> {
        ProjectRepo::set_team(&self.pool, id, team_id, self.clock.now())
            .await
            .map_err(map_sqlx_error)?
            .map(Project::from)
            .ok_or_else(|| CoreError::not_found("project", id))
    }

    async fn soft_delete(&self, id: EntityId) -> CoreResult<()> {
        let now = self.clock.now();
        let mut tx = self.begin_serializable().await?;
        if !ProjectRepo::soft_delete(&mut *tx, id, now)
            .await
            .map_err(map_sqlx_error)?
        {
            return Err(CoreError::not_found("project", id));
        }
        let cascaded = TimeEntryRepo::soft_delete_for_project(&mut *tx, id, now)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
        tracing::debug!(project_id = %id, cascaded, "Project soft-deleted");
        Ok(())
    }
}

#[async_trait]
impl TimeEntryRepository for PgStore {
    async fn insert(&self, entry: &NewTimeEntry) -> CoreResult<TimeEntry> {
        let row = TimeEntryRepo::create(&self.pool, entry, self.clock.now())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn insert_many(&self, entries: &[NewTimeEntry]) -> CoreResult<Vec<TimeEntry>> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut created = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = TimeEntryRepo::create(&mut *tx, entry, now)
                .await
                .map_err(map_sqlx_error)?;
            created.push(TimeEntry::from(row));
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: EntityId) -> CoreResult<Option<TimeEntry>> {
        let row = TimeEntryRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(TimeEntry::from))
    }

    async fn find_by_id_including_deleted(&self, id: EntityId) -> CoreResult<Option<TimeEntry>> {
        let row = TimeEntryRepo::find_by_id_include_deleted(&self.pool, id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(TimeEntry::from))
    }

    async fn list_for_user(&self, user_id: EntityId) -> CoreResult<Vec<TimeEntry>> {
        let rows = TimeEntryRepo::list_for_user(&self.pool, user_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(TimeEntry::from).collect())
    }

    async fn list_for_user_and_project(
        &self,
        user_id: EntityId,
        project_id: EntityId,
    ) -> CoreResult<Vec<TimeEntry>> {
        let rows = TimeEntryRepo::list_for_user_and_project(&self.pool, user_id, project_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(TimeEntry::from).collect())
    }

    async fn update(&self, update: &TimeEntryUpdate) -> CoreResult<TimeEntry> {
        TimeEntryRepo::update(&self.pool, update, self.clock.now())
            .await
            .map_err(map_sqlx_error)?
            .map(TimeEntry::from)
            .ok_or_else(|| CoreError::not_found("time entry", update.id))
    }

    async fn update_many(&self, updates: &[TimeEntryUpdate]) -> CoreResult<Vec<TimeEntry>> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            let row = TimeEntryRepo::update(&mut *tx, update, now)
                .await
                .map_err(map_sqlx_error)?
                .ok_or_else(|| CoreError::not_found("time entry", update.id))?;
            updated.push(TimeEntry::from(row));
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(updated)
    }

    async fn soft_delete(&self, id: EntityId) -> CoreResult<()> {
        let deleted = TimeEntryRepo::soft_delete(&self.pool, id, self.clock.now())
            .await
            .map_err(map_sqlx_error)?;
        if deleted {
            Ok(())
        } else {
            Err(CoreError::not_found("time entry", id))
        }
    }
}

fn scope_user(scope: Scope) -> Option<EntityId> {
    match scope {
        Scope::All => None,
        Scope::User(user_id) => Some(user_id),
    }
}

/// Apply every step of a plan on one connection, in plan order.
async fn apply_plan(conn: &mut PgConnection, plan: &BatchPlan, now: Timestamp) -> CoreResult<()> {
    for project in &plan.projects_to_upsert {
        ProjectRepo::upsert(&mut *conn, project, now)
            .await
            .map_err(map_sqlx_error)?;
    }
    for id in &plan.projects_to_delete {
        if !ProjectRepo::soft_delete(&mut *conn, *id, now)
            .await
            .map_err(map_sqlx_error)?
        {
            return Err(CoreError::not_found("project", id));
        }
        TimeEntryRepo::soft_delete_for_project(&mut *conn, *id, now)
            .await
            .map_err(map_sqlx_error)?;
    }
    for entry in &plan.entries_to_upsert {
        let live_project = ProjectRepo::find_by_id(&mut *conn, entry.project_id)
            .await
            .map_err(map_sqlx_error)?;
        if live_project.is_none() {
            return Err(CoreError::DependencyMissing(format!(
                "project {} of time entry {} does not exist",
                entry.project_id, entry.id
            )));
        }
        TimeEntryRepo::upsert(&mut *conn, entry, now)
            .await
            .map_err(map_sqlx_error)?;
    }
    for id in &plan.entries_to_delete {
        TimeEntryRepo::soft_delete(&mut *conn, *id, now)
            .await
            .map_err(map_sqlx_error)?;
    }
    Ok(())
}

#[async_trait]
impl SyncRepository for PgStore {
    async fn changed_projects(&self, scope: Scope, since: Timestamp) -> CoreResult<Vec<Project>> {
        let rows = ProjectRepo::changed_since(&self.pool, scope_user(scope), since)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn changed_time_entries(
        &self,
        scope: Scope,
        since: Timestamp,
    ) -> CoreResult<Vec<TimeEntry>> {
        let rows = TimeEntryRepo::changed_since(&self.pool, scope_user(scope), since)
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(TimeEntry::from).collect())
    }

    async fn apply_batch(&self, plan: &BatchPlan) -> CoreResult<()> {
        let now = self.clock.now();
        let mut tx = self.begin_serializable().await.map_err(into_conflict)?;
        // Dropping `tx` on the error path rolls the whole batch back.
        apply_plan(&mut tx, plan, now).await.map_err(into_conflict)?;
        tx.commit()
            .await
            .map_err(|err| into_conflict(map_sqlx_error(err)))?;
        tracing::debug!(
            projects_upserted = plan.projects_to_upsert.len(),
            projects_deleted = plan.projects_to_delete.len(),
            entries_upserted = plan.entries_to_upsert.len(),
            entries_deleted = plan.entries_to_delete.len(),
            "Sync batch committed"
        );
        Ok(())
    }
}
