//! In-process implementation of the persistence ports.
//!
//! All tables live behind one async lock. Every write runs against a copy of
//! the tables that replaces the live state only when the whole operation
//! succeeded, which gives the same all-or-nothing behaviour as the
//! PostgreSQL transactions.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
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
use timeasy_core::sync::{BatchPlan, Tracked};
use timeasy_core::types::{EntityId, Timestamp};
use tokio::sync::RwLock;

use crate::error::into_conflict;

#[derive(Debug, Clone, Default)]
struct Tables {
    teams: BTreeMap<EntityId, Team>,
    /// Keyed by `(team_id, user_id)`.
    memberships: BTreeMap<(EntityId, EntityId), Membership>,
    projects: BTreeMap<EntityId, Project>,
    time_entries: BTreeMap<EntityId, TimeEntry>,
}

/// Byte-wise name order, the same as `COLLATE "C"` in the Postgres queries.
fn by_name(a: &Project, b: &Project) -> std::cmp::Ordering {
    a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
}

fn newest_first(a: &TimeEntry, b: &TimeEntry) -> std::cmp::Ordering {
    b.start_time
        .cmp(&a.start_time)
        .then_with(|| b.end_time.cmp(&a.end_time))
        .then_with(|| a.id.cmp(&b.id))
}

fn membership_not_found(team_id: EntityId, user_id: EntityId) -> CoreError {
    CoreError::NotFound(format!(
        "user {user_id} is not a member of team {team_id}"
    ))
}

impl Tables {
    fn members_of(&self, team_id: EntityId) -> Vec<Membership> {
        let mut members: Vec<Membership> = self
            .memberships
            .range((team_id, EntityId::nil())..=(team_id, EntityId::from_u128(u128::MAX)))
            .map(|(_, m)| m.clone())
            .collect();
        members.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        members
    }

    fn is_member(&self, team_id: EntityId, user_id: EntityId) -> bool {
        self.memberships.contains_key(&(team_id, user_id))
    }

    fn project_visible_to(&self, project: &Project, user_id: EntityId) -> bool {
        project.is_owned_by(user_id)
            || project
                .team_id
                .is_some_and(|team_id| self.is_member(team_id, user_id))
    }

    fn require_team_row(&self, team_id: Option<EntityId>) -> CoreResult<()> {
        match team_id {
            Some(id) if !self.teams.contains_key(&id) => Err(CoreError::DependencyMissing(
                format!("team {id} does not exist"),
            )),
            _ => Ok(()),
        }
    }

    fn require_project_row(&self, project_id: EntityId) -> CoreResult<()> {
        if self.projects.contains_key(&project_id) {
            Ok(())
        } else {
            Err(CoreError::DependencyMissing(format!(
                "project {project_id} does not exist"
            )))
        }
    }

    fn guard_last_admin(
        &self,
        team_id: EntityId,
        user_id: EntityId,
        new_roles: Option<&RoleSet>,
    ) -> CoreResult<()> {
        let members = self.members_of(team_id);
        if !members.iter().any(|m| m.user_id == user_id) {
            return Err(membership_not_found(team_id, user_id));
        }
        if leaves_team_without_admin(&members, user_id, new_roles) {
            return Err(CoreError::Forbidden(LAST_ADMIN_MESSAGE.to_string()));
        }
        Ok(())
    }

    fn insert_membership(
        &mut self,
        team_id: EntityId,
        user_id: EntityId,
        roles: RoleSet,
        now: Timestamp,
    ) -> CoreResult<Membership> {
        if !self.teams.contains_key(&team_id) {
            return Err(CoreError::DependencyMissing(format!(
                "team {team_id} does not exist"
            )));
        }
        if self.is_member(team_id, user_id) {
            return Err(CoreError::AlreadyExists(format!(
                "user {user_id} is already a member of team {team_id}"
            )));
        }
        let membership = Membership {
            user_id,
            team_id,
            roles,
            created_at: now,
            updated_at: now,
        };
        self.memberships
            .insert((team_id, user_id), membership.clone());
        Ok(membership)
    }

    fn insert_project(&mut self, input: &NewProject, now: Timestamp) -> CoreResult<Project> {
        if self.projects.contains_key(&input.id) {
            return Err(CoreError::AlreadyExists(format!(
                "project {} already exists",
                input.id
            )));
        }
        self.require_team_row(input.team_id)?;
        let project = Project {
            id: input.id,
            name: input.name.clone(),
            owner_user_id: input.owner_user_id,
            team_id: input.team_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.projects.insert(project.id, project.clone());
        Ok(project)
    }

    fn upsert_project(&mut self, input: &NewProject, now: Timestamp) -> CoreResult<Project> {
        self.require_team_row(input.team_id)?;
        match self.projects.get_mut(&input.id) {
            Some(project) => {
                project.name = input.name.clone();
                project.team_id = input.team_id;
                project.updated_at = now;
                project.deleted_at = None;
                Ok(project.clone())
            }
            None => self.insert_project(input, now),
        }
    }

    fn live_project_mut(&mut self, id: EntityId) -> CoreResult<&mut Project> {
        self.projects
            .get_mut(&id)
            .filter(|p| !p.is_deleted())
            .ok_or_else(|| CoreError::not_found("project", id))
    }

    fn soft_delete_project(&mut self, id: EntityId, now: Timestamp) -> CoreResult<usize> {
        self.live_project_mut(id)?.deleted_at = Some(now);
        let mut cascaded = 0;
        for entry in self
            .time_entries
            .values_mut()
            .filter(|e| e.project_id == id && !e.is_deleted())
        {
            entry.deleted_at = Some(now);
            cascaded += 1;
        }
        Ok(cascaded)
    }

    fn insert_entry(&mut self, input: &NewTimeEntry, now: Timestamp) -> CoreResult<TimeEntry> {
        if self.time_entries.contains_key(&input.id) {
            return Err(CoreError::AlreadyExists(format!(
                "time entry {} already exists",
                input.id
            )));
        }
        self.require_project_row(input.project_id)?;
        let entry = TimeEntry {
            id: input.id,
            owner_user_id: input.owner_user_id,
            project_id: input.project_id,
            start_time: input.start_time,
            end_time: input.end_time,
            description: input.description.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.time_entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    fn upsert_entry(&mut self, input: &NewTimeEntry, now: Timestamp) -> CoreResult<TimeEntry> {
        self.require_project_row(input.project_id)?;
        match self.time_entries.get_mut(&input.id) {
            Some(entry) => {
                entry.project_id = input.project_id;
                entry.start_time = input.start_time;
                entry.end_time = input.end_time;
                entry.description = input.description.clone();
                entry.updated_at = now;
                entry.deleted_at = None;
                Ok(entry.clone())
            }
            None => self.insert_entry(input, now),
        }
    }

    fn update_entry(&mut self, update: &TimeEntryUpdate, now: Timestamp) -> CoreResult<TimeEntry> {
        self.require_project_row(update.project_id)?;
        let entry = self
            .time_entries
            .get_mut(&update.id)
            .filter(|e| !e.is_deleted())
            .ok_or_else(|| CoreError::not_found("time entry", update.id))?;
        entry.project_id = update.project_id;
        entry.start_time = update.start_time;
        entry.end_time = update.end_time;
        entry.description = update.description.clone();
        entry.updated_at = now;
        Ok(entry.clone())
    }

    fn soft_delete_entry(&mut self, id: EntityId, now: Timestamp) -> bool {
        match self.time_entries.get_mut(&id).filter(|e| !e.is_deleted()) {
            Some(entry) => {
                entry.deleted_at = Some(now);
                true
            }
            None => false,
        }
    }

    fn apply_plan(&mut self, plan: &BatchPlan, now: Timestamp) -> CoreResult<()> {
        for project in &plan.projects_to_upsert {
            self.upsert_project(project, now)?;
        }
        for id in &plan.projects_to_delete {
            self.soft_delete_project(*id, now)?;
        }
        for entry in &plan.entries_to_upsert {
            let project_is_live = self
                .projects
                .get(&entry.project_id)
                .is_some_and(|p| !p.is_deleted());
            if !project_is_live {
                return Err(CoreError::DependencyMissing(format!(
                    "project {} of time entry {} does not exist",
                    entry.project_id, entry.id
                )));
            }
            self.upsert_entry(entry, now)?;
        }
        for id in &plan.entries_to_delete {
            self.soft_delete_entry(*id, now);
        }
        Ok(())
    }
}

/// Port adapter keeping everything in process memory.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
        }
    }

    /// Run `op` against a staged copy of the tables and publish the copy only
    /// if `op` succeeds.
    async fn transact<T>(
        &self,
        op: impl FnOnce(&mut Tables, Timestamp) -> CoreResult<T> + Send,
    ) -> CoreResult<T> {
        let now = self.clock.now();
        let mut live = self.tables.write().await;
        let mut staged = live.clone();
        let out = op(&mut staged, now)?;
        *live = staged;
        Ok(out)
    }
}

#[async_trait]
impl TeamRepository for MemoryStore {
    async fn create_with_founder(
        &self,
        team: &NewTeam,
        founder: EntityId,
    ) -> CoreResult<(Team, Membership)> {
        self.transact(|tables, now| {
            if tables.teams.contains_key(&team.id) {
                return Err(CoreError::AlreadyExists(format!(
                    "team {} already exists",
                    team.id
                )));
            }
            let row = Team {
                id: team.id,
                name1: team.names.name1.clone(),
                name2: team.names.name2.clone(),
                name3: team.names.name3.clone(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            tables.teams.insert(row.id, row.clone());
            let founder =
                tables.insert_membership(row.id, founder, RoleSet::only(Role::Admin), now)?;
            Ok((row, founder))
        })
        .await
    }

    async fn find_by_id(&self, id: EntityId) -> CoreResult<Option<Team>> {
        let tables = self.tables.read().await;
        Ok(tables.teams.get(&id).filter(|t| t.deleted_at.is_none()).cloned())
    }

    async fn list_all(&self) -> CoreResult<Vec<Team>> {
        let tables = self.tables.read().await;
        let mut teams: Vec<Team> = tables
            .teams
            .values()
            .filter(|t| t.deleted_at.is_none())
            .cloned()
            .collect();
        teams.sort_by(|a, b| a.name1.cmp(&b.name1).then_with(|| a.id.cmp(&b.id)));
        Ok(teams)
    }

    async fn list_for_user(&self, user_id: EntityId) -> CoreResult<Vec<Team>> {
        let tables = self.tables.read().await;
        let mut teams: Vec<Team> = tables
            .teams
            .values()
            .filter(|t| t.deleted_at.is_none() && tables.is_member(t.id, user_id))
            .cloned()
            .collect();
        teams.sort_by(|a, b| a.name1.cmp(&b.name1).then_with(|| a.id.cmp(&b.id)));
        Ok(teams)
    }

    async fn update(&self, id: EntityId, names: &TeamNames) -> CoreResult<Team> {
        self.transact(|tables, now| {
            let team = tables
                .teams
                .get_mut(&id)
                .filter(|t| t.deleted_at.is_none())
                .ok_or_else(|| CoreError::not_found("team", id))?;
            team.name1 = names.name1.clone();
            team.name2 = names.name2.clone();
            team.name3 = names.name3.clone();
            team.updated_at = now;
            Ok(team.clone())
        })
        .await
    }

    async fn soft_delete(&self, id: EntityId) -> CoreResult<()> {
        self.transact(|tables, now| {
            let team = tables
                .teams
                .get_mut(&id)
                .filter(|t| t.deleted_at.is_none())
                .ok_or_else(|| CoreError::not_found("team", id))?;
            team.deleted_at = Some(now);
            tables.memberships.retain(|(team_id, _), _| *team_id != id);
            for project in tables
                .projects
                .values_mut()
                .filter(|p| p.team_id == Some(id))
            {
                project.team_id = None;
                project.updated_at = now;
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl MembershipRepository for MemoryStore {
    async fn find(&self, team_id: EntityId, user_id: EntityId) -> CoreResult<Option<Membership>> {
        let tables = self.tables.read().await;
        Ok(tables.memberships.get(&(team_id, user_id)).cloned())
    }

    async fn list_for_team(&self, team_id: EntityId) -> CoreResult<Vec<Membership>> {
        Ok(self.tables.read().await.members_of(team_id))
    }

    async fn insert(
        &self,
        team_id: EntityId,
        user_id: EntityId,
        roles: &RoleSet,
    ) -> CoreResult<Membership> {
        self.transact(|tables, now| tables.insert_membership(team_id, user_id, roles.clone(), now))
            .await
    }

    async fn set_roles(
        &self,
        team_id: EntityId,
        user_id: EntityId,
        roles: &RoleSet,
    ) -> CoreResult<Membership> {
        self.transact(|tables, now| {
            tables.guard_last_admin(team_id, user_id, Some(roles))?;
            let membership = tables
                .memberships
                .get_mut(&(team_id, user_id))
                .ok_or_else(|| membership_not_found(team_id, user_id))?;
            membership.roles = roles.clone();
            membership.updated_at = now;
            Ok(membership.clone())
        })
        .await
    }

    async fn remove(&self, team_id: EntityId, user_id: EntityId) -> CoreResult<()> {
        self.transact(|tables, _| {
            tables.guard_last_admin(team_id, user_id, None)?;
            tables.memberships.remove(&(team_id, user_id));
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn insert(&self, project: &NewProject) -> CoreResult<Project> {
        self.transact(|tables, now| tables.insert_project(project, now))
            .await
    }

    async fn find_by_id(&self, id: EntityId) -> CoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.get(&id).filter(|p| !p.is_deleted()).cloned())
    }

    async fn find_by_id_including_deleted(&self, id: EntityId) -> CoreResult<Option<Project>> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn list_all(&self) -> CoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| !p.is_deleted())
            .cloned()
            .collect();
        projects.sort_by(by_name);
        Ok(projects)
    }

    async fn list_visible_to(&self, user_id: EntityId) -> CoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| !p.is_deleted() && tables.project_visible_to(p, user_id))
            .cloned()
            .collect();
        projects.sort_by(by_name);
        Ok(projects)
    }

    async fn update_name(&self, id: EntityId, name: &str) -> CoreResult<Project> {
        self.transact(|tables, now| {
            let project = tables.live_project_mut(id)?;
            project.name = name.to_string();
            project.updated_at = now;
            Ok(project.clone())
        })
        .await
    }

    async fn set_team(&self, id: EntityId, team_id: Option<EntityId>) -> CoreResult<Project> {
        self.transact(|tables, now| {
            tables.require_team_row(team_id)?;
            let project = tables.live_project_mut(id)?;
            project.team_id = team_id;
            project.updated_at = now;
            Ok(project.clone())
        })
        .await
    }

    async fn soft_delete(&self, id: EntityId) -> CoreResult<()> {
        let cascaded = self
            .transact(|tables, now| tables.soft_delete_project(id, now))
            .await?;
        tracing::debug!(project_id = %id, cascaded, "Project soft-deleted");
        Ok(())
    }
}

#[async_trait]
impl TimeEntryRepository for MemoryStore {
    async fn insert(&self, entry: &NewTimeEntry) -> CoreResult<TimeEntry> {
        self.transact(|tables, now| tables.insert_entry(entry, now))
            .await
    }

    async fn insert_many(&self, entries: &[NewTimeEntry]) -> CoreResult<Vec<TimeEntry>> {
        self.transact(|tables, now| {
            entries
                .iter()
                .map(|entry| tables.insert_entry(entry, now))
                .collect()
        })
        .await
    }

    async fn find_by_id(&self, id: EntityId) -> CoreResult<Option<TimeEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .time_entries
            .get(&id)
            .filter(|e| !e.is_deleted())
            .cloned())
    }

    async fn find_by_id_including_deleted(&self, id: EntityId) -> CoreResult<Option<TimeEntry>> {
        Ok(self.tables.read().await.time_entries.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: EntityId) -> CoreResult<Vec<TimeEntry>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<TimeEntry> = tables
            .time_entries
            .values()
            .filter(|e| !e.is_deleted() && e.is_owned_by(user_id))
            .cloned()
            .collect();
        entries.sort_by(newest_first);
        Ok(entries)
    }

    async fn list_for_user_and_project(
        &self,
        user_id: EntityId,
        project_id: EntityId,
    ) -> CoreResult<Vec<TimeEntry>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<TimeEntry> = tables
            .time_entries
            .values()
            .filter(|e| !e.is_deleted() && e.is_owned_by(user_id) && e.project_id == project_id)
            .cloned()
            .collect();
        entries.sort_by(newest_first);
        Ok(entries)
    }

    async fn update(&self, update: &TimeEntryUpdate) -> CoreResult<TimeEntry> {
        self.transact(|tables, now| tables.update_entry(update, now))
            .await
    }

    async fn update_many(&self, updates: &[TimeEntryUpdate]) -> CoreResult<Vec<TimeEntry>> {
        self.transact(|tables, now| {
            updates
                .iter()
                .map(|update| tables.update_entry(update, now))
                .collect()
        })
        .await
    }

    async fn soft_delete(&self, id: EntityId) -> CoreResult<()> {
        self.transact(|tables, now| {
            if tables.soft_delete_entry(id, now) {
                Ok(())
            } else {
                Err(CoreError::not_found("time entry", id))
            }
        })
        .await
    }
}

#[async_trait]
impl SyncRepository for MemoryStore {
    async fn changed_projects(&self, scope: Scope, since: Timestamp) -> CoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .values()
            .filter(|p| p.last_touched() > since)
            .filter(|p| match scope {
                Scope::All => true,
                Scope::User(user_id) => tables.project_visible_to(p, user_id),
            })
            .cloned()
            .collect())
    }

    async fn changed_time_entries(
        &self,
        scope: Scope,
        since: Timestamp,
    ) -> CoreResult<Vec<TimeEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .time_entries
            .values()
            .filter(|e| e.last_touched() > since)
            .filter(|e| match scope {
                Scope::All => true,
                Scope::User(user_id) => e.is_owned_by(user_id),
            })
            .cloned()
            .collect())
    }

    async fn apply_batch(&self, plan: &BatchPlan) -> CoreResult<()> {
        self.transact(|tables, now| tables.apply_plan(plan, now))
            .await
            .map_err(into_conflict)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};
    use timeasy_core::clock::ManualClock;
    use uuid::Uuid;

    use super::*;

    fn store() -> (MemoryStore, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2023, 8, 1, 0, 0, 0).unwrap());
        (MemoryStore::new(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_tables_untouched() {
        let (store, _) = store();
        let owner = Uuid::new_v4();
        let project = NewProject::new("p1", owner);
        let plan = BatchPlan {
            projects_to_upsert: vec![project.clone()],
            entries_to_upsert: vec![NewTimeEntry {
                id: Uuid::new_v4(),
                owner_user_id: owner,
                project_id: Uuid::new_v4(),
                start_time: Utc::now(),
                end_time: None,
                description: String::new(),
            }],
            ..BatchPlan::default()
        };

        assert_matches!(store.apply_batch(&plan).await, Err(CoreError::Conflict(_)));
        assert!(
            ProjectRepository::find_by_id_including_deleted(&store, project.id)
                .await
                .unwrap()
                .is_none(),
            "project upsert must be rolled back with the failing entry"
        );
    }

    #[tokio::test]
    async fn test_project_delete_cascades_to_entries() {
        let (store, clock) = store();
        let owner = Uuid::new_v4();
        let project = ProjectRepository::insert(&store, &NewProject::new("p1", owner))
            .await
            .unwrap();
        let entry = TimeEntryRepository::insert(
            &store,
            &NewTimeEntry {
                id: Uuid::new_v4(),
                owner_user_id: owner,
                project_id: project.id,
                start_time: clock.now(),
                end_time: None,
                description: "work".into(),
            },
        )
        .await
        .unwrap();

        clock.advance(Duration::hours(1));
        ProjectRepository::soft_delete(&store, project.id).await.unwrap();

        let stored = TimeEntryRepository::find_by_id_including_deleted(&store, entry.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.deleted_at, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_removing_last_admin_is_refused() {
        let (store, _) = store();
        let founder = Uuid::new_v4();
        let (team, _) = store
            .create_with_founder(&NewTeam::new(TeamNames::new("t1")), founder)
            .await
            .unwrap();

        assert_matches!(
            store.remove(team.id, founder).await,
            Err(CoreError::Forbidden(msg)) if msg == LAST_ADMIN_MESSAGE
        );
        assert_eq!(store.list_for_team(team.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_projects_listed_in_byte_order_of_name() {
        let (store, _) = store();
        let owner = Uuid::new_v4();
        for name in ["beta", "Gamma", "alpha"] {
            ProjectRepository::insert(&store, &NewProject::new(name, owner))
                .await
                .unwrap();
        }

        let names: Vec<String> = ProjectRepository::list_all(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Gamma", "alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_duplicate_membership_already_exists() {
        let (store, _) = store();
        let (team, _) = store
            .create_with_founder(&NewTeam::new(TeamNames::new("t1")), Uuid::new_v4())
            .await
            .unwrap();
        let bob = Uuid::new_v4();
        MembershipRepository::insert(&store, team.id, bob, &RoleSet::only(Role::User))
            .await
            .unwrap();
        assert_matches!(
            MembershipRepository::insert(&store, team.id, bob, &RoleSet::only(Role::User)).await,
            Err(CoreError::AlreadyExists(_))
        );
    }
}
