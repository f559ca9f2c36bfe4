//! Sync use-case: the change feed a client pulls and the batch it pushes.
//!
//! An inbound batch is resolved into a [`BatchPlan`] row by row, in the order
//! storage will apply it (project upserts, project deletes, entry upserts,
//! entry deletes). The first row that fails validation or authorisation
//! refuses the whole batch before anything is written. The plan is then
//! handed to storage as one transaction.

use std::collections::HashSet;
use std::sync::Arc;

use timeasy_core::access::{self, ProjectAction, TimeEntryAction};
use timeasy_core::clock::Clock;
use timeasy_core::error::{CoreError, CoreResult};
use timeasy_core::identity::Caller;
use timeasy_core::models::{NewProject, NewTimeEntry, Project, TimeEntry};
use timeasy_core::ports::{ProjectRepository, Scope, SyncRepository, TimeEntryRepository};
use timeasy_core::sync::{
    change_feed, BatchPlan, Change, ChangeSet, ProjectUpsert, SyncBatch, SyncSummary,
    TimeEntryUpsert,
};
use timeasy_core::types::{EntityId, Timestamp};
use timeasy_core::validation::{require_id, require_name};

use crate::lookup::{authorize_attach, authorize_project, decide_project, TeamLookup};

#[derive(Clone)]
pub struct SyncService {
    sync: Arc<dyn SyncRepository>,
    projects: Arc<dyn ProjectRepository>,
    entries: Arc<dyn TimeEntryRepository>,
    teams: Arc<dyn TeamLookup>,
    clock: Arc<dyn Clock>,
}

/// Projects touched earlier in the batch being planned.
#[derive(Default)]
struct BatchState {
    upserted_projects: HashSet<EntityId>,
    deleted_projects: HashSet<EntityId>,
}

fn scope_of(caller: &Caller) -> Scope {
    if caller.is_global_admin() {
        Scope::All
    } else {
        Scope::User(caller.user_id)
    }
}

impl SyncService {
    pub fn new(
        sync: Arc<dyn SyncRepository>,
        projects: Arc<dyn ProjectRepository>,
        entries: Arc<dyn TimeEntryRepository>,
        teams: Arc<dyn TeamLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sync,
            projects,
            entries,
            teams,
            clock,
        }
    }

    // -----------------------------------------------------------------------
    // Change feed
    // -----------------------------------------------------------------------

    /// Projects visible to the caller that changed after `since`.
    pub async fn changed_projects(
        &self,
        caller: &Caller,
        since: Timestamp,
    ) -> CoreResult<Vec<Change<Project>>> {
        let rows = self.sync.changed_projects(scope_of(caller), since).await?;
        Ok(change_feed(rows, since))
    }

    /// The caller's time entries that changed after `since`.
    pub async fn changed_time_entries(
        &self,
        caller: &Caller,
        since: Timestamp,
    ) -> CoreResult<Vec<Change<TimeEntry>>> {
        let rows = self.sync.changed_time_entries(scope_of(caller), since).await?;
        Ok(change_feed(rows, since))
    }

    pub async fn changed(&self, caller: &Caller, since: Timestamp) -> CoreResult<ChangeSet> {
        let projects = self.changed_projects(caller, since).await?;
        let time_entries = self.changed_time_entries(caller, since).await?;
        tracing::debug!(
            user_id = %caller.user_id,
            since = %since,
            projects = projects.len(),
            time_entries = time_entries.len(),
            "Change feed built"
        );
        Ok(ChangeSet {
            projects,
            time_entries,
        })
    }

    // -----------------------------------------------------------------------
    // Inbound batch
    // -----------------------------------------------------------------------

    /// Apply a client batch all-or-nothing.
    pub async fn apply(&self, batch: SyncBatch, caller: &Caller) -> CoreResult<SyncSummary> {
        let plan = self.plan(batch, caller).await?;
        self.sync.apply_batch(&plan).await?;
        let summary = SyncSummary::from(&plan);
        tracing::info!(
            user_id = %caller.user_id,
            projects_upserted = summary.projects_upserted,
            projects_deleted = summary.projects_deleted,
            time_entries_upserted = summary.time_entries_upserted,
            time_entries_deleted = summary.time_entries_deleted,
            "Sync batch applied"
        );
        Ok(summary)
    }

    async fn plan(&self, batch: SyncBatch, caller: &Caller) -> CoreResult<BatchPlan> {
        let mut state = BatchState::default();
        let mut plan = BatchPlan::default();

        for upsert in batch.projects_to_upsert {
            let project = self.plan_project_upsert(upsert, caller).await?;
            state.deleted_projects.remove(&project.id);
            state.upserted_projects.insert(project.id);
            plan.projects_to_upsert.push(project);
        }
        for id in batch.projects_to_delete {
            if self.plan_project_delete(id, caller, &state).await? {
                plan.projects_to_delete.push(id);
            }
            state.deleted_projects.insert(id);
        }
        for upsert in batch.entries_to_upsert {
            let entry = self.plan_entry_upsert(upsert, caller, &state).await?;
            plan.entries_to_upsert.push(entry);
        }
        let upserted_entries: HashSet<EntityId> =
            plan.entries_to_upsert.iter().map(|e| e.id).collect();
        for id in batch.entries_to_delete {
            if self.plan_entry_delete(id, caller, &upserted_entries).await? {
                plan.entries_to_delete.push(id);
            }
        }
        Ok(plan)
    }

    async fn plan_project_upsert(
        &self,
        upsert: ProjectUpsert,
        caller: &Caller,
    ) -> CoreResult<NewProject> {
        require_id("project id", upsert.id)?;
        require_name("project name", &upsert.name)?;

        let owner_user_id = match self.projects.find_by_id_including_deleted(upsert.id).await? {
            Some(existing) => {
                authorize_project(self.teams.as_ref(), caller, &existing, ProjectAction::Update)
                    .await?;
                if upsert.team_id != existing.team_id {
                    match upsert.team_id {
                        Some(team_id) => {
                            authorize_project(
                                self.teams.as_ref(),
                                caller,
                                &existing,
                                ProjectAction::AssignToTeam,
                            )
                            .await?;
                            authorize_attach(self.teams.as_ref(), caller, team_id).await?;
                        }
                        None => {
                            authorize_project(
                                self.teams.as_ref(),
                                caller,
                                &existing,
                                ProjectAction::ClearTeam,
                            )
                            .await?;
                        }
                    }
                }
                existing.owner_user_id
            }
            None => {
                if let Some(team_id) = upsert.team_id {
                    authorize_attach(self.teams.as_ref(), caller, team_id).await?;
                }
                caller.user_id
            }
        };

        Ok(NewProject {
            id: upsert.id,
            name: upsert.name,
            owner_user_id,
            team_id: upsert.team_id,
        })
    }

    /// `Ok(false)` for an already deleted project the caller may delete.
    async fn plan_project_delete(
        &self,
        id: EntityId,
        caller: &Caller,
        state: &BatchState,
    ) -> CoreResult<bool> {
        if state.deleted_projects.contains(&id) {
            return Ok(false);
        }
        if state.upserted_projects.contains(&id) {
            return Ok(true);
        }
        let existing = self
            .projects
            .find_by_id_including_deleted(id)
            .await?
            .ok_or_else(|| CoreError::not_found("project", id))?;
        let (decision, can_read) =
            decide_project(self.teams.as_ref(), caller, &existing, ProjectAction::Delete).await?;
        if !decision.is_allowed() {
            // A deleted row reads as missing to anyone who may not delete it.
            let can_read = can_read && !existing.is_deleted();
            return Err(access::project_refusal(&existing, ProjectAction::Delete, can_read));
        }
        Ok(!existing.is_deleted())
    }

    async fn plan_entry_upsert(
        &self,
        upsert: TimeEntryUpsert,
        caller: &Caller,
        state: &BatchState,
    ) -> CoreResult<NewTimeEntry> {
        require_id("time entry id", upsert.id)?;
        require_id("project id", upsert.project_id)?;
        self.ensure_project_in_batch(upsert.project_id, caller, state)
            .await?;

        let existing = self.entries.find_by_id_including_deleted(upsert.id).await?;
        let (owner_user_id, stored_start) = match existing {
            Some(entry) => {
                if !access::time_entry(caller, &entry, TimeEntryAction::Update).is_allowed() {
                    return Err(access::time_entry_refusal(&entry, TimeEntryAction::Update));
                }
                (entry.owner_user_id, Some(entry.start_time))
            }
            None => (caller.user_id, None),
        };

        Ok(NewTimeEntry {
            id: upsert.id,
            owner_user_id,
            project_id: upsert.project_id,
            start_time: upsert
                .start_time
                .or(stored_start)
                .unwrap_or_else(|| self.clock.now()),
            end_time: upsert.end_time,
            description: upsert.description,
        })
    }

    /// The project of an entry upsert must be live after the preceding
    /// steps of the batch, and readable by the caller.
    async fn ensure_project_in_batch(
        &self,
        project_id: EntityId,
        caller: &Caller,
        state: &BatchState,
    ) -> CoreResult<()> {
        let missing = || CoreError::DependencyMissing(format!("project {project_id} does not exist"));
        if state.deleted_projects.contains(&project_id) {
            return Err(missing());
        }
        if state.upserted_projects.contains(&project_id) {
            return Ok(());
        }
        let project = self.projects.find_by_id(project_id).await?.ok_or_else(missing)?;
        let (decision, _) =
            decide_project(self.teams.as_ref(), caller, &project, ProjectAction::Read).await?;
        if decision.is_allowed() {
            Ok(())
        } else {
            Err(missing())
        }
    }

    /// `Ok(false)` for an entry that is already deleted.
    async fn plan_entry_delete(
        &self,
        id: EntityId,
        caller: &Caller,
        upserted_entries: &HashSet<EntityId>,
    ) -> CoreResult<bool> {
        let existing = self.entries.find_by_id_including_deleted(id).await?;
        let Some(entry) = existing else {
            return if upserted_entries.contains(&id) {
                Ok(true)
            } else {
                Err(CoreError::not_found("time entry", id))
            };
        };
        if !access::time_entry(caller, &entry, TimeEntryAction::Delete).is_allowed() {
            return Err(access::time_entry_refusal(&entry, TimeEntryAction::Delete));
        }
        Ok(!entry.is_deleted() || upserted_entries.contains(&id))
    }
}
