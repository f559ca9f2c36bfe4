//! TimeEntry use-case.
//!
//! Entries are private to their owner; team membership grants nothing here.
//! Every write re-checks that the referenced project is live and readable
//! by the caller before storage is touched.

use std::sync::Arc;

use timeasy_core::access::{self, ProjectAction, TimeEntryAction};
use timeasy_core::clock::Clock;
use timeasy_core::error::{CoreError, CoreResult};
use timeasy_core::identity::Caller;
use timeasy_core::models::{NewTimeEntry, TimeEntry, TimeEntryInput, TimeEntryUpdate};
use timeasy_core::ports::{ProjectRepository, TimeEntryRepository};
use timeasy_core::types::EntityId;
use timeasy_core::validation::require_id;

use crate::lookup::{decide_project, TeamLookup};

#[derive(Clone)]
pub struct TimeEntryService {
    entries: Arc<dyn TimeEntryRepository>,
    projects: Arc<dyn ProjectRepository>,
    teams: Arc<dyn TeamLookup>,
    clock: Arc<dyn Clock>,
}

impl TimeEntryService {
    pub fn new(
        entries: Arc<dyn TimeEntryRepository>,
        projects: Arc<dyn ProjectRepository>,
        teams: Arc<dyn TeamLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            entries,
            projects,
            teams,
            clock,
        }
    }

    /// The project must exist, be live and be readable by the caller. Any
    /// failure is `DependencyMissing` so unreadable projects stay hidden.
    async fn ensure_bookable(&self, project_id: EntityId, caller: &Caller) -> CoreResult<()> {
        require_id("project id", project_id)?;
        let missing =
            || CoreError::DependencyMissing(format!("project {project_id} does not exist"));
        let project = self.projects.find_by_id(project_id).await?.ok_or_else(missing)?;
        let (decision, _) =
            decide_project(self.teams.as_ref(), caller, &project, ProjectAction::Read).await?;
        if decision.is_allowed() {
            Ok(())
        } else {
            Err(missing())
        }
    }

    async fn load_authorized(
        &self,
        id: EntityId,
        caller: &Caller,
        action: TimeEntryAction,
    ) -> CoreResult<TimeEntry> {
        let entry = self
            .entries
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("time entry", id))?;
        if access::time_entry(caller, &entry, action).is_allowed() {
            Ok(entry)
        } else {
            tracing::debug!(entry_id = %id, user_id = %caller.user_id, ?action, "Time entry action denied");
            Err(access::time_entry_refusal(&entry, action))
        }
    }

    /// Resolve whose entries to list: the caller's own by default; another
    /// user's only for a global admin.
    fn target_user(caller: &Caller, user_id: Option<EntityId>) -> CoreResult<EntityId> {
        match user_id {
            Some(user_id) if user_id != caller.user_id && !caller.is_global_admin() => Err(
                CoreError::Forbidden("you are not allowed to list time entries of other users".to_string()),
            ),
            Some(user_id) => Ok(user_id),
            None => Ok(caller.user_id),
        }
    }

    async fn prepare_new(&self, input: TimeEntryInput, caller: &Caller) -> CoreResult<NewTimeEntry> {
        let entry = NewTimeEntry::from_input(input, caller.user_id, self.clock.now());
        entry.validate()?;
        self.ensure_bookable(entry.project_id, caller).await?;
        Ok(entry)
    }

    async fn prepare_update(
        &self,
        id: EntityId,
        input: TimeEntryInput,
        caller: &Caller,
    ) -> CoreResult<TimeEntryUpdate> {
        let existing = self.load_authorized(id, caller, TimeEntryAction::Update).await?;
        self.ensure_bookable(input.project_id, caller).await?;
        Ok(TimeEntryUpdate {
            id,
            project_id: input.project_id,
            start_time: input.start_time.unwrap_or(existing.start_time),
            end_time: input.end_time,
            description: input.description,
        })
    }

    /// Record a new entry for the caller. A missing start time means now.
    pub async fn create(&self, input: TimeEntryInput, caller: &Caller) -> CoreResult<TimeEntry> {
        let entry = self.prepare_new(input, caller).await?;
        let entry = self.entries.insert(&entry).await?;
        tracing::info!(
            entry_id = %entry.id,
            project_id = %entry.project_id,
            user_id = %caller.user_id,
            "Time entry created"
        );
        Ok(entry)
    }

    /// All-or-nothing variant of [`TimeEntryService::create`].
    pub async fn create_many(
        &self,
        inputs: Vec<TimeEntryInput>,
        caller: &Caller,
    ) -> CoreResult<Vec<TimeEntry>> {
        let mut prepared = Vec::with_capacity(inputs.len());
        for input in inputs {
            prepared.push(self.prepare_new(input, caller).await?);
        }
        let created = self.entries.insert_many(&prepared).await?;
        tracing::info!(count = created.len(), user_id = %caller.user_id, "Time entries created");
        Ok(created)
    }

    pub async fn read(&self, id: EntityId, caller: &Caller) -> CoreResult<TimeEntry> {
        self.load_authorized(id, caller, TimeEntryAction::Read).await
    }

    /// Live entries of `user_id` (default: the caller), newest first.
    pub async fn list_for_user(
        &self,
        caller: &Caller,
        user_id: Option<EntityId>,
    ) -> CoreResult<Vec<TimeEntry>> {
        let user_id = Self::target_user(caller, user_id)?;
        self.entries.list_for_user(user_id).await
    }

    pub async fn list_for_user_and_project(
        &self,
        caller: &Caller,
        user_id: Option<EntityId>,
        project_id: EntityId,
    ) -> CoreResult<Vec<TimeEntry>> {
        let user_id = Self::target_user(caller, user_id)?;
        self.entries
            .list_for_user_and_project(user_id, project_id)
            .await
    }

    /// Overwrite an entry. A missing start time keeps the stored one.
    pub async fn update(
        &self,
        id: EntityId,
        input: TimeEntryInput,
        caller: &Caller,
    ) -> CoreResult<TimeEntry> {
        let update = self.prepare_update(id, input, caller).await?;
        let entry = self.entries.update(&update).await?;
        tracing::info!(entry_id = %id, user_id = %caller.user_id, "Time entry updated");
        Ok(entry)
    }

    /// All-or-nothing variant of [`TimeEntryService::update`].
    pub async fn update_many(
        &self,
        changes: Vec<(EntityId, TimeEntryInput)>,
        caller: &Caller,
    ) -> CoreResult<Vec<TimeEntry>> {
        let mut prepared = Vec::with_capacity(changes.len());
        for (id, input) in changes {
            prepared.push(self.prepare_update(id, input, caller).await?);
        }
        let updated = self.entries.update_many(&prepared).await?;
        tracing::info!(count = updated.len(), user_id = %caller.user_id, "Time entries updated");
        Ok(updated)
    }

    /// Soft-delete: the row stays so the sync feed can report it.
    pub async fn delete(&self, id: EntityId, caller: &Caller) -> CoreResult<()> {
        self.load_authorized(id, caller, TimeEntryAction::Delete).await?;
        self.entries.soft_delete(id).await?;
        tracing::info!(entry_id = %id, user_id = %caller.user_id, "Time entry deleted");
        Ok(())
    }
}
