//! TimeEntry entity.

use uuid::Uuid;

use crate::error::CoreResult;
use crate::types::{EntityId, Timestamp};
use crate::validation::require_id;

/// A recorded interval against a project. `end_time == None` means the entry
/// is still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: EntityId,
    pub owner_user_id: EntityId,
    pub project_id: EntityId,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl TimeEntry {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: EntityId) -> bool {
        self.owner_user_id == user_id
    }
}

/// Caller-supplied fields of a time entry. A missing `start_time` is
/// replaced by the current instant on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntryInput {
    pub project_id: EntityId,
    pub description: String,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
}

/// Row contents for inserting (or, during sync, upserting) a time entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeEntry {
    pub id: EntityId,
    pub owner_user_id: EntityId,
    pub project_id: EntityId,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub description: String,
}

impl NewTimeEntry {
    pub fn from_input(input: TimeEntryInput, owner_user_id: EntityId, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_user_id,
            project_id: input.project_id,
            start_time: input.start_time.unwrap_or(now),
            end_time: input.end_time,
            description: input.description,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        require_id("time entry id", self.id)?;
        require_id("owner user id", self.owner_user_id)?;
        require_id("project id", self.project_id)
    }
}

/// Mutable fields of an existing time entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntryUpdate {
    pub id: EntityId,
    pub project_id: EntityId,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub description: String,
}
