//! Project entity.

use uuid::Uuid;

use crate::error::CoreResult;
use crate::types::{EntityId, Timestamp};
use crate::validation::{require_id, require_name};

/// A unit of work owned by one user, optionally shared with a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    pub owner_user_id: EntityId,
    pub team_id: Option<EntityId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Project {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: EntityId) -> bool {
        self.owner_user_id == user_id
    }
}

/// Row contents for inserting (or, during sync, upserting) a project.
/// Lifecycle stamps are assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub id: EntityId,
    pub name: String,
    pub owner_user_id: EntityId,
    pub team_id: Option<EntityId>,
}

impl NewProject {
    /// A fresh project with a random id and no team.
    pub fn new(name: impl Into<String>, owner_user_id: EntityId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_user_id,
            team_id: None,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        require_id("project id", self.id)?;
        require_name("project name", &self.name)?;
        require_id("owner user id", self.owner_user_id)
    }
}
