//! Team entity.

use uuid::Uuid;

use crate::error::CoreResult;
use crate::types::{EntityId, Timestamp};
use crate::validation::require_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: EntityId,
    pub name1: String,
    pub name2: String,
    pub name3: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Team {
    pub fn names(&self) -> TeamNames {
        TeamNames {
            name1: self.name1.clone(),
            name2: self.name2.clone(),
            name3: self.name3.clone(),
        }
    }
}

/// The three name lines of a team. Only the first is mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamNames {
    pub name1: String,
    pub name2: String,
    pub name3: String,
}

impl TeamNames {
    pub fn new(name1: impl Into<String>) -> Self {
        Self {
            name1: name1.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        require_name("team name1", &self.name1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    pub id: EntityId,
    pub names: TeamNames,
}

impl NewTeam {
    pub fn new(names: TeamNames) -> Self {
        Self {
            id: Uuid::new_v4(),
            names,
        }
    }
}
