//! Change-feed classification and inbound batch types for client sync.
//!
//! The feed answers "what must a client that last synced at `since` apply
//! now?". Rows come from storage unclassified; [`change_feed`] labels each
//! one from its stored timestamps and orders the result causally.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::models::{NewProject, NewTimeEntry, Project, TimeEntry};
use crate::types::{EntityId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    New,
    Changed,
    Deleted,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::New => "NEW",
            ChangeType::Changed => "CHANGED",
            ChangeType::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(ChangeType::New),
            "CHANGED" => Ok(ChangeType::Changed),
            "DELETED" => Ok(ChangeType::Deleted),
            other => Err(CoreError::Incomplete(format!("unknown change type '{other}'"))),
        }
    }
}

/// Accepts any letter case on input, like [`FromStr`].
impl<'de> Deserialize<'de> for ChangeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Rows carrying the three storage stamps the feed is derived from.
pub trait Tracked {
    fn id(&self) -> EntityId;
    fn created_at(&self) -> Timestamp;
    fn updated_at(&self) -> Timestamp;
    fn deleted_at(&self) -> Option<Timestamp>;

    /// `greatest(created_at, updated_at, deleted_at)`.
    fn last_touched(&self) -> Timestamp {
        let stamp = self.created_at().max(self.updated_at());
        self.deleted_at().map_or(stamp, |deleted| stamp.max(deleted))
    }
}

macro_rules! impl_tracked {
    ($ty:ty) => {
        impl Tracked for $ty {
            fn id(&self) -> EntityId {
                self.id
            }
            fn created_at(&self) -> Timestamp {
                self.created_at
            }
            fn updated_at(&self) -> Timestamp {
                self.updated_at
            }
            fn deleted_at(&self) -> Option<Timestamp> {
                self.deleted_at
            }
        }
    };
}

impl_tracked!(Project);
impl_tracked!(TimeEntry);

/// Label a row and pick the instant the label refers to. Deletion wins over
/// everything else.
pub fn classify<T: Tracked>(row: &T) -> (ChangeType, Timestamp) {
    if let Some(deleted_at) = row.deleted_at() {
        (ChangeType::Deleted, deleted_at)
    } else if row.created_at() == row.updated_at() {
        (ChangeType::New, row.created_at())
    } else {
        (ChangeType::Changed, row.updated_at())
    }
}

/// One element of the change feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<T> {
    pub item: T,
    pub change_type: ChangeType,
    pub change_timestamp: Timestamp,
}

impl<T: Tracked> Change<T> {
    pub fn of(item: T) -> Self {
        let (change_type, change_timestamp) = classify(&item);
        Self {
            item,
            change_type,
            change_timestamp,
        }
    }
}

/// Build the feed: rows touched after `since`, classified, ordered by
/// `(change_timestamp, id)` ascending.
///
/// Rows not touched after `since` are dropped here even if the adapter
/// already filtered them.
pub fn change_feed<T, I>(rows: I, since: Timestamp) -> Vec<Change<T>>
where
    T: Tracked,
    I: IntoIterator<Item = T>,
{
    let mut feed: Vec<Change<T>> = rows
        .into_iter()
        .filter(|row| row.last_touched() > since)
        .map(Change::of)
        .collect();
    feed.sort_by(|a, b| {
        a.change_timestamp
            .cmp(&b.change_timestamp)
            .then_with(|| a.item.id().cmp(&b.item.id()))
    });
    feed
}

/// Both feeds a client pulls in one round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub projects: Vec<Change<Project>>,
    pub time_entries: Vec<Change<TimeEntry>>,
}

// ---------------------------------------------------------------------------
// Inbound batch
// ---------------------------------------------------------------------------

/// A project as last seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectUpsert {
    pub id: EntityId,
    pub name: String,
    pub team_id: Option<EntityId>,
}

/// A time entry as last seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntryUpsert {
    pub id: EntityId,
    pub project_id: EntityId,
    pub description: String,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
}

/// Local changes a client pushes. Applied all-or-nothing in the order
/// project upserts, project deletes, entry upserts, entry deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncBatch {
    pub projects_to_upsert: Vec<ProjectUpsert>,
    pub projects_to_delete: Vec<EntityId>,
    pub entries_to_upsert: Vec<TimeEntryUpsert>,
    pub entries_to_delete: Vec<EntityId>,
}

impl SyncBatch {
    pub fn is_empty(&self) -> bool {
        self.projects_to_upsert.is_empty()
            && self.projects_to_delete.is_empty()
            && self.entries_to_upsert.is_empty()
            && self.entries_to_delete.is_empty()
    }
}

/// A batch after validation and authorisation, ready for storage.
///
/// Upserts carry the full row contents (existing owners preserved); deletes
/// only name rows that are currently live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub projects_to_upsert: Vec<NewProject>,
    pub projects_to_delete: Vec<EntityId>,
    pub entries_to_upsert: Vec<NewTimeEntry>,
    pub entries_to_delete: Vec<EntityId>,
}

/// What an applied batch changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub projects_upserted: usize,
    pub projects_deleted: usize,
    pub time_entries_upserted: usize,
    pub time_entries_deleted: usize,
}

impl From<&BatchPlan> for SyncSummary {
    fn from(plan: &BatchPlan) -> Self {
        Self {
            projects_upserted: plan.projects_to_upsert.len(),
            projects_deleted: plan.projects_to_delete.len(),
            time_entries_upserted: plan.entries_to_upsert.len(),
            time_entries_deleted: plan.entries_to_delete.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn at(day: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2023, 8, day, 0, 0, 0).unwrap()
    }

    fn entry(created: Timestamp, updated: Timestamp, deleted: Option<Timestamp>) -> TimeEntry {
        TimeEntry {
            id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            start_time: created,
            end_time: None,
            description: String::new(),
            created_at: created,
            updated_at: updated,
            deleted_at: deleted,
        }
    }

    #[test]
    fn classification_uses_stored_stamps() {
        assert_eq!(classify(&entry(at(1), at(1), None)), (ChangeType::New, at(1)));
        assert_eq!(classify(&entry(at(1), at(2), None)), (ChangeType::Changed, at(2)));
        assert_eq!(
            classify(&entry(at(1), at(1), Some(at(3)))),
            (ChangeType::Deleted, at(3))
        );
    }

    #[test]
    fn deletion_takes_precedence_even_if_updated_later() {
        let row = entry(at(1), at(5), Some(at(3)));
        assert_eq!(classify(&row), (ChangeType::Deleted, at(3)));
        assert_eq!(row.last_touched(), at(5));
    }

    #[test]
    fn feed_is_filtered_and_ordered() {
        let deleted = entry(at(1), at(1), Some(at(3)));
        let changed = entry(at(1), at(2), None);
        let new = entry(at(1), at(1), None);
        let stale = entry(at(1) - Duration::days(10), at(1) - Duration::days(10), None);

        let feed = change_feed(
            vec![deleted.clone(), stale, changed.clone(), new.clone()],
            at(1) - Duration::days(1),
        );

        let labels: Vec<_> = feed
            .iter()
            .map(|c| (c.item.id, c.change_type, c.change_timestamp))
            .collect();
        assert_eq!(
            labels,
            vec![
                (new.id, ChangeType::New, at(1)),
                (changed.id, ChangeType::Changed, at(2)),
                (deleted.id, ChangeType::Deleted, at(3)),
            ]
        );
    }

    #[test]
    fn cursor_is_exclusive() {
        let row = entry(at(1), at(1), None);
        assert!(change_feed(vec![row.clone()], at(1)).is_empty());
        assert_eq!(change_feed(vec![row], at(1) - Duration::seconds(1)).len(), 1);
    }

    #[test]
    fn ties_are_broken_by_id() {
        let mut a = entry(at(1), at(1), None);
        let mut b = entry(at(1), at(1), None);
        a.id = Uuid::from_u128(2);
        b.id = Uuid::from_u128(1);
        let feed = change_feed(vec![a, b], at(1) - Duration::days(1));
        assert_eq!(feed[0].item.id, Uuid::from_u128(1));
        assert_eq!(feed[1].item.id, Uuid::from_u128(2));
    }

    #[test]
    fn change_type_parses_case_insensitively() {
        assert_eq!("deleted".parse::<ChangeType>().unwrap(), ChangeType::Deleted);
        assert_eq!(" Changed ".parse::<ChangeType>().unwrap(), ChangeType::Changed);
        assert!("MOVED".parse::<ChangeType>().is_err());
        assert_eq!(serde_json::to_string(&ChangeType::New).unwrap(), "\"NEW\"");
    }
}
