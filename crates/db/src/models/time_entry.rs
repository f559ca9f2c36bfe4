use sqlx::FromRow;
use timeasy_core::models::TimeEntry;
use timeasy_core::types::{EntityId, Timestamp};

/// A row from the `time_entries` table.
#[derive(Debug, Clone, FromRow)]
pub struct TimeEntryRow {
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

impl From<TimeEntryRow> for TimeEntry {
    fn from(row: TimeEntryRow) -> Self {
        TimeEntry {
            id: row.id,
            owner_user_id: row.owner_user_id,
            project_id: row.project_id,
            start_time: row.start_time,
            end_time: row.end_time,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}
