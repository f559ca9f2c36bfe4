use sqlx::FromRow;
use timeasy_core::models::Team;
use timeasy_core::types::{EntityId, Timestamp};

/// A row from the `teams` table.
#[derive(Debug, Clone, FromRow)]
pub struct TeamRow {
    pub id: EntityId,
    pub name1: String,
    pub name2: String,
    pub name3: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            id: row.id,
            name1: row.name1,
            name2: row.name2,
            name3: row.name3,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}
