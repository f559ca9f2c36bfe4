//! Repository for the `time_entries` table.

use sqlx::PgExecutor;
use timeasy_core::models::{NewTimeEntry, TimeEntryUpdate};
use timeasy_core::types::{EntityId, Timestamp};

use crate::models::TimeEntryRow;

const COLUMNS: &str = "id, owner_user_id, project_id, start_time, end_time, description, \
                       created_at, updated_at, deleted_at";

/// Running entries (no end time) sort after finished ones with the same start.
const ORDER: &str = "ORDER BY start_time DESC, end_time DESC NULLS LAST, id ASC";

pub struct TimeEntryRepo;

impl TimeEntryRepo {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewTimeEntry,
        now: Timestamp,
    ) -> Result<TimeEntryRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO time_entries
                (id, owner_user_id, project_id, start_time, end_time, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimeEntryRow>(&query)
            .bind(input.id)
            .bind(input.owner_user_id)
            .bind(input.project_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.description)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Insert, or overwrite an existing row and revive it. The owner of an
    /// existing row is kept.
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewTimeEntry,
        now: Timestamp,
    ) -> Result<TimeEntryRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO time_entries
                (id, owner_user_id, project_id, start_time, end_time, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             ON CONFLICT (id) DO UPDATE SET
                project_id = EXCLUDED.project_id,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                description = EXCLUDED.description,
                updated_at = EXCLUDED.updated_at,
                deleted_at = NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimeEntryRow>(&query)
            .bind(input.id)
            .bind(input.owner_user_id)
            .bind(input.project_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.description)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Find a live entry by id.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
    ) -> Result<Option<TimeEntryRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM time_entries WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, TimeEntryRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_id_include_deleted<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
    ) -> Result<Option<TimeEntryRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM time_entries WHERE id = $1");
        sqlx::query_as::<_, TimeEntryRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Live entries of a user, newest first.
    pub async fn list_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: EntityId,
    ) -> Result<Vec<TimeEntryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM time_entries
             WHERE owner_user_id = $1 AND deleted_at IS NULL
             {ORDER}"
        );
        sqlx::query_as::<_, TimeEntryRow>(&query)
            .bind(user_id)
            .fetch_all(executor)
            .await
    }

    pub async fn list_for_user_and_project<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: EntityId,
        project_id: EntityId,
    ) -> Result<Vec<TimeEntryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM time_entries
             WHERE owner_user_id = $1 AND project_id = $2 AND deleted_at IS NULL
             {ORDER}"
        );
        sqlx::query_as::<_, TimeEntryRow>(&query)
            .bind(user_id)
            .bind(project_id)
            .fetch_all(executor)
            .await
    }

    /// Overwrite the mutable fields of a live entry. Returns `None` if no
    /// such row exists.
    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &TimeEntryUpdate,
        now: Timestamp,
    ) -> Result<Option<TimeEntryRow>, sqlx::Error> {
        let query = format!(
            "UPDATE time_entries SET
                project_id = $2,
                start_time = $3,
                end_time = $4,
                description = $5,
                updated_at = $6
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimeEntryRow>(&query)
            .bind(input.id)
            .bind(input.project_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.description)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    /// Soft-delete an entry. Returns `true` if a row was marked deleted.
    pub async fn soft_delete<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE time_entries SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete every live entry booked on a project.
    pub async fn soft_delete_for_project<'e, E: PgExecutor<'e>>(
        executor: E,
        project_id: EntityId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE time_entries SET deleted_at = $2 WHERE project_id = $1 AND deleted_at IS NULL",
        )
        .bind(project_id)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Entries (deleted ones included) last touched after `since`, limited to
    /// one owner when given.
    pub async fn changed_since<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_user_id: Option<EntityId>,
        since: Timestamp,
    ) -> Result<Vec<TimeEntryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM time_entries
             WHERE GREATEST(created_at, updated_at, deleted_at) > $2
               AND ($1::uuid IS NULL OR owner_user_id = $1)"
        );
        sqlx::query_as::<_, TimeEntryRow>(&query)
            .bind(owner_user_id)
            .bind(since)
            .fetch_all(executor)
            .await
    }
}
