//! Repository for the `projects` table.

use sqlx::PgExecutor;
use timeasy_core::models::NewProject;
use timeasy_core::types::{EntityId, Timestamp};

use crate::models::ProjectRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, owner_user_id, team_id, created_at, updated_at, deleted_at";

/// Visibility predicate for a user bound as `$1`: owned or shared through a
/// team membership.
const VISIBLE_TO_USER: &str = "(owner_user_id = $1 \
     OR team_id IN (SELECT team_id FROM team_memberships WHERE user_id = $1))";

pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project stamped with `now`.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewProject,
        now: Timestamp,
    ) -> Result<ProjectRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (id, name, owner_user_id, team_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(input.owner_user_id)
            .bind(input.team_id)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Insert, or overwrite name and team of an existing row and revive it.
    /// The owner of an existing row is kept.
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewProject,
        now: Timestamp,
    ) -> Result<ProjectRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (id, name, owner_user_id, team_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                team_id = EXCLUDED.team_id,
                updated_at = EXCLUDED.updated_at,
                deleted_at = NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(input.id)
            .bind(&input.name)
            .bind(input.owner_user_id)
            .bind(input.team_id)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Find a project by id. Excludes soft-deleted rows.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a project by id, including soft-deleted rows.
    pub async fn find_by_id_include_deleted<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List all live projects ordered by name.
    pub async fn list<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE deleted_at IS NULL ORDER BY name COLLATE \"C\" ASC, id ASC"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .fetch_all(executor)
            .await
    }

    /// List live projects owned by `user_id` or shared with one of their teams.
    pub async fn list_visible_to<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: EntityId,
    ) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE deleted_at IS NULL AND {VISIBLE_TO_USER}
             ORDER BY name COLLATE \"C\" ASC, id ASC"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(user_id)
            .fetch_all(executor)
            .await
    }

    /// Rename a live project. Returns `None` if no such row exists.
    pub async fn update_name<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
        name: &str,
        now: Timestamp,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET name = $2, updated_at = $3
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .bind(name)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    /// Set or clear the team of a live project.
    pub async fn set_team<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
        team_id: Option<EntityId>,
        now: Timestamp,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET team_id = $2, updated_at = $3
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .bind(team_id)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    /// Clear the team of every project shared with `team_id`. Returns the
    /// number of projects detached.
    pub async fn detach_team<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: EntityId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE projects SET team_id = NULL, updated_at = $2 WHERE team_id = $1")
                .bind(team_id)
                .bind(now)
                .execute(executor)
                .await?;
        Ok(result.rows_affected())
    }

    /// Soft-delete a project by id. Returns `true` if a row was marked deleted.
    pub async fn soft_delete<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Projects (deleted ones included) last touched after `since`, limited to
    /// those visible to `user_id` when given.
    pub async fn changed_since<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: Option<EntityId>,
        since: Timestamp,
    ) -> Result<Vec<ProjectRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE GREATEST(created_at, updated_at, deleted_at) > $2
               AND ($1::uuid IS NULL OR {VISIBLE_TO_USER})"
        );
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(user_id)
            .bind(since)
            .fetch_all(executor)
            .await
    }
}
