//! Repository for the `teams` table.

use sqlx::PgExecutor;
use timeasy_core::models::{NewTeam, TeamNames};
use timeasy_core::types::{EntityId, Timestamp};

use crate::models::TeamRow;

const COLUMNS: &str = "id, name1, name2, name3, created_at, updated_at, deleted_at";

pub struct TeamRepo;

impl TeamRepo {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewTeam,
        now: Timestamp,
    ) -> Result<TeamRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO teams (id, name1, name2, name3, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TeamRow>(&query)
            .bind(input.id)
            .bind(&input.names.name1)
            .bind(&input.names.name2)
            .bind(&input.names.name3)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Find a live team by id.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
    ) -> Result<Option<TeamRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM teams WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, TeamRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<TeamRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM teams WHERE deleted_at IS NULL ORDER BY name1 COLLATE \"C\" ASC, id ASC"
        );
        sqlx::query_as::<_, TeamRow>(&query).fetch_all(executor).await
    }

    /// Live teams in which `user_id` holds a membership.
    pub async fn list_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: EntityId,
    ) -> Result<Vec<TeamRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM teams
             WHERE deleted_at IS NULL
               AND id IN (SELECT team_id FROM team_memberships WHERE user_id = $1)
             ORDER BY name1 COLLATE \"C\" ASC, id ASC"
        );
        sqlx::query_as::<_, TeamRow>(&query)
            .bind(user_id)
            .fetch_all(executor)
            .await
    }

    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
        names: &TeamNames,
        now: Timestamp,
    ) -> Result<Option<TeamRow>, sqlx::Error> {
        let query = format!(
            "UPDATE teams SET name1 = $2, name2 = $3, name3 = $4, updated_at = $5
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TeamRow>(&query)
            .bind(id)
            .bind(&names.name1)
            .bind(&names.name2)
            .bind(&names.name3)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    pub async fn soft_delete<'e, E: PgExecutor<'e>>(
        executor: E,
        id: EntityId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE teams SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .bind(now)
                .execute(executor)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
