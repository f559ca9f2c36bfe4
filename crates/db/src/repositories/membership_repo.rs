//! Repository for the `team_memberships` table.

use sqlx::PgExecutor;
use timeasy_core::roles::RoleSet;
use timeasy_core::types::{EntityId, Timestamp};

use crate::models::MembershipRow;

const COLUMNS: &str = "user_id, team_id, roles, created_at, updated_at";

pub struct MembershipRepo;

impl MembershipRepo {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: EntityId,
        user_id: EntityId,
        roles: &RoleSet,
        now: Timestamp,
    ) -> Result<MembershipRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO team_memberships (user_id, team_id, roles, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MembershipRow>(&query)
            .bind(user_id)
            .bind(team_id)
            .bind(roles.to_column())
            .bind(now)
            .fetch_one(executor)
            .await
    }

    pub async fn find<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: EntityId,
        user_id: EntityId,
    ) -> Result<Option<MembershipRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM team_memberships WHERE team_id = $1 AND user_id = $2");
        sqlx::query_as::<_, MembershipRow>(&query)
            .bind(team_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Members of a team in joining order.
    pub async fn list_for_team<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: EntityId,
    ) -> Result<Vec<MembershipRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM team_memberships
             WHERE team_id = $1
             ORDER BY created_at ASC, user_id ASC"
        );
        sqlx::query_as::<_, MembershipRow>(&query)
            .bind(team_id)
            .fetch_all(executor)
            .await
    }

    pub async fn set_roles<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: EntityId,
        user_id: EntityId,
        roles: &RoleSet,
        now: Timestamp,
    ) -> Result<Option<MembershipRow>, sqlx::Error> {
        let query = format!(
            "UPDATE team_memberships SET roles = $3, updated_at = $4
             WHERE team_id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MembershipRow>(&query)
            .bind(team_id)
            .bind(user_id)
            .bind(roles.to_column())
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    /// Returns `true` if a row was removed.
    pub async fn delete<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: EntityId,
        user_id: EntityId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM team_memberships WHERE team_id = $1 AND user_id = $2")
                .bind(team_id)
                .bind(user_id)
                .execute(executor)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_team<'e, E: PgExecutor<'e>>(
        executor: E,
        team_id: EntityId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM team_memberships WHERE team_id = $1")
            .bind(team_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
