use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

pub struct RefreshTokenRepository;

impl RefreshTokenRepository {
    pub async fn insert<'e, E>(
        executor: E,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token, expires_at)
            VALUES (gen_random_uuid(), $1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Drops every refresh token the user holds, signing out other devices.
    pub async fn revoke_all_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes the token if it is still valid at `now` and returns its owner.
    /// Of two concurrent calls with the same token only one gets `Some`.
    pub async fn consume<'e, E>(
        executor: E,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            DELETE FROM refresh_tokens
            WHERE token = $1 AND expires_at > $2
            RETURNING user_id
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(executor)
        .await
    }
}
