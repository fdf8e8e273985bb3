use sqlx::PgExecutor;
use uuid::Uuid;

/// Pending "link my Telegram account" requests, one per user.
pub struct TgAuthSessionRepository;

impl TgAuthSessionRepository {
    pub async fn upsert_pending<'e, E>(
        executor: E,
        user_id: Uuid,
        token: &str,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO tg_auth_session (user_id, token, tg_user_id, success, created_at)
            VALUES ($1, $2, NULL, FALSE, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET token = EXCLUDED.token, tg_user_id = NULL,
                          success = FALSE, created_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(token)
        .execute(executor)
        .await?;

        Ok(())
    }
}
