use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::entities::UserEntity;

/// `app_user` access. Every query takes any Postgres executor so the same
/// call works on the pool and inside a transaction.
pub struct UserRepository;

impl UserRepository {
    pub async fn exists<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM app_user WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, password_hash, display_name, avatar_url,
                   tg_user_id, is_chat_member, created_at, updated_at
            FROM app_user
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_username<'e, E>(
        executor: E,
        username: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, password_hash, display_name, avatar_url,
                   tg_user_id, is_chat_member, created_at, updated_at
            FROM app_user
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(executor)
        .await
    }

    pub async fn create_with_password<'e, E>(
        executor: E,
        username: &str,
        password_hash: &str,
        display_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<UserEntity, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO app_user (username, password_hash, display_name, avatar_url, is_chat_member)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id, username, password_hash, display_name, avatar_url,
                      tg_user_id, is_chat_member, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(display_name)
        .bind(avatar_url)
        .fetch_one(executor)
        .await
    }

    /// Creates the account for a Telegram id on first sight, otherwise refreshes
    /// what Telegram tells us about it. `username` only applies to a new row.
    /// Concurrent first logins for one id settle on a single row.
    pub async fn upsert_from_telegram<'e, E>(
        executor: E,
        username: &str,
        display_name: &str,
        avatar_url: Option<&str>,
        tg_user_id: i64,
    ) -> Result<UserEntity, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO app_user (username, display_name, avatar_url, tg_user_id, is_chat_member)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (tg_user_id)
            DO UPDATE SET display_name = EXCLUDED.display_name,
                          avatar_url = EXCLUDED.avatar_url,
                          is_chat_member = TRUE,
                          updated_at = NOW()
            RETURNING id, username, password_hash, display_name, avatar_url,
                      tg_user_id, is_chat_member, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(display_name)
        .bind(avatar_url)
        .bind(tg_user_id)
        .fetch_one(executor)
        .await
    }
}
