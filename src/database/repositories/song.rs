use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::database::entities::SongFields;

pub struct SongRepository;

impl SongRepository {
    /// `None` when the song does not exist, `Some(None)` when its creator is gone.
    pub async fn owner<'e, E>(executor: E, song_id: Uuid) -> Result<Option<Option<Uuid>>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT created_by FROM song WHERE id = $1")
            .bind(song_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn create<'e, E>(
        executor: E,
        fields: &SongFields,
        created_by: Uuid,
    ) -> Result<Uuid, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            INSERT INTO song (title, artist, description, link_kind, link_url, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.artist)
        .bind(&fields.description)
        .bind(fields.link_kind)
        .bind(&fields.link_url)
        .bind(created_by)
        .fetch_one(executor)
        .await
    }

    pub async fn update<'e, E>(executor: E, song_id: Uuid, fields: &SongFields) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE song
            SET title = $1, artist = $2, description = $3,
                link_kind = $4, link_url = $5, updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.artist)
        .bind(&fields.description)
        .bind(fields.link_kind)
        .bind(&fields.link_url)
        .bind(song_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E>(executor: E, song_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM song WHERE id = $1")
            .bind(song_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Replaces the offered roles. Assignments to roles no longer offered go too.
    pub async fn replace_roles(
        conn: &mut PgConnection,
        song_id: Uuid,
        roles: &[String],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM song_role WHERE song_id = $1")
            .bind(song_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO song_role (song_id, role)
            SELECT $1, UNNEST($2::TEXT[])
            "#,
        )
        .bind(song_id)
        .bind(roles)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM song_role_assignment
            WHERE song_id = $1 AND NOT (role = ANY($2::TEXT[]))
            "#,
        )
        .bind(song_id)
        .bind(roles)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn has_role<'e, E>(executor: E, song_id: Uuid, role: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM song_role WHERE song_id = $1 AND role = $2)")
            .bind(song_id)
            .bind(role)
            .fetch_one(executor)
            .await
    }

    /// Joining a role already held is a no-op.
    pub async fn join_role<'e, E>(
        executor: E,
        song_id: Uuid,
        role: &str,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO song_role_assignment (song_id, role, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(song_id)
        .bind(role)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn leave_role<'e, E>(
        executor: E,
        song_id: Uuid,
        role: &str,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "DELETE FROM song_role_assignment WHERE song_id = $1 AND role = $2 AND user_id = $3",
        )
        .bind(song_id)
        .bind(role)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
