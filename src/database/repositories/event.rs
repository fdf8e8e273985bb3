use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::database::entities::{EventFields, TrackSlot};

pub struct EventRepository;

impl EventRepository {
    pub async fn exists<'e, E>(executor: E, event_id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM event WHERE id = $1)")
            .bind(event_id)
            .fetch_one(executor)
            .await
    }

    pub async fn create<'e, E>(
        executor: E,
        fields: &EventFields,
        created_by: Uuid,
    ) -> Result<Uuid, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            INSERT INTO event (title, start_at, location, notify_day_before, notify_hour_before, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&fields.title)
        .bind(fields.start_at)
        .bind(&fields.location)
        .bind(fields.notify_day_before)
        .bind(fields.notify_hour_before)
        .bind(created_by)
        .fetch_one(executor)
        .await
    }

    pub async fn update<'e, E>(executor: E, event_id: Uuid, fields: &EventFields) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE event
            SET title = $1, start_at = $2, location = $3,
                notify_day_before = $4, notify_hour_before = $5, updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(&fields.title)
        .bind(fields.start_at)
        .bind(&fields.location)
        .bind(fields.notify_day_before)
        .bind(fields.notify_hour_before)
        .bind(event_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E>(executor: E, event_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM event WHERE id = $1")
            .bind(event_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Rewrites the whole tracklist. Run inside a transaction.
    pub async fn replace_tracklist(
        conn: &mut PgConnection,
        event_id: Uuid,
        slots: &[TrackSlot],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM event_track_item WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *conn)
            .await?;

        for slot in slots {
            sqlx::query(
                r#"
                INSERT INTO event_track_item (event_id, position, song_id, custom_title, custom_artist)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(event_id)
            .bind(slot.position)
            .bind(slot.song_id)
            .bind(slot.custom_title.as_deref())
            .bind(slot.custom_artist.as_deref())
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn join<'e, E>(
        executor: E,
        event_id: Uuid,
        role: &str,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO event_participant (event_id, role, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(role)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn leave<'e, E>(
        executor: E,
        event_id: Uuid,
        role: &str,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "DELETE FROM event_participant WHERE event_id = $1 AND role = $2 AND user_id = $3",
        )
        .bind(event_id)
        .bind(role)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
