use sqlx::PgExecutor;
use uuid::Uuid;

use crate::permissions::{PermissionRow, PermissionSet};

pub struct PermissionRepository;

impl PermissionRepository {
    /// A missing row is not an error: it means no permissions at all.
    pub async fn load<'e, E>(executor: E, user_id: Uuid) -> Result<PermissionSet, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT edit_own_participation, edit_any_participation,
                   edit_own_songs, edit_any_songs,
                   edit_events, edit_tracklists
            FROM user_permissions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(PermissionSet::from).unwrap_or_default())
    }

    /// Keeps an existing row untouched.
    pub async fn insert<'e, E>(
        executor: E,
        user_id: Uuid,
        permissions: &PermissionSet,
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, edit_own_participation, edit_any_participation,
                                          edit_own_songs, edit_any_songs, edit_events, edit_tracklists)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(permissions.join.edit_own_participation)
        .bind(permissions.join.edit_any_participation)
        .bind(permissions.songs.edit_own_songs)
        .bind(permissions.songs.edit_any_songs)
        .bind(permissions.events.edit_events)
        .bind(permissions.events.edit_tracklists)
        .execute(executor)
        .await?;

        Ok(())
    }
}
