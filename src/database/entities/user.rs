use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub username: String,
    pub password_hash: Option<String>, // None for Telegram-only accounts
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub tg_user_id: Option<i64>,
    pub is_chat_member: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
