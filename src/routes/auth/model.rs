use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::TokenPair, database::UserEntity, permissions::PermissionSet};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct TelegramAuthRequest {
    #[serde(default)]
    pub init_data: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub tg_user_id: Option<i64>,
}

impl From<&UserEntity> for Profile {
    fn from(user: &UserEntity) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            tg_user_id: user.tg_user_id,
        }
    }
}

/// Returned by every sign-in method.
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    pub tokens: TokenPair,
    pub issued_at: i64,  // epoch seconds
    pub expires_at: i64, // access token expiry, epoch seconds
    pub is_chat_member: bool,
    pub join_request_url: String,
    pub profile: Profile,
    pub permissions: PermissionSet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub profile: Profile,
    pub is_chat_member: bool,
    pub permissions: PermissionSet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TgLoginLinkResponse {
    pub link: String,
}
