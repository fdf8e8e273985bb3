use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::Config;

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

/// Identity asserted by a Telegram Mini App `initData` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl TelegramUser {
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("malformed init data: {0}")]
    MalformedInitData(#[from] serde_urlencoded::de::Error),
    #[error("missing hash")]
    MissingHash,
    #[error("hash verification failed")]
    HashMismatch,
    #[error("missing user data")]
    MissingUser,
    #[error("malformed user data: {0}")]
    MalformedUser(#[source] serde_json::Error),
    #[error("bot api call failed: {0}")]
    BotApi(#[source] reqwest::Error),
}

impl TelegramError {
    /// The request URL carries the bot token, so it never makes it into the error.
    fn bot_api(err: reqwest::Error) -> Self {
        Self::BotApi(err.without_url())
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC takes keys of any size");
    mac.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Pairs other than `hash`, rendered as `key=value`, sorted and joined by `\n`.
pub fn data_check_string(pairs: &[(String, String)]) -> String {
    let mut lines: Vec<String> = pairs
        .iter()
        .filter(|(key, _)| key != "hash")
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    lines.sort();
    lines.join("\n")
}

/// Hex HMAC of the data-check-string under the key derived from the bot token.
pub fn sign_data_check_string(data_check_string: &str, bot_token: &str) -> String {
    let secret_key = hmac_sha256(WEB_APP_DATA_KEY, bot_token.as_bytes());
    hex::encode(hmac_sha256(&secret_key, data_check_string.as_bytes()))
}

/// Checks that `init_data` was signed for this bot and returns the user it
/// describes.
pub fn verify_init_data(init_data: &str, bot_token: &str) -> Result<TelegramUser, TelegramError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(init_data)?;

    let received_hash = pairs
        .iter()
        .find(|(key, _)| key == "hash")
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
        .ok_or(TelegramError::MissingHash)?;

    let expected_hash = sign_data_check_string(&data_check_string(&pairs), bot_token);
    if expected_hash != received_hash {
        return Err(TelegramError::HashMismatch);
    }

    let user_json = pairs
        .iter()
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.as_str())
        .filter(|value| !value.is_empty())
        .ok_or(TelegramError::MissingUser)?;

    serde_json::from_str(user_json).map_err(TelegramError::MalformedUser)
}

pub fn is_member_status(status: &str) -> bool {
    matches!(status, "creator" | "administrator" | "member")
}

/// Answers whether a Telegram user belongs to the club chat.
#[async_trait]
pub trait ChatMembership: Send + Sync {
    async fn is_member(&self, telegram_user_id: i64) -> Result<bool, TelegramError>;
}

#[derive(Debug, Deserialize)]
struct ChatMemberResponse {
    ok: bool,
    #[serde(default)]
    result: Option<ChatMember>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
}

/// `getChatMember` against the Bot API.
#[derive(Clone)]
pub struct BotApiMembership {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl BotApiMembership {
    pub fn new(config: &Config) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_url: config.telegram_api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }
}

#[async_trait]
impl ChatMembership for BotApiMembership {
    async fn is_member(&self, telegram_user_id: i64) -> Result<bool, TelegramError> {
        tracing::debug!(
            "Checking chat membership: user={}, chat={}",
            telegram_user_id,
            self.chat_id
        );

        let url = format!("{}/bot{}/getChatMember", self.api_url, self.bot_token);
        let user_id = telegram_user_id.to_string();
        let response: ChatMemberResponse = self
            .client
            .get(url)
            .query(&[("chat_id", self.chat_id.as_str()), ("user_id", user_id.as_str())])
            .send()
            .await
            .map_err(TelegramError::bot_api)?
            .json()
            .await
            .map_err(TelegramError::bot_api)?;

        if !response.ok {
            tracing::warn!(
                "getChatMember returned ok=false for user {} in chat {}",
                telegram_user_id,
                self.chat_id
            );
            return Ok(false);
        }

        let status = response.result.map(|m| m.status).unwrap_or_default();
        let is_member = is_member_status(&status);
        tracing::debug!(
            "User {} status in chat {}: {} (member={})",
            telegram_user_id,
            self.chat_id,
            status,
            is_member
        );
        Ok(is_member)
    }
}

/// Used when membership checking is switched off; everyone counts as a member.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeMember;

#[async_trait]
impl ChatMembership for AssumeMember {
    async fn is_member(&self, _telegram_user_id: i64) -> Result<bool, TelegramError> {
        Ok(true)
    }
}

pub fn membership_from_config(config: &Config) -> std::sync::Arc<dyn ChatMembership> {
    if config.skip_chat_membership_check {
        tracing::warn!("Chat membership check is disabled; every Telegram user counts as a member");
        std::sync::Arc::new(AssumeMember)
    } else {
        std::sync::Arc::new(BotApiMembership::new(config))
    }
}
