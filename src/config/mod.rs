use std::env;
use std::time::Duration;

const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub bot_token: String,
    pub bot_username: String,
    pub chat_id: String,
    pub skip_chat_membership_check: bool,
    pub telegram_api_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            bot_token: env::var("BOT_TOKEN")?,
            bot_username: env::var("BOT_USERNAME")?,
            chat_id: env::var("CHAT_ID")?,
            skip_chat_membership_check: parse_flag(env::var("SKIP_CHAT_MEMBERSHIP_CHECK").ok()),
            telegram_api_url: env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| DEFAULT_TELEGRAM_API_URL.to_string()),
            rate_limit_window_secs: parse_or(env::var("RATE_LIMIT_WINDOW").ok(), 60),
            rate_limit_requests: parse_or(env::var("RATE_LIMIT_REQUESTS").ok(), 100),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "::".to_string()),
            server_port: parse_or(env::var("SERVER_PORT").ok(), 6969),
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// Deep link that sends a user to the bot to request chat membership.
    pub fn join_request_url(&self) -> String {
        format!("https://t.me/{}?start=join", self.bot_username)
    }

    pub fn tg_login_link(&self, login_token: &str) -> String {
        format!("https://t.me/{}?start=auth_{}", self.bot_username, login_token)
    }
}

fn parse_flag(value: Option<String>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, fallback: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/musicclub_test".into(),
        redis_url: "redis://127.0.0.1/".into(),
        jwt_secret: "test-secret".into(),
        bot_token: "123456:TEST-BOT-TOKEN".into(),
        bot_username: "musicclub_test_bot".into(),
        chat_id: "-1001234567890".into(),
        skip_chat_membership_check: false,
        telegram_api_url: DEFAULT_TELEGRAM_API_URL.into(),
        rate_limit_window_secs: 60,
        rate_limit_requests: 100,
        server_host: "127.0.0.1".into(),
        server_port: 6969,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_flag_only_accepts_true() {
        assert!(parse_flag(Some("true".into())));
        assert!(parse_flag(Some("TRUE ".into())));
        assert!(!parse_flag(Some("1".into())));
        assert!(!parse_flag(Some("false".into())));
        assert!(!parse_flag(None));
    }

    #[test]
    fn numeric_values_fall_back_on_garbage() {
        assert_eq!(parse_or::<u16>(Some("8080".into()), 6969), 8080);
        assert_eq!(parse_or::<u16>(Some("eighty".into()), 6969), 6969);
        assert_eq!(parse_or::<u64>(None, 60), 60);
    }

    #[test]
    fn deep_links_use_bot_username() {
        let config = test_config();
        assert_eq!(
            config.join_request_url(),
            "https://t.me/musicclub_test_bot?start=join"
        );
        assert_eq!(
            config.tg_login_link("abc"),
            "https://t.me/musicclub_test_bot?start=auth_abc"
        );
    }
}
