mod handler;
mod model;

pub use handler::{
    get_profile, get_tg_login_link, login, refresh, register, telegram_web_app_auth,
};
pub use model::{
    LoginRequest, Profile, ProfileResponse, RefreshRequest, RegisterRequest, Session,
    TelegramAuthRequest, TgLoginLinkResponse,
};
