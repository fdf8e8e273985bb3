mod event;
mod permission;
mod refresh_token;
mod song;
mod tg_auth_session;
mod user;

pub use event::EventRepository;
pub use permission::PermissionRepository;
pub use refresh_token::RefreshTokenRepository;
pub use song::SongRepository;
pub use tg_auth_session::TgAuthSessionRepository;
pub use user::UserRepository;
