//! Credentials and sessions: password hashing, access/refresh tokens and
//! Telegram identity proofs.

pub mod password;
pub mod session;
pub mod telegram;
pub mod token;

pub use password::{acceptable_password, hash_password, verify_password};
pub use session::{IssuedSession, TokenPair, refresh_session, start_session};
pub use telegram::{ChatMembership, TelegramError, TelegramUser, verify_init_data};
pub use token::{Claims, TokenError, TokenIssuer};
