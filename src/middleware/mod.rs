mod auth;
mod logging;
mod rate_limit;

pub use auth::{AuthContext, PUBLIC_METHODS, auth_middleware, is_public_method};
pub use logging::log_requests;
pub use rate_limit::{RateLimiter, rate_limit};
