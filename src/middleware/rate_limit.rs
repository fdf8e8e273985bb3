use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;

use crate::{
    config::Config,
    error::{AppError, ErrorResponse, error_codes},
};

/// Fixed-window request counter per client IP, kept in Redis.
#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<redis::Client>,
    config: Arc<Config>,
}

impl RateLimiter {
    pub fn new(redis: redis::Client, config: Arc<Config>) -> Self {
        Self {
            redis: Arc::new(redis),
            config,
        }
    }

    pub async fn check_rate_limit(&self, req: Request<Body>, next: Next) -> Response {
        let ip = client_ip(&req);
        let key = format!("rate_limit:{}", ip);

        let count = match self.hit(&key).await {
            Ok(count) => count,
            Err(e) => return AppError::internal("rate limiter unavailable", e).into_response(),
        };

        if count > u64::from(self.config.rate_limit_requests) {
            tracing::warn!("Rate limit exceeded for {}", ip);
            let window = self.config.rate_limit_window().as_secs();
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse {
                    code: error_codes::RATE_LIMIT,
                    kind: "resource_exhausted",
                    error_message: format!("too many requests, retry in {} seconds", window),
                }),
            )
                .into_response();
        }

        next.run(req).await
    }

    async fn hit(&self, key: &str) -> Result<u64, redis::RedisError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let count: u64 = conn.incr(key, 1).await?;
        if count == 1 {
            // first hit opens the window
            let _: () = conn
                .expire(key, self.config.rate_limit_window().as_secs() as i64)
                .await?;
        }

        Ok(count)
    }
}

/// `x-real-ip`, then the first `x-forwarded-for` entry, then the peer address.
pub(crate) fn client_ip(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn prefers_real_ip_header() {
        let req = request(&[("x-real-ip", "10.0.0.1"), ("x-forwarded-for", "10.0.0.2")]);
        assert_eq!(client_ip(&req), "10.0.0.1");
    }

    #[test]
    fn falls_back_to_first_forwarded_entry() {
        let req = request(&[("x-forwarded-for", " 10.0.0.2 , 10.0.0.3")]);
        assert_eq!(client_ip(&req), "10.0.0.2");
    }

    #[test]
    fn uses_peer_address_last() {
        let mut req = request(&[]);
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 7], 4000))));
        assert_eq!(client_ip(&req), "192.168.1.7");

        assert_eq!(client_ip(&request(&[])), "unknown");
    }
}
