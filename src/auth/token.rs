use base64::{
    Engine,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOKEN_ISSUER: &str = "musicclubbot";
const REFRESH_TOKEN_BYTES: usize = 32;
const LINK_TOKEN_BYTES: usize = 24;

pub fn access_token_ttl() -> Duration {
    Duration::minutes(15)
}

pub fn refresh_token_ttl() -> Duration {
    Duration::days(7)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub sub: String, // same as user_id
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String, // keeps two tokens from the same second distinct
}

impl Claims {
    pub fn subject(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Signs and checks HS256 access tokens with the server secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_access_token_at(user_id, username, Utc::now())
    }

    pub fn issue_access_token_at(
        &self,
        user_id: Uuid,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let issued_at = now.timestamp();
        let expires_at = (now + access_token_ttl()).timestamp();

        let claims = Claims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            sub: user_id.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: issued_at,
            exp: expires_at,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_access_token_at(token, Utc::now())
    }

    /// Signature, algorithm and issuer are checked by `jsonwebtoken`; expiry
    /// against `now` here, with no leeway.
    pub fn verify_access_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// 32 random bytes from the OS, URL-safe base64.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}

/// Token for a `t.me/<bot>?start=auth_<token>` deep link. Telegram only accepts
/// `[A-Za-z0-9_-]` there, so no padding.
pub fn generate_link_token() -> String {
    let mut bytes = [0u8; LINK_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-secret")
    }

    #[test]
    fn round_trip_keeps_subject_and_username() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let issued = issuer.issue_access_token(user_id, "alice").unwrap();

        let claims = issuer.verify_access_token(&issued.token).unwrap();
        assert_eq!(claims.subject().unwrap(), user_id);
        assert_eq!(claims.user_id, user_id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, access_token_ttl().num_seconds());
        assert_eq!(issued.expires_at, claims.exp);
    }

    #[test]
    fn tokens_are_never_idempotent() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let a = issuer.issue_access_token_at(user_id, "bob", now).unwrap();
        let b = issuer.issue_access_token_at(user_id, "bob", now).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn expiry_boundary() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let expired = issuer
            .issue_access_token_at(user_id, "carol", now - access_token_ttl() - Duration::seconds(1))
            .unwrap();
        assert!(matches!(
            issuer.verify_access_token_at(&expired.token, now),
            Err(TokenError::Expired)
        ));

        let fresh = issuer
            .issue_access_token_at(user_id, "carol", now - access_token_ttl() + Duration::seconds(1))
            .unwrap();
        assert!(issuer.verify_access_token_at(&fresh.token, now).is_ok());
    }

    #[test]
    fn rejects_foreign_secret() {
        let issued = issuer().issue_access_token(Uuid::new_v4(), "dave").unwrap();
        let other = TokenIssuer::new(b"another-secret");
        assert!(matches!(
            other.verify_access_token(&issued.token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_unexpected_algorithm() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: Uuid::new_v4().to_string(),
            username: "eve".into(),
            sub: Uuid::new_v4().to_string(),
            iss: TOKEN_ISSUER.into(),
            iat: now,
            exp: now + 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            issuer().verify_access_token(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_foreign_issuer() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: Uuid::new_v4().to_string(),
            username: "mallory".into(),
            sub: Uuid::new_v4().to_string(),
            iss: "someone-else".into(),
            iat: now,
            exp: now + 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(issuer().verify_access_token(&token).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(issuer().verify_access_token("not.a.jwt").is_err());
        assert!(issuer().verify_access_token("").is_err());
    }

    #[test]
    fn refresh_tokens_are_url_safe_and_unique() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let token = generate_refresh_token();
            assert_eq!(URL_SAFE.decode(&token).unwrap().len(), REFRESH_TOKEN_BYTES);
            assert!(!token.contains('+') && !token.contains('/'));
            assert!(seen.insert(token));
        }
    }

    #[test]
    fn link_tokens_fit_telegram_start_parameter() {
        let token = generate_link_token();
        // "auth_" prefix plus token must stay within Telegram's 64 chars
        assert!(token.len() + "auth_".len() <= 64);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(token, generate_link_token());
    }
}
