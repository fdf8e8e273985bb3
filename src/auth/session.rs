use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    auth::token::{TokenIssuer, generate_refresh_token, refresh_token_ttl},
    database::{RefreshTokenRepository, UserRepository},
    error::AppError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub tokens: TokenPair,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Starts a fresh session for `user_id`: all refresh tokens the user held are
/// revoked, then a new pair is issued. Meant to run on a transaction so
/// revocation and insert land together.
pub async fn start_session(
    conn: &mut PgConnection,
    issuer: &TokenIssuer,
    user_id: Uuid,
    username: &str,
) -> Result<IssuedSession, AppError> {
    RefreshTokenRepository::revoke_all_for_user(&mut *conn, user_id)
        .await
        .map_err(|e| AppError::internal("failed to revoke refresh tokens", e))?;

    issue_session(conn, issuer, user_id, username).await
}

async fn issue_session(
    conn: &mut PgConnection,
    issuer: &TokenIssuer,
    user_id: Uuid,
    username: &str,
) -> Result<IssuedSession, AppError> {
    let now = Utc::now();
    let access = issuer
        .issue_access_token_at(user_id, username, now)
        .map_err(|e| AppError::internal("failed to sign access token", e))?;

    let refresh_token = generate_refresh_token();
    RefreshTokenRepository::insert(&mut *conn, user_id, &refresh_token, now + refresh_token_ttl())
        .await
        .map_err(|e| AppError::internal("failed to store refresh token", e))?;

    tracing::debug!("Issued session for user {}", user_id);

    Ok(IssuedSession {
        tokens: TokenPair {
            access_token: access.token,
            refresh_token,
        },
        issued_at: access.issued_at,
        expires_at: access.expires_at,
    })
}

/// Trades a refresh token for a new pair. Only the presented token is
/// replaced; other devices keep theirs.
pub async fn refresh_session(
    pool: &PgPool,
    issuer: &TokenIssuer,
    refresh_token: &str,
) -> Result<IssuedSession, AppError> {
    if refresh_token.is_empty() {
        return Err(AppError::invalid_argument("refresh token is required"));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::internal("failed to begin transaction", e))?;

    let user_id = RefreshTokenRepository::consume(&mut *tx, refresh_token, Utc::now())
        .await
        .map_err(|e| AppError::internal("failed to look up refresh token", e))?
        .ok_or_else(|| AppError::unauthenticated("invalid or expired refresh token"))?;

    let user = UserRepository::find_by_id(&mut *tx, user_id)
        .await
        .map_err(|e| AppError::internal("failed to load user", e))?
        .ok_or_else(|| AppError::unauthenticated("user no longer exists"))?;

    let session = issue_session(&mut tx, issuer, user.id, &user.username).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::internal("failed to commit session", e))?;

    Ok(session)
}
