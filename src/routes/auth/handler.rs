use axum::extract::{Extension, Json, State};
use sqlx::{Connection, PgConnection};

use crate::{
    AppState,
    auth::{
        IssuedSession, TelegramUser, acceptable_password, hash_password,
        password::MIN_PASSWORD_LEN, refresh_session, start_session, token::generate_link_token,
        verify_init_data, verify_password,
    },
    database::{PermissionRepository, TgAuthSessionRepository, UserEntity, UserRepository},
    error::{AppError, is_unique_violation},
    middleware::AuthContext,
    permissions::PermissionSet,
    routes::AppJson,
};

use super::model::{
    LoginRequest, Profile, ProfileResponse, RefreshRequest, RegisterRequest, Session,
    TelegramAuthRequest, TgLoginLinkResponse,
};

// Same text for unknown user and wrong password.
const BAD_CREDENTIALS: &str = "invalid username or password";

fn session_response(
    state: &AppState,
    issued: IssuedSession,
    user: &UserEntity,
    permissions: PermissionSet,
) -> Session {
    Session {
        tokens: issued.tokens,
        issued_at: issued.issued_at,
        expires_at: issued.expires_at,
        is_chat_member: user.is_chat_member,
        join_request_url: state.config.join_request_url(),
        profile: Profile::from(user),
        permissions,
    }
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<Json<Session>, AppError> {
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::invalid_argument("username is required"));
    }
    if !acceptable_password(&req.password) {
        return Err(AppError::invalid_argument(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::internal("password hashing task failed", e))?
        .map_err(|e| AppError::internal("failed to hash password", e))?;

    let display_name = req
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| username.clone());
    let avatar_url = req.avatar_url.filter(|url| !url.trim().is_empty());

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| AppError::internal("failed to begin transaction", e))?;

    let user = UserRepository::create_with_password(
        &mut *tx,
        &username,
        &password_hash,
        &display_name,
        avatar_url.as_deref(),
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::already_exists("username already taken")
        } else {
            AppError::internal("failed to create user", e)
        }
    })?;

    let permissions = PermissionSet::none();
    PermissionRepository::insert(&mut *tx, user.id, &permissions)
        .await
        .map_err(|e| AppError::internal("failed to create permissions", e))?;

    let issued = start_session(&mut tx, &state.tokens, user.id, &user.username).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::internal("failed to commit registration", e))?;

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok(Json(session_response(&state, issued, &user, permissions)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<Session>, AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::invalid_argument("username and password are required"));
    }

    let user = UserRepository::find_by_username(&state.pool, req.username.trim())
        .await
        .map_err(|e| AppError::internal("failed to load user", e))?
        .ok_or_else(|| AppError::unauthenticated(BAD_CREDENTIALS))?;

    // Telegram-only accounts have no password to check against
    let hash = user
        .password_hash
        .clone()
        .ok_or_else(|| AppError::unauthenticated(BAD_CREDENTIALS))?;

    let password = req.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::internal("password check task failed", e))?;
    if !matches {
        return Err(AppError::unauthenticated(BAD_CREDENTIALS));
    }

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| AppError::internal("failed to begin transaction", e))?;

    let issued = start_session(&mut tx, &state.tokens, user.id, &user.username).await?;
    let permissions = PermissionRepository::load(&mut *tx, user.id)
        .await
        .map_err(|e| AppError::internal("failed to load permissions", e))?;

    tx.commit()
        .await
        .map_err(|e| AppError::internal("failed to commit login", e))?;

    Ok(Json(session_response(&state, issued, &user, permissions)))
}

#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshRequest>,
) -> Result<Json<crate::auth::TokenPair>, AppError> {
    let issued = refresh_session(&state.pool, &state.tokens, &req.refresh_token).await?;
    Ok(Json(issued.tokens))
}

#[axum::debug_handler]
pub async fn telegram_web_app_auth(
    State(state): State<AppState>,
    AppJson(req): AppJson<TelegramAuthRequest>,
) -> Result<Json<Session>, AppError> {
    let tg_user = verify_init_data(&req.init_data, &state.config.bot_token).map_err(|e| {
        tracing::warn!("Telegram init data rejected: {}", e);
        AppError::unauthenticated("invalid Telegram init data")
    })?;

    // checked before any write so a non-member leaves no trace
    let is_member = state
        .membership
        .is_member(tg_user.id)
        .await
        .map_err(|e| AppError::internal("failed to check chat membership", e))?;
    if !is_member {
        tracing::warn!("Telegram user {} is not a member of the club chat", tg_user.id);
        return Err(AppError::permission_denied(
            "you must be a member of the club chat",
        ));
    }

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| AppError::internal("failed to begin transaction", e))?;

    let user = upsert_telegram_user(&mut tx, &tg_user).await?;
    let issued = start_session(&mut tx, &state.tokens, user.id, &user.username).await?;
    let permissions = PermissionRepository::load(&mut *tx, user.id)
        .await
        .map_err(|e| AppError::internal("failed to load permissions", e))?;

    tx.commit()
        .await
        .map_err(|e| AppError::internal("failed to commit Telegram login", e))?;

    Ok(Json(session_response(&state, issued, &user, permissions)))
}

// tg_<id>, then tg_<id>_2 ..= tg_<id>_N
const TG_USERNAME_SUFFIXES: u32 = 9;

/// Usernames to try for a new Telegram account, best first.
fn username_candidates(tg_user: &TelegramUser) -> Vec<String> {
    let fallback = format!("tg_{}", tg_user.id);
    let mut candidates: Vec<String> = tg_user.username().map(str::to_string).into_iter().collect();
    candidates.push(fallback.clone());
    candidates.extend((2..=TG_USERNAME_SUFFIXES).map(|n| format!("{}_{}", fallback, n)));
    candidates
}

/// Matches the user by Telegram id, creating the account on first sight.
/// Each username attempt runs in a savepoint so a taken name does not abort
/// the surrounding transaction.
async fn upsert_telegram_user(
    conn: &mut PgConnection,
    tg_user: &TelegramUser,
) -> Result<UserEntity, AppError> {
    let display_name = tg_user.display_name();
    let avatar_url = tg_user.photo_url.as_deref();

    for username in username_candidates(tg_user) {
        let mut savepoint = conn
            .begin()
            .await
            .map_err(|e| AppError::internal("failed to open savepoint", e))?;

        let result = UserRepository::upsert_from_telegram(
            &mut *savepoint,
            &username,
            &display_name,
            avatar_url,
            tg_user.id,
        )
        .await;

        match result {
            Ok(user) => {
                savepoint
                    .commit()
                    .await
                    .map_err(|e| AppError::internal("failed to release savepoint", e))?;

                // no-op for returning users, defaults for new ones
                PermissionRepository::insert(
                    &mut *conn,
                    user.id,
                    &PermissionSet::chat_member_defaults(),
                )
                .await
                .map_err(|e| AppError::internal("failed to create permissions", e))?;

                tracing::debug!("Telegram id {} signed in as {}", tg_user.id, user.username);
                return Ok(user);
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::debug!("Username {} is taken, trying the next one", username);
                savepoint
                    .rollback()
                    .await
                    .map_err(|e| AppError::internal("failed to roll back savepoint", e))?;
            }
            Err(e) => return Err(AppError::internal("failed to create user", e)),
        }
    }

    Err(AppError::internal(
        "failed to create user",
        format!("no free username for Telegram id {}", tg_user.id),
    ))
}

#[axum::debug_handler]
pub async fn get_tg_login_link(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
) -> Result<Json<TgLoginLinkResponse>, AppError> {
    let user = UserRepository::find_by_id(&state.pool, ctx.user_id)
        .await
        .map_err(|e| AppError::internal("failed to load user", e))?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    if user.tg_user_id.is_some() {
        return Err(AppError::already_exists("Telegram account already linked"));
    }

    let token = generate_link_token();
    TgAuthSessionRepository::upsert_pending(&state.pool, user.id, &token)
        .await
        .map_err(|e| AppError::internal("failed to store Telegram login session", e))?;

    Ok(Json(TgLoginLinkResponse {
        link: state.config.tg_login_link(&token),
    }))
}

#[axum::debug_handler]
pub async fn get_profile(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = UserRepository::find_by_id(&state.pool, ctx.user_id)
        .await
        .map_err(|e| AppError::internal("failed to load user", e))?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let permissions = PermissionRepository::load(&state.pool, user.id)
        .await
        .map_err(|e| AppError::internal("failed to load permissions", e))?;

    Ok(Json(ProfileResponse {
        profile: Profile::from(&user),
        is_chat_member: user.is_chat_member,
        permissions,
    }))
}
