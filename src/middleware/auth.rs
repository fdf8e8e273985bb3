use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use uuid::Uuid;

use crate::{AppState, auth::Claims, database::UserRepository, error::AppError};

/// Methods reachable without a bearer token. Everything else is denied by
/// default.
pub const PUBLIC_METHODS: [&str; 4] = [
    "/musicclub.auth.AuthService/Login",
    "/musicclub.auth.AuthService/Register",
    "/musicclub.auth.AuthService/Refresh",
    "/musicclub.auth.AuthService/TelegramWebAppAuth",
];

/// Identity of the caller, attached to the request by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub claims: Claims,
}

pub fn is_public_method(path: &str) -> bool {
    PUBLIC_METHODS.contains(&path)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if is_public_method(req.uri().path()) {
        return next.run(req).await;
    }

    let context = match authenticate(&state, req.headers()).await {
        Ok(context) => context,
        Err(err) => {
            tracing::debug!("Rejected {}: {}", req.uri().path(), err);
            return err.into_response();
        }
    };

    req.extensions_mut().insert(context);
    next.run(req).await
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, AppError> {
    if headers.get(header::AUTHORIZATION).is_none() {
        return Err(AppError::unauthenticated("missing authorization header"));
    }

    let Authorization(bearer) = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::unauthenticated("authorization header must be a bearer token"))?;

    let claims = state
        .tokens
        .verify_access_token(bearer.token())
        .map_err(|e| AppError::unauthenticated(format!("invalid token: {}", e)))?;

    let user_id = claims
        .subject()
        .map_err(|_| AppError::unauthenticated("invalid token subject"))?;

    // a deleted account's tokens stay signed but must stop working
    let exists = UserRepository::exists(&state.pool, user_id)
        .await
        .map_err(|e| AppError::internal("failed to check token subject", e))?;
    if !exists {
        return Err(AppError::unauthenticated("invalid token: user not found"));
    }

    Ok(AuthContext { user_id, claims })
}
