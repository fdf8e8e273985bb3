use axum::extract::{Extension, Json, State};
use uuid::Uuid;

use crate::{
    AppState,
    database::SongRepository,
    error::{AppError, is_foreign_key_violation},
    middleware::AuthContext,
    permissions::{can_edit_join, can_edit_song},
    routes::{AppJson, Empty, load_permissions},
};

use super::model::{CreateSongRequest, RoleRequest, SongIdRequest, SongResponse, UpdateSongRequest};

/// Owner of an existing song, or NotFound.
async fn song_owner(state: &AppState, song_id: Uuid) -> Result<Option<Uuid>, AppError> {
    SongRepository::owner(&state.pool, song_id)
        .await
        .map_err(|e| AppError::internal("failed to load song", e))?
        .ok_or_else(|| AppError::not_found("song not found"))
}

#[axum::debug_handler]
pub async fn create_song(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateSongRequest>,
) -> Result<Json<SongResponse>, AppError> {
    let permissions = load_permissions(&state, ctx.user_id).await?;
    if !permissions.can_create_song() {
        return Err(AppError::permission_denied("not allowed to create songs"));
    }

    let (fields, roles) = req.into_fields()?;

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| AppError::internal("failed to begin transaction", e))?;

    let id = SongRepository::create(&mut *tx, &fields, ctx.user_id)
        .await
        .map_err(|e| AppError::internal("failed to create song", e))?;
    SongRepository::replace_roles(&mut tx, id, &roles)
        .await
        .map_err(|e| AppError::internal("failed to store song roles", e))?;

    tx.commit()
        .await
        .map_err(|e| AppError::internal("failed to commit song", e))?;

    tracing::info!("User {} created song {}", ctx.user_id, id);
    Ok(Json(SongResponse { id }))
}

#[axum::debug_handler]
pub async fn update_song(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<UpdateSongRequest>,
) -> Result<Json<SongResponse>, AppError> {
    let owner = song_owner(&state, req.id).await?;
    let permissions = load_permissions(&state, ctx.user_id).await?;
    if !can_edit_song(Some(&permissions), owner, ctx.user_id) {
        return Err(AppError::permission_denied("not allowed to edit this song"));
    }

    let (fields, roles) = req.song.into_fields()?;

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| AppError::internal("failed to begin transaction", e))?;

    let updated = SongRepository::update(&mut *tx, req.id, &fields)
        .await
        .map_err(|e| AppError::internal("failed to update song", e))?;
    if updated == 0 {
        return Err(AppError::not_found("song not found"));
    }
    SongRepository::replace_roles(&mut tx, req.id, &roles)
        .await
        .map_err(|e| AppError::internal("failed to store song roles", e))?;

    tx.commit()
        .await
        .map_err(|e| AppError::internal("failed to commit song", e))?;

    Ok(Json(SongResponse { id: req.id }))
}

#[axum::debug_handler]
pub async fn delete_song(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<SongIdRequest>,
) -> Result<Json<Empty>, AppError> {
    let owner = song_owner(&state, req.id).await?;
    let permissions = load_permissions(&state, ctx.user_id).await?;
    if !can_edit_song(Some(&permissions), owner, ctx.user_id) {
        return Err(AppError::permission_denied("not allowed to delete this song"));
    }

    let deleted = SongRepository::delete(&state.pool, req.id)
        .await
        .map_err(|e| AppError::internal("failed to delete song", e))?;
    if deleted == 0 {
        return Err(AppError::not_found("song not found"));
    }

    tracing::info!("User {} deleted song {}", ctx.user_id, req.id);
    Ok(Json(Empty {}))
}

/// Checks the song exists and the caller may manage `participant`'s roles.
async fn authorize_participation(
    state: &AppState,
    ctx: &AuthContext,
    req: &RoleRequest,
) -> Result<(Uuid, String), AppError> {
    song_owner(state, req.song_id).await?;

    let participant = req.user_id.unwrap_or(ctx.user_id);
    let permissions = load_permissions(state, ctx.user_id).await?;
    if !can_edit_join(Some(&permissions), Some(participant), ctx.user_id) {
        return Err(AppError::permission_denied(
            "not allowed to change this participation",
        ));
    }

    let role = req.role.trim();
    if role.is_empty() {
        return Err(AppError::invalid_argument("role is required"));
    }

    Ok((participant, role.to_string()))
}

#[axum::debug_handler]
pub async fn join_role(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<RoleRequest>,
) -> Result<Json<Empty>, AppError> {
    let (participant, role) = authorize_participation(&state, &ctx, &req).await?;

    let offered = SongRepository::has_role(&state.pool, req.song_id, &role)
        .await
        .map_err(|e| AppError::internal("failed to load song roles", e))?;
    if !offered {
        return Err(AppError::invalid_argument(format!(
            "song does not offer role '{}'",
            role
        )));
    }

    SongRepository::join_role(&state.pool, req.song_id, &role, participant)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found("song or user not found")
            } else {
                AppError::internal("failed to join role", e)
            }
        })?;

    Ok(Json(Empty {}))
}

#[axum::debug_handler]
pub async fn leave_role(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<RoleRequest>,
) -> Result<Json<Empty>, AppError> {
    let (participant, role) = authorize_participation(&state, &ctx, &req).await?;

    SongRepository::leave_role(&state.pool, req.song_id, &role, participant)
        .await
        .map_err(|e| AppError::internal("failed to leave role", e))?;

    Ok(Json(Empty {}))
}
