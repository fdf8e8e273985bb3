use axum::extract::{Extension, Json, State};
use uuid::Uuid;

use crate::{
    AppState,
    database::EventRepository,
    error::{AppError, is_foreign_key_violation},
    middleware::AuthContext,
    permissions::{can_edit_event, can_edit_join, can_edit_tracklist},
    routes::{AppJson, Empty, load_permissions},
};

use super::model::{
    CreateEventRequest, EventIdRequest, EventResponse, ParticipationRequest, UpdateEventRequest,
    UpdateTracklistRequest, validate_event, validate_tracklist,
};

async fn require_event_editor(state: &AppState, ctx: &AuthContext) -> Result<(), AppError> {
    let permissions = load_permissions(state, ctx.user_id).await?;
    if !can_edit_event(Some(&permissions)) {
        return Err(AppError::permission_denied("not allowed to edit events"));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn create_event(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    require_event_editor(&state, &ctx).await?;
    let fields = validate_event(req)?;

    let id = EventRepository::create(&state.pool, &fields, ctx.user_id)
        .await
        .map_err(|e| AppError::internal("failed to create event", e))?;

    tracing::info!("User {} created event {}", ctx.user_id, id);
    Ok(Json(EventResponse { id }))
}

#[axum::debug_handler]
pub async fn update_event(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    require_event_editor(&state, &ctx).await?;
    let fields = validate_event(req.event)?;

    let updated = EventRepository::update(&state.pool, req.id, &fields)
        .await
        .map_err(|e| AppError::internal("failed to update event", e))?;
    if updated == 0 {
        return Err(AppError::not_found("event not found"));
    }

    Ok(Json(EventResponse { id: req.id }))
}

#[axum::debug_handler]
pub async fn delete_event(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<EventIdRequest>,
) -> Result<Json<Empty>, AppError> {
    require_event_editor(&state, &ctx).await?;

    let deleted = EventRepository::delete(&state.pool, req.id)
        .await
        .map_err(|e| AppError::internal("failed to delete event", e))?;
    if deleted == 0 {
        return Err(AppError::not_found("event not found"));
    }

    tracing::info!("User {} deleted event {}", ctx.user_id, req.id);
    Ok(Json(Empty {}))
}

#[axum::debug_handler]
pub async fn update_tracklist(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<UpdateTracklistRequest>,
) -> Result<Json<Empty>, AppError> {
    let permissions = load_permissions(&state, ctx.user_id).await?;
    if !can_edit_tracklist(Some(&permissions)) {
        return Err(AppError::permission_denied("not allowed to edit tracklists"));
    }

    let items = validate_tracklist(req.items)?;

    let mut tx = state
        .pool
        .begin()
        .await
        .map_err(|e| AppError::internal("failed to begin transaction", e))?;

    let exists = EventRepository::exists(&mut *tx, req.event_id)
        .await
        .map_err(|e| AppError::internal("failed to load event", e))?;
    if !exists {
        return Err(AppError::not_found("event not found"));
    }

    EventRepository::replace_tracklist(&mut tx, req.event_id, &items)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found("tracklist references an unknown song")
            } else {
                AppError::internal("failed to store tracklist", e)
            }
        })?;

    tx.commit()
        .await
        .map_err(|e| AppError::internal("failed to commit tracklist", e))?;

    Ok(Json(Empty {}))
}

async fn authorize_participation(
    state: &AppState,
    ctx: &AuthContext,
    req: &ParticipationRequest,
) -> Result<(Uuid, String), AppError> {
    let exists = EventRepository::exists(&state.pool, req.event_id)
        .await
        .map_err(|e| AppError::internal("failed to load event", e))?;
    if !exists {
        return Err(AppError::not_found("event not found"));
    }

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
pub async fn join_event(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<ParticipationRequest>,
) -> Result<Json<Empty>, AppError> {
    let (participant, role) = authorize_participation(&state, &ctx, &req).await?;

    EventRepository::join(&state.pool, req.event_id, &role, participant)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found("event or user not found")
            } else {
                AppError::internal("failed to join event", e)
            }
        })?;

    Ok(Json(Empty {}))
}

#[axum::debug_handler]
pub async fn leave_event(
    Extension(ctx): Extension<AuthContext>,
    State(state): State<AppState>,
    AppJson(req): AppJson<ParticipationRequest>,
) -> Result<Json<Empty>, AppError> {
    let (participant, role) = authorize_participation(&state, &ctx, &req).await?;

    EventRepository::leave(&state.pool, req.event_id, &role, participant)
        .await
        .map_err(|e| AppError::internal("failed to leave event", e))?;

    Ok(Json(Empty {}))
}
