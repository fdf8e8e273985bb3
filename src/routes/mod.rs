use axum::{Router, extract::FromRequest, routing::post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, database::PermissionRepository, error::AppError, permissions::PermissionSet};

pub mod auth;
pub mod event;
pub mod song;

/// JSON request body whose rejections come back as [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Body of calls that return nothing.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Empty {}

pub(crate) async fn load_permissions(state: &AppState, user_id: Uuid) -> Result<PermissionSet, AppError> {
    PermissionRepository::load(&state.pool, user_id)
        .await
        .map_err(|e| AppError::internal("failed to load permissions", e))
}

/// Every RPC method as a `POST /<package>.<Service>/<Method>` route.
pub fn rpc_routes() -> Router<AppState> {
    Router::new()
        .route("/musicclub.auth.AuthService/Register", post(auth::register))
        .route("/musicclub.auth.AuthService/Login", post(auth::login))
        .route("/musicclub.auth.AuthService/Refresh", post(auth::refresh))
        .route(
            "/musicclub.auth.AuthService/TelegramWebAppAuth",
            post(auth::telegram_web_app_auth),
        )
        .route(
            "/musicclub.auth.AuthService/GetTgLoginLink",
            post(auth::get_tg_login_link),
        )
        .route("/musicclub.auth.AuthService/GetProfile", post(auth::get_profile))
        .route("/musicclub.song.SongService/CreateSong", post(song::create_song))
        .route("/musicclub.song.SongService/UpdateSong", post(song::update_song))
        .route("/musicclub.song.SongService/DeleteSong", post(song::delete_song))
        .route("/musicclub.song.SongService/JoinRole", post(song::join_role))
        .route("/musicclub.song.SongService/LeaveRole", post(song::leave_role))
        .route("/musicclub.event.EventService/CreateEvent", post(event::create_event))
        .route("/musicclub.event.EventService/UpdateEvent", post(event::update_event))
        .route("/musicclub.event.EventService/DeleteEvent", post(event::delete_event))
        .route(
            "/musicclub.event.EventService/UpdateTracklist",
            post(event::update_tracklist),
        )
        .route("/musicclub.event.EventService/JoinEvent", post(event::join_event))
        .route("/musicclub.event.EventService/LeaveEvent", post(event::leave_event))
}
