use axum::{
    extract::{Path, State},
    routing::{post, put},
    Json, Router,
};
use tracing::debug;

use crate::{error::ApiError, extract::ApiJson, middleware::identity::Player, state::AppState};
use arena_core::models::{
    ai_config::AiConfig,
    requests::{LockConfigRequest, OwnerColorRequest, ReadyRequest},
    snapshot::RoomSnapshot,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms/{room_id}/ai-config", put(set_ai_config))
        .route("/rooms/{room_id}/lock", post(lock_config))
        .route("/rooms/{room_id}/ready", post(set_ready))
        .route("/rooms/{room_id}/owner-color", post(set_owner_color))
}

async fn set_ai_config(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
    ApiJson(config): ApiJson<AiConfig>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .set_ai_config(&room_id, &player.username, config)
        .await
        .map(Json)
        .map_err(|e| {
            debug!("AI config rejected for {} in room {}: {}", player.username, room_id, e);
            ApiError::from(e)
        })
}

async fn lock_config(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
    ApiJson(payload): ApiJson<LockConfigRequest>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .lock_config(&room_id, &player.username, payload.locked, payload.cancel_unlock)
        .await
        .map(Json)
        .map_err(|e| {
            debug!("Lock change rejected for {} in room {}: {}", player.username, room_id, e);
            ApiError::from(e)
        })
}

async fn set_ready(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
    ApiJson(payload): ApiJson<ReadyRequest>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .set_ready(&room_id, &player.username, payload.ready)
        .await
        .map(Json)
        .map_err(|e| {
            debug!("Ready rejected for {} in room {}: {}", player.username, room_id, e);
            ApiError::from(e)
        })
}

async fn set_owner_color(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
    ApiJson(payload): ApiJson<OwnerColorRequest>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .set_owner_color(&room_id, &player.username, payload.color)
        .await
        .map(Json)
        .map_err(|e| {
            debug!("Colour change rejected for {} in room {}: {}", player.username, room_id, e);
            ApiError::from(e)
        })
}
