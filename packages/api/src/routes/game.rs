use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use tracing::{debug, warn};

use crate::{error::ApiError, middleware::identity::Player, state::AppState};
use arena_core::models::snapshot::RoomSnapshot;
use arena_core::services::errors::room_service_errors::{ErrorKind, RoomServiceError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms/{room_id}/step", post(step))
        .route("/rooms/{room_id}/confirm", post(confirm_move))
        .route("/rooms/{room_id}/play", post(play))
        .route("/rooms/{room_id}/reset", post(reset_game))
}

fn log_rejection(action: &str, room_id: &str, username: &str, err: &RoomServiceError) {
    match err.kind() {
        ErrorKind::External => warn!("{} failed for {} in room {}: {}", action, username, room_id, err),
        _ => debug!("{} rejected for {} in room {}: {}", action, username, room_id, err),
    }
}

async fn step(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .step(&room_id, &player.username)
        .await
        .map(Json)
        .map_err(|e| {
            log_rejection("Step", &room_id, &player.username, &e);
            ApiError::from(e)
        })
}

async fn confirm_move(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .confirm_move(&room_id, &player.username)
        .await
        .map(Json)
        .map_err(|e| {
            log_rejection("Confirm", &room_id, &player.username, &e);
            ApiError::from(e)
        })
}

async fn play(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .play(&room_id, &player.username)
        .await
        .map(Json)
        .map_err(|e| {
            log_rejection("Play", &room_id, &player.username, &e);
            ApiError::from(e)
        })
}

async fn reset_game(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .reset_game(&room_id, &player.username)
        .await
        .map(Json)
        .map_err(|e| {
            log_rejection("Reset", &room_id, &player.username, &e);
            ApiError::from(e)
        })
}
