use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error};

use crate::{error::ApiError, extract::ApiJson, middleware::identity::Player, state::AppState};
use arena_core::models::{
    requests::{CreateRoomResponse, SendMessageRequest},
    snapshot::{RoomSnapshot, RoomSummary},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", post(create_room).get(list_rooms))
        .route("/rooms/{room_id}", get(get_room).delete(delete_room))
        .route("/rooms/{room_id}/join", post(join_room))
        .route("/rooms/{room_id}/leave", post(leave_room))
        .route("/rooms/{room_id}/messages", post(send_message))
}

async fn create_room(
    State(state): State<AppState>,
    player: Player,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ApiError> {
    let room = state
        .room_service
        .create_room(&player.username)
        .await
        .map_err(|e| {
            error!("Failed to create room for {}: {}", player.username, e);
            ApiError::from(e)
        })?;
    debug!("Room {} ready for {}", room.id, player.username);
    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room_id: room.id.clone(),
            room,
        }),
    ))
}

async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    Json(state.room_service.list_rooms().await)
}

async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .get_room(&room_id)
        .await
        .map(Json)
        .map_err(ApiError::from)
}

async fn delete_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
) -> Result<StatusCode, ApiError> {
    state
        .room_service
        .delete_room(&room_id, &player.username)
        .await
        .map_err(|e| {
            error!("Failed to delete room {} for {}: {}", room_id, player.username, e);
            ApiError::from(e)
        })?;
    debug!("Room {} disbanded by {}", room_id, player.username);
    Ok(StatusCode::NO_CONTENT)
}

async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .join_room(&room_id, &player.username)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to join room {} for {}: {}", room_id, player.username, e);
            ApiError::from(e)
        })
}

async fn leave_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
) -> Result<StatusCode, ApiError> {
    state
        .room_service
        .leave_room(&room_id, &player.username)
        .await
        .map_err(|e| {
            error!("Failed to leave room {} for {}: {}", room_id, player.username, e);
            ApiError::from(e)
        })?;
    debug!("User {} left room {}", player.username, room_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn send_message(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    player: Player,
    ApiJson(payload): ApiJson<SendMessageRequest>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    state
        .room_service
        .send_message(&room_id, &player.username, &payload.text)
        .await
        .map(Json)
        .map_err(|e| {
            debug!("Message from {} rejected in room {}: {}", player.username, room_id, e);
            ApiError::from(e)
        })
}
