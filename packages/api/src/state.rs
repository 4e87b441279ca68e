use std::sync::Arc;

use arena_core::services::room_service::RoomService;

#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
}
