use serde::{Deserialize, Serialize};

use crate::models::board::Stone;
use crate::models::snapshot::RoomSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub room: RoomSnapshot,
}

fn default_locked() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfigRequest {
    #[serde(default = "default_locked")]
    pub locked: bool,
    #[serde(default)]
    pub cancel_unlock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyRequest {
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerColorRequest {
    pub color: Stone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}
