use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ai_config::AiConfig;
use crate::models::board::{Move, Stone};
use crate::models::negotiation::ConfigState;
use crate::models::room::{ChatMessage, LogEntry, PendingMove, Phase};

/// What every polling client sees of one seat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatView {
    pub username: String,
    pub seat_index: u8,
    pub color: Stone,
    pub is_owner: bool,
    pub config_state: ConfigState,
    pub config_locked: bool,
    pub ready: bool,
    pub edits_remaining: u8,
    pub unlock_pending: bool,
    /// Committed config with the credential masked.
    pub committed_config: Option<AiConfig>,
}

/// Consistent copy of a room taken under its lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: String,
    pub phase: Phase,
    pub seats: Vec<SeatView>,
    pub owner: String,
    pub owner_color: Stone,
    pub current_seat_index: u8,
    /// 0 while ongoing or drawn, otherwise the winning seat index.
    pub winner: u8,
    pub draw: bool,
    pub board_size: usize,
    pub win_length: usize,
    pub board: Vec<Vec<u8>>,
    pub moves: Vec<Move>,
    pub pending_move: Option<PendingMove>,
    pub chat: Vec<ChatMessage>,
    pub logs: Vec<LogEntry>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomSnapshot {
    pub fn seat(&self, username: &str) -> Option<&SeatView> {
        self.seats.iter().find(|seat| seat.username == username)
    }

    pub fn current_username(&self) -> Option<&str> {
        self.seats
            .iter()
            .find(|seat| seat.seat_index == self.current_seat_index)
            .map(|seat| seat.username.as_str())
    }
}

/// Lightweight lobby entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: String,
    pub owner: String,
    pub players: Vec<String>,
    pub phase: Phase,
    pub move_count: usize,
    pub created_at: DateTime<Utc>,
}
