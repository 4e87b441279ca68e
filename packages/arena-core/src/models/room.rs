use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GameSettings;
use crate::models::board::{Board, Coord, Move, Outcome, Stone};
use crate::models::negotiation::SeatNegotiation;
use crate::models::snapshot::{RoomSnapshot, RoomSummary, SeatView};

pub const MAX_MESSAGE_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    WaitingForPlayers,
    Negotiating,
    Active,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    NotInRoom,
    RoomFull,
    NotOwner,
    GameAlreadyStarted,
    AllSeatsReady,
    GameNotFinished,
    Validation(String),
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomError::NotInRoom => write!(f, "Player is not in this room"),
            RoomError::RoomFull => write!(f, "Room is full"),
            RoomError::NotOwner => write!(f, "Only the room owner can do that"),
            RoomError::GameAlreadyStarted => write!(f, "The game has already started"),
            RoomError::AllSeatsReady => write!(f, "Every seat is already ready"),
            RoomError::GameNotFinished => write!(f, "The game is not finished"),
            RoomError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for RoomError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub username: String,
    pub negotiation: SeatNegotiation,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMove {
    pub row: usize,
    pub col: usize,
    pub seat_index: u8,
    pub proposed_at: DateTime<Utc>,
}

impl PendingMove {
    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub text: String,
}

/// Result of a seat being vacated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub seat_index: u8,
    pub new_owner: Option<String>,
    pub room_empty: bool,
}

/// Authoritative state of one game session. Always accessed under the
/// room's lock; every method either fully applies or leaves it untouched.
#[derive(Debug, Clone)]
pub struct Room {
    id: String,
    settings: GameSettings,
    /// Index 0 plays black (seat 1), index 1 plays white (seat 2).
    slots: [Option<Seat>; 2],
    owner: String,
    pub(crate) board: Board,
    pub(crate) moves: Vec<Move>,
    pub(crate) current_seat: u8,
    pub(crate) outcome: Outcome,
    pub(crate) pending_move: Option<PendingMove>,
    pub(crate) last_error: Option<String>,
    chat: VecDeque<ChatMessage>,
    logs: VecDeque<LogEntry>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed: bool,
}

impl Room {
    pub fn new(owner: &str, settings: GameSettings) -> Self {
        Self::with_id(&Uuid::new_v4().to_string(), owner, settings)
    }

    pub fn with_id(id: &str, owner: &str, settings: GameSettings) -> Self {
        let now = Utc::now();
        let mut room = Room {
            id: id.to_string(),
            board: Board::new(settings.board_size, settings.win_length),
            slots: [None, None],
            owner: owner.to_string(),
            moves: Vec::new(),
            current_seat: Stone::Black.seat_index(),
            outcome: Outcome::Ongoing,
            pending_move: None,
            last_error: None,
            chat: VecDeque::new(),
            logs: VecDeque::new(),
            created_at: now,
            updated_at: now,
            closed: false,
            settings,
        };
        room.slots[0] = Some(room.new_seat(owner));
        room.push_log(format!("{} created the room", owner));
        room
    }

    fn new_seat(&self, username: &str) -> Seat {
        Seat {
            username: username.to_string(),
            negotiation: SeatNegotiation::new(self.settings.config_edit_budget),
            joined_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn current_seat(&self) -> u8 {
        self.current_seat
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn pending_move(&self) -> Option<&PendingMove> {
        self.pending_move.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn players(&self) -> Vec<String> {
        self.slots
            .iter()
            .flatten()
            .map(|seat| seat.username.clone())
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_member(&self, username: &str) -> bool {
        self.seat_index_of(username).is_some()
    }

    pub fn seat_index_of(&self, username: &str) -> Option<u8> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|seat| seat.username == username))
            .map(|pos| pos as u8 + 1)
    }

    pub fn seat(&self, seat_index: u8) -> Option<&Seat> {
        let pos = self.slot_position(seat_index)?;
        self.slots[pos].as_ref()
    }

    pub fn seat_mut(&mut self, seat_index: u8) -> Option<&mut Seat> {
        let pos = self.slot_position(seat_index)?;
        self.slots[pos].as_mut()
    }

    pub fn seat_by_name_mut(&mut self, username: &str) -> Result<&mut Seat, RoomError> {
        let index = self.seat_index_of(username).ok_or(RoomError::NotInRoom)?;
        self.seat_mut(index).ok_or(RoomError::NotInRoom)
    }

    fn slot_position(&self, seat_index: u8) -> Option<usize> {
        match seat_index {
            1 | 2 => Some(seat_index as usize - 1),
            _ => None,
        }
    }

    /// Colour of the slot the owner sits in.
    pub fn owner_color(&self) -> Stone {
        self.seat_index_of(&self.owner)
            .and_then(Stone::from_seat_index)
            .unwrap_or(Stone::Black)
    }

    pub fn all_ready(&self) -> bool {
        self.occupied_count() > 0
            && self
                .slots
                .iter()
                .flatten()
                .all(|seat| seat.negotiation.is_ready())
    }

    pub fn phase(&self) -> Phase {
        if self.outcome.is_finished() {
            Phase::Finished
        } else if self.occupied_count() < 2 {
            Phase::WaitingForPlayers
        } else if self.moves.is_empty() && !self.all_ready() {
            Phase::Negotiating
        } else {
            Phase::Active
        }
    }

    /// Seats `username` in the free slot. Joining a room one already sits in
    /// returns the existing seat.
    pub fn add_player(&mut self, username: &str) -> Result<u8, RoomError> {
        if let Some(index) = self.seat_index_of(username) {
            return Ok(index);
        }
        let position = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(RoomError::RoomFull)?;
        self.slots[position] = Some(self.new_seat(username));
        let seat_index = position as u8 + 1;
        self.push_log(format!("{} joined as seat {}", username, seat_index));
        self.touch();
        Ok(seat_index)
    }

    /// Vacates the seat of `username`, clearing a pending move it proposed and
    /// handing ownership to the remaining occupant when the owner leaves.
    pub fn remove_player(&mut self, username: &str) -> Result<Departure, RoomError> {
        let seat_index = self.seat_index_of(username).ok_or(RoomError::NotInRoom)?;
        self.slots[seat_index as usize - 1] = None;

        if self
            .pending_move
            .as_ref()
            .is_some_and(|pending| pending.seat_index == seat_index)
        {
            self.pending_move = None;
        }

        let mut new_owner = None;
        if self.owner == username {
            if let Some(remaining) = self.slots.iter().flatten().next() {
                self.owner = remaining.username.clone();
                new_owner = Some(self.owner.clone());
            }
        }

        self.push_log(format!("{} left the room", username));
        if let Some(owner) = &new_owner {
            self.push_log(format!("Ownership passed to {}", owner));
        }
        self.touch();

        Ok(Departure {
            seat_index,
            new_owner,
            room_empty: self.occupied_count() == 0,
        })
    }

    /// Moves the owner to the slot of `color`, swapping with whoever sits there.
    pub fn set_owner_color(&mut self, requester: &str, color: Stone) -> Result<(), RoomError> {
        if requester != self.owner {
            return Err(RoomError::NotOwner);
        }
        if !self.moves.is_empty() {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.all_ready() {
            return Err(RoomError::AllSeatsReady);
        }
        if self.owner_color() == color {
            return Ok(());
        }
        self.slots.swap(0, 1);
        self.pending_move = None;
        self.current_seat = Stone::Black.seat_index();
        self.push_log(format!("{} now plays {}", self.owner, color));
        self.touch();
        Ok(())
    }

    pub fn push_chat(&mut self, username: &str, text: &str) -> Result<(), RoomError> {
        if !self.is_member(username) {
            return Err(RoomError::NotInRoom);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(RoomError::Validation("Message cannot be empty".to_string()));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(RoomError::Validation(format!(
                "Message cannot exceed {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
        self.chat.push_back(ChatMessage {
            username: username.to_string(),
            text: text.to_string(),
            sent_at: Utc::now(),
        });
        while self.chat.len() > self.settings.chat_history_limit {
            self.chat.pop_front();
        }
        self.touch();
        Ok(())
    }

    pub fn push_log(&mut self, text: String) {
        self.logs.push_back(LogEntry {
            at: Utc::now(),
            text,
        });
        while self.logs.len() > self.settings.log_history_limit {
            self.logs.pop_front();
        }
    }

    /// Clears the finished game for a rematch. Seats keep their committed
    /// configs and go back to Locked with a fresh edit budget.
    pub fn reset_game(&mut self, requester: &str) -> Result<(), RoomError> {
        if requester != self.owner {
            return Err(RoomError::NotOwner);
        }
        if !self.outcome.is_finished() {
            return Err(RoomError::GameNotFinished);
        }
        self.board.clear();
        self.moves.clear();
        self.pending_move = None;
        self.last_error = None;
        self.outcome = Outcome::Ongoing;
        self.current_seat = Stone::Black.seat_index();
        for seat in self.slots.iter_mut().flatten() {
            seat.negotiation.reset_for_rematch();
        }
        self.push_log(format!("{} reset the board for a rematch", requester));
        self.touch();
        Ok(())
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        let seats = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(pos, slot)| slot.as_ref().map(|seat| (pos as u8 + 1, seat)))
            .map(|(seat_index, seat)| SeatView {
                username: seat.username.clone(),
                seat_index,
                color: Stone::from_seat_index(seat_index).unwrap_or(Stone::Black),
                is_owner: seat.username == self.owner,
                config_state: seat.negotiation.state(),
                config_locked: seat.negotiation.is_locked(),
                ready: seat.negotiation.is_ready(),
                edits_remaining: seat.negotiation.edits_remaining(),
                unlock_pending: seat.negotiation.has_rollback(),
                committed_config: seat.negotiation.committed().map(|c| c.redacted()),
            })
            .collect();

        let (winner, draw) = match self.outcome {
            Outcome::Ongoing => (0, false),
            Outcome::Winner(stone) => (stone.seat_index(), false),
            Outcome::Draw => (0, true),
        };

        RoomSnapshot {
            id: self.id.clone(),
            phase: self.phase(),
            seats,
            owner: self.owner.clone(),
            owner_color: self.owner_color(),
            current_seat_index: self.current_seat,
            winner,
            draw,
            board_size: self.board.size(),
            win_length: self.board.win_length(),
            board: self.board.grid(),
            moves: self.moves.clone(),
            pending_move: self.pending_move.clone(),
            chat: self.chat.iter().cloned().collect(),
            logs: self.logs.iter().cloned().collect(),
            last_error: self.last_error.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            owner: self.owner.clone(),
            players: self.players(),
            phase: self.phase(),
            move_count: self.moves.len(),
            created_at: self.created_at,
        }
    }
}
