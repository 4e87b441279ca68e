use crate::models::negotiation::NegotiationError;
use crate::models::room::RoomError;
use crate::repositories::errors::room_registry_errors::RoomRegistryError;
use crate::services::errors::move_suggester_errors::SuggesterError;

/// How a caller should react to a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input, nothing changed.
    Validation,
    /// The room was not in a state that allows the operation. Refetch and retry.
    Precondition,
    /// The move suggester failed. Recorded in the room, same seat may retry.
    External,
    /// The room is gone.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomServiceError {
    Validation(String),
    RoomNotFound,
    RoomFull,
    AlreadySeated,
    NotInRoom,
    NotOwner,
    ConfigLocked,
    ConfigMissing,
    ConfigNotLocked,
    AlreadyLocked,
    AlreadyReady,
    NoEditsRemaining,
    NoUnlockToCancel,
    ReadyIrreversible,
    GameAlreadyStarted,
    AllSeatsReady,
    GameNotFinished,
    GameFinished,
    WaitingForOpponent,
    OpponentNotReady,
    NotYourTurn,
    NoPendingMove,
    StaleProposal,
    MoveSuggester(SuggesterError),
}

impl RoomServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoomServiceError::Validation(_) => ErrorKind::Validation,
            RoomServiceError::RoomNotFound => ErrorKind::NotFound,
            RoomServiceError::MoveSuggester(_) => ErrorKind::External,
            _ => ErrorKind::Precondition,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RoomServiceError::Validation(_) => "Validation",
            RoomServiceError::RoomNotFound => "RoomNotFound",
            RoomServiceError::RoomFull => "RoomFull",
            RoomServiceError::AlreadySeated => "AlreadySeated",
            RoomServiceError::NotInRoom => "NotInRoom",
            RoomServiceError::NotOwner => "NotOwner",
            RoomServiceError::ConfigLocked => "ConfigLocked",
            RoomServiceError::ConfigMissing => "ConfigMissing",
            RoomServiceError::ConfigNotLocked => "ConfigNotLocked",
            RoomServiceError::AlreadyLocked => "AlreadyLocked",
            RoomServiceError::AlreadyReady => "AlreadyReady",
            RoomServiceError::NoEditsRemaining => "NoEditsRemaining",
            RoomServiceError::NoUnlockToCancel => "NoUnlockToCancel",
            RoomServiceError::ReadyIrreversible => "ReadyIrreversible",
            RoomServiceError::GameAlreadyStarted => "GameAlreadyStarted",
            RoomServiceError::AllSeatsReady => "AllSeatsReady",
            RoomServiceError::GameNotFinished => "GameNotFinished",
            RoomServiceError::GameFinished => "GameFinished",
            RoomServiceError::WaitingForOpponent => "WaitingForOpponent",
            RoomServiceError::OpponentNotReady => "OpponentNotReady",
            RoomServiceError::NotYourTurn => "NotYourTurn",
            RoomServiceError::NoPendingMove => "NoPendingMove",
            RoomServiceError::StaleProposal => "StaleProposal",
            RoomServiceError::MoveSuggester(_) => "MoveSuggesterError",
        }
    }
}

impl std::fmt::Display for RoomServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomServiceError::Validation(msg) => write!(f, "Validation error: {}", msg),
            RoomServiceError::RoomNotFound => write!(f, "Room not found"),
            RoomServiceError::RoomFull => write!(f, "Room is full"),
            RoomServiceError::AlreadySeated => write!(f, "Player is already seated in another room"),
            RoomServiceError::NotInRoom => write!(f, "Player is not in this room"),
            RoomServiceError::NotOwner => write!(f, "Only the room owner can do that"),
            RoomServiceError::ConfigLocked => write!(f, "Configuration is locked, unlock it first"),
            RoomServiceError::ConfigMissing => write!(f, "Set an AI configuration before locking"),
            RoomServiceError::ConfigNotLocked => write!(f, "Configuration must be locked first"),
            RoomServiceError::AlreadyLocked => write!(f, "Configuration is already locked"),
            RoomServiceError::AlreadyReady => write!(f, "Seat is already ready"),
            RoomServiceError::NoEditsRemaining => write!(f, "No configuration edits remaining"),
            RoomServiceError::NoUnlockToCancel => write!(f, "There is no unlock to cancel"),
            RoomServiceError::ReadyIrreversible => write!(f, "Readiness cannot be withdrawn"),
            RoomServiceError::GameAlreadyStarted => write!(f, "The game has already started"),
            RoomServiceError::AllSeatsReady => write!(f, "Every seat is already ready"),
            RoomServiceError::GameNotFinished => write!(f, "The game is not finished"),
            RoomServiceError::GameFinished => write!(f, "The game is already finished"),
            RoomServiceError::WaitingForOpponent => write!(f, "Waiting for an opponent to join"),
            RoomServiceError::OpponentNotReady => write!(f, "Waiting for every seat to be ready"),
            RoomServiceError::NotYourTurn => write!(f, "Not your turn"),
            RoomServiceError::NoPendingMove => write!(f, "There is no proposed move to confirm"),
            RoomServiceError::StaleProposal => {
                write!(f, "The room changed while the move was being chosen")
            }
            RoomServiceError::MoveSuggester(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RoomServiceError {}

impl From<NegotiationError> for RoomServiceError {
    fn from(err: NegotiationError) -> Self {
        match err {
            NegotiationError::ConfigLocked => RoomServiceError::ConfigLocked,
            NegotiationError::ConfigMissing => RoomServiceError::ConfigMissing,
            NegotiationError::ConfigNotLocked => RoomServiceError::ConfigNotLocked,
            NegotiationError::AlreadyLocked => RoomServiceError::AlreadyLocked,
            NegotiationError::AlreadyReady => RoomServiceError::AlreadyReady,
            NegotiationError::NoEditsRemaining => RoomServiceError::NoEditsRemaining,
            NegotiationError::NoUnlockToCancel => RoomServiceError::NoUnlockToCancel,
            NegotiationError::ReadyIrreversible => RoomServiceError::ReadyIrreversible,
            NegotiationError::InvalidConfig(msg) => RoomServiceError::Validation(msg),
        }
    }
}

impl From<RoomError> for RoomServiceError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::NotInRoom => RoomServiceError::NotInRoom,
            RoomError::RoomFull => RoomServiceError::RoomFull,
            RoomError::NotOwner => RoomServiceError::NotOwner,
            RoomError::GameAlreadyStarted => RoomServiceError::GameAlreadyStarted,
            RoomError::AllSeatsReady => RoomServiceError::AllSeatsReady,
            RoomError::GameNotFinished => RoomServiceError::GameNotFinished,
            RoomError::Validation(msg) => RoomServiceError::Validation(msg),
        }
    }
}

impl From<RoomRegistryError> for RoomServiceError {
    fn from(err: RoomRegistryError) -> Self {
        match err {
            RoomRegistryError::RoomNotFound => RoomServiceError::RoomNotFound,
            RoomRegistryError::AlreadySeated => RoomServiceError::AlreadySeated,
            RoomRegistryError::Room(inner) => RoomServiceError::from(inner),
            RoomRegistryError::InvalidUsername(msg) => RoomServiceError::Validation(msg),
        }
    }
}

impl From<SuggesterError> for RoomServiceError {
    fn from(err: SuggesterError) -> Self {
        RoomServiceError::MoveSuggester(err)
    }
}
