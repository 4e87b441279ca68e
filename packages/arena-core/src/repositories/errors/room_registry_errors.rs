use crate::models::room::RoomError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomRegistryError {
    RoomNotFound,
    AlreadySeated,
    InvalidUsername(String),
    Room(RoomError),
}

impl std::fmt::Display for RoomRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomRegistryError::RoomNotFound => write!(f, "Room not found"),
            RoomRegistryError::AlreadySeated => {
                write!(f, "Player is already seated in another room")
            }
            RoomRegistryError::InvalidUsername(msg) => write!(f, "Invalid username: {}", msg),
            RoomRegistryError::Room(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RoomRegistryError {}

impl From<RoomError> for RoomRegistryError {
    fn from(err: RoomError) -> Self {
        RoomRegistryError::Room(err)
    }
}
