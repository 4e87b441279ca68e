pub mod config;
pub mod models;
pub mod repositories;
pub mod services;

pub use config::{ConfigError, GameSettings};
pub use models::room::Room;
pub use models::snapshot::{RoomSnapshot, RoomSummary};
pub use repositories::room_registry::RoomRegistry;
pub use services::room_service::RoomService;
