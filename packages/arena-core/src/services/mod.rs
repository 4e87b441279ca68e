pub mod errors;
pub mod move_suggester;
pub mod openai_suggester;
pub mod room_service;
pub mod turn_service;
