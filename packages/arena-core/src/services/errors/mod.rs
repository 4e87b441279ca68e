pub mod move_suggester_errors;
pub mod room_service_errors;
