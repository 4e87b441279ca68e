pub mod room_registry_errors;
