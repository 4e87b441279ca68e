pub mod ai_config;
pub mod board;
pub mod negotiation;
pub mod requests;
pub mod room;
pub mod snapshot;
