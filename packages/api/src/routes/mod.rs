pub mod game;
pub mod health;
pub mod negotiation;
pub mod rooms;
