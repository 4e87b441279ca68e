use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::ApiError, state::AppState};
use arena_core::repositories::room_registry::validate_username;

pub const USERNAME_HEADER: &str = "x-username";

/// Caller identity taken from the `x-username` header. Names are trusted as
/// given once they pass shape checks.
#[derive(Debug, Clone)]
pub struct Player {
    pub username: String,
}

impl FromRequestParts<AppState> for Player {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(USERNAME_HEADER)
            .ok_or(ApiError::MissingIdentity)?
            .to_str()
            .map_err(|_| ApiError::InvalidIdentity("Invalid header format".to_string()))?;

        validate_username(username).map_err(|e| ApiError::InvalidIdentity(e.to_string()))?;

        Ok(Player {
            username: username.to_string(),
        })
    }
}
