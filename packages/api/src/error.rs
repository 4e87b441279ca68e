use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use arena_core::services::errors::{
    move_suggester_errors::SuggesterError, room_service_errors::RoomServiceError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    RoomService(RoomServiceError),
    MissingIdentity,
    InvalidIdentity(String),
    InvalidBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<RoomServiceError> for ApiError {
    fn from(error: RoomServiceError) -> Self {
        ApiError::RoomService(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingIdentity => StatusCode::UNAUTHORIZED,
            ApiError::InvalidIdentity(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,

            ApiError::RoomService(RoomServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::RoomService(RoomServiceError::NotOwner) => StatusCode::FORBIDDEN,
            ApiError::RoomService(RoomServiceError::RoomNotFound) => StatusCode::NOT_FOUND,
            ApiError::RoomService(RoomServiceError::MoveSuggester(SuggesterError::Timeout)) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            ApiError::RoomService(RoomServiceError::MoveSuggester(_)) => StatusCode::BAD_GATEWAY,
            ApiError::RoomService(_) => StatusCode::CONFLICT,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::MissingIdentity => ErrorResponse {
                code: "MissingIdentity".to_string(),
                error: "The x-username header is required".to_string(),
            },
            ApiError::InvalidIdentity(msg) | ApiError::InvalidBody(msg) => ErrorResponse {
                code: "Validation".to_string(),
                error: msg.clone(),
            },
            ApiError::RoomService(err) => ErrorResponse {
                code: err.code().to_string(),
                error: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
