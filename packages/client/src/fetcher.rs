use arena_core::models::snapshot::RoomSnapshot;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::SyncConfig;

const USERNAME_HEADER: &str = "x-username";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The room no longer exists. Terminal for a sync session.
    NotFound,
    /// Timeouts, connection failures and 5xx responses.
    Transient(String),
    /// The server understood the request and refused it.
    Rejected { code: String, message: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NotFound => write!(f, "Room not found"),
            FetchError::Transient(msg) => write!(f, "Transient fetch error: {}", msg),
            FetchError::Rejected { code, message } => {
                write!(f, "Request rejected ({}): {}", code, message)
            }
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::Transient(error.to_string())
    }
}

#[async_trait]
pub trait RoomFetcher: Send + Sync {
    async fn fetch_room(&self, room_id: &str) -> Result<RoomSnapshot, FetchError>;
    async fn leave_room(&self, room_id: &str, username: &str) -> Result<(), FetchError>;
    async fn delete_room(&self, room_id: &str, username: &str) -> Result<(), FetchError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    error: String,
}

/// Talks to the arena HTTP API.
pub struct HttpRoomFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRoomFetcher {
    pub fn new(config: &SyncConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(HttpRoomFetcher {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn room_url(&self, room_id: &str) -> String {
        format!("{}/rooms/{}", self.base_url, room_id)
    }
}

/// Sorts a non-success response into the error the sync loop reacts to.
async fn classify(response: reqwest::Response) -> FetchError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return FetchError::NotFound;
    }
    let text = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        return FetchError::Transient(format!("{}: {}", status, text));
    }
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => FetchError::Rejected {
            code: body.code,
            message: body.error,
        },
        Err(_) => FetchError::Rejected {
            code: status.as_u16().to_string(),
            message: text,
        },
    }
}

#[async_trait]
impl RoomFetcher for HttpRoomFetcher {
    async fn fetch_room(&self, room_id: &str) -> Result<RoomSnapshot, FetchError> {
        let response = self.client.get(self.room_url(room_id)).send().await?;
        if !response.status().is_success() {
            return Err(classify(response).await);
        }
        Ok(response.json::<RoomSnapshot>().await?)
    }

    async fn leave_room(&self, room_id: &str, username: &str) -> Result<(), FetchError> {
        let response = self
            .client
            .post(format!("{}/leave", self.room_url(room_id)))
            .header(USERNAME_HEADER, username)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(classify(response).await);
        }
        Ok(())
    }

    async fn delete_room(&self, room_id: &str, username: &str) -> Result<(), FetchError> {
        let response = self
            .client
            .delete(self.room_url(room_id))
            .header(USERNAME_HEADER, username)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(classify(response).await);
        }
        Ok(())
    }
}
