use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::services::errors::move_suggester_errors::SuggesterError;
use crate::services::move_suggester::{build_prompt, parse_move, MoveSuggester, SuggestionRequest};
use crate::models::board::Coord;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MAX_TOKENS: u32 = 50;
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Move suggester backed by any OpenAI-compatible chat completions endpoint.
/// The endpoint, credential and model come from the seat's committed config.
#[derive(Clone)]
pub struct OpenAiSuggester {
    client: Client,
    default_endpoint: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl Default for OpenAiSuggester {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenAiSuggester {
    pub fn new() -> Self {
        OpenAiSuggester {
            client: Client::new(),
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_default_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.default_endpoint = endpoint.into();
        self
    }

    pub fn completions_url(&self, endpoint: &str) -> String {
        let base = if endpoint.trim().is_empty() {
            self.default_endpoint.as_str()
        } else {
            endpoint.trim()
        };
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl MoveSuggester for OpenAiSuggester {
    async fn suggest_move(&self, request: &SuggestionRequest) -> Result<Coord, SuggesterError> {
        let url = self.completions_url(&request.config.endpoint);
        let body = ChatCompletionRequest {
            model: request.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(request),
            }],
            max_tokens: self.max_tokens,
        };

        debug!(room_id = %request.room_id, model = %body.model, "Requesting move suggestion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&request.config.credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SuggesterError::Timeout
                } else {
                    SuggesterError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            warn!(room_id = %request.room_id, status = %status, "Move suggester rejected request");
            return Err(provider_error(status, &text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SuggesterError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SuggesterError::InvalidResponse("empty completion".to_string()))?;

        debug!(room_id = %request.room_id, content = %content, "Move suggestion received");
        parse_move(&content)
    }
}

fn provider_error(status: StatusCode, body: &str) -> SuggesterError {
    SuggesterError::Provider {
        status: status.as_u16(),
        message: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}
