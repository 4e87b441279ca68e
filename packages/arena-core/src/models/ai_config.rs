use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const MAX_CUSTOM_PROMPT_CHARS: usize = 200;
const MAX_FIELD_CHARS: usize = 512;

/// Per-seat move suggestion parameters. The coordinator never interprets
/// these beyond shape checks; they are handed to the `MoveSuggester` as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible endpoint. Empty means provider default.
    #[serde(default)]
    pub endpoint: String,
    pub credential: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub custom_prompt: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl AiConfig {
    pub fn new(endpoint: &str, credential: &str, model: &str) -> Self {
        AiConfig {
            endpoint: endpoint.to_string(),
            credential: credential.to_string(),
            model: model.to_string(),
            custom_prompt: String::new(),
        }
    }

    pub fn with_custom_prompt(mut self, prompt: &str) -> Self {
        self.custom_prompt = prompt.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.credential.trim().is_empty() {
            return Err("Credential cannot be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if self.custom_prompt.chars().count() > MAX_CUSTOM_PROMPT_CHARS {
            return Err(format!(
                "Custom prompt cannot exceed {} characters",
                MAX_CUSTOM_PROMPT_CHARS
            ));
        }
        for (name, value) in [
            ("Endpoint", &self.endpoint),
            ("Credential", &self.credential),
            ("Model", &self.model),
        ] {
            if value.chars().count() > MAX_FIELD_CHARS {
                return Err(format!("{} cannot exceed {} characters", name, MAX_FIELD_CHARS));
            }
        }
        if !self.endpoint.is_empty()
            && !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://"))
        {
            return Err("Endpoint must be an http(s) URL".to_string());
        }
        Ok(())
    }

    /// Copy safe to hand back to polling clients.
    pub fn redacted(&self) -> Self {
        let visible: String = self.credential.chars().take(4).collect();
        AiConfig {
            credential: format!("{}****", visible),
            ..self.clone()
        }
    }
}
