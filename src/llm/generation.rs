//! Generation operations built on an [`LlmProvider`].
//!
//! Two response shapes are supported:
//!
//! - freeform code: the first fenced block of the reply, or the whole
//!   trimmed reply when there is no fence
//! - JSON: the reply decoded into a caller-provided type
//!
//! Every request uses the configured model and a fixed sampling temperature.
//! Failures are returned as-is; there is no retry.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::client::{GenerationRequest, LlmProvider, Message};
use crate::challenge::Hint;
use crate::error::LlmError;
use crate::prompts::GenerationPrompt;
use crate::utils::fences::{extract_code_block, extract_json_payload};

/// Sampling temperature used for every generation request.
pub const GENERATION_TEMPERATURE: f64 = 0.2;

/// JSON shape requested by the hints prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct HintsPayload {
    #[serde(default)]
    pub hints: Vec<HintPayload>,
}

/// One hint as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct HintPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl From<HintPayload> for Hint {
    fn from(payload: HintPayload) -> Self {
        Hint::new(payload.title, payload.body)
    }
}

/// Issues code and JSON generation requests against a provider.
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl GenerationClient {
    /// Creates a client that sends every request with `model`.
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Requests freeform text and returns the first fenced code block.
    pub async fn generate_code(&self, prompt: &GenerationPrompt) -> Result<String, LlmError> {
        let request = self.request(prompt);
        let content = self.complete(request).await?;
        let code = extract_code_block(&content);
        debug!(model = %self.model, code_chars = code.len(), "Extracted generated code");
        Ok(code)
    }

    /// Requests a JSON object and decodes it into `T`.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &GenerationPrompt,
    ) -> Result<T, LlmError> {
        let request = self.request(prompt).with_json_response();
        let content = self.complete(request).await?;
        parse_json_reply(&content)
    }

    /// Requests hints and returns them in response order.
    pub async fn generate_hints(&self, prompt: &GenerationPrompt) -> Result<Vec<Hint>, LlmError> {
        let payload: HintsPayload = self.generate_json(prompt).await?;
        Ok(payload.hints.into_iter().map(Hint::from).collect())
    }

    fn request(&self, prompt: &GenerationPrompt) -> GenerationRequest {
        GenerationRequest::new(
            self.model.clone(),
            vec![
                Message::system(prompt.system.clone()),
                Message::user(prompt.user.clone()),
            ],
        )
        .with_temperature(GENERATION_TEMPERATURE)
    }

    async fn complete(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let response = self.provider.generate(request).await?;
        response
            .first_content()
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }
}

fn parse_json_reply<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    let payload = extract_json_payload(content).ok_or_else(|| {
        let preview: String = content.trim().chars().take(100).collect();
        LlmError::ParseError(format!(
            "No JSON found in response. Content starts with: '{}'",
            preview
        ))
    })?;
    serde_json::from_str(&payload)
        .map_err(|e| LlmError::ParseError(format!("Invalid JSON: {}", e)))
}
