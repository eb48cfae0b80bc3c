//! Ollama AI generation backend.
//!
//! Calls the provider's chat API with a JSON-format instruction and
//! parses the reply into a [`GeneratedCard`]. Also implements the
//! availability capability the regeneration coordinator checks before
//! entering comparison mode.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use recard_core::{AiAvailability, AiStatus, CardGenerator, Error, GeneratedCard, Result};

use crate::config::AiConfig;

const SYSTEM_PROMPT: &str = "You turn a document excerpt into one learning card. \
Reply with a single JSON object: {\"title\": string, \"content\": string, \
\"type\": one of \"concept\"|\"action\"|\"quote\"|\"checklist\"|\"mindmap\", \
\"category\": string, \"tags\": [string]}. No prose outside the JSON.";

/// Ollama generation backend.
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    enabled: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: &'a str,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

impl OllamaGenerator {
    /// Create a backend from an injected configuration.
    pub fn new(config: &AiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            enabled: config.enabled,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(&AiConfig::from_env())
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Parse the model reply into a card, tolerating markdown code fences
/// around the JSON object.
fn parse_generated_card(reply: &str) -> Result<GeneratedCard> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();
    let card: GeneratedCard = serde_json::from_str(body)
        .map_err(|e| Error::Generation(format!("model returned malformed card JSON: {}", e)))?;
    if card.title.trim().is_empty() || card.content.trim().is_empty() {
        return Err(Error::Generation(
            "model returned a card without title or content".into(),
        ));
    }
    Ok(card)
}

#[async_trait]
impl CardGenerator for OllamaGenerator {
    async fn generate(&self, snippet: &str) -> Result<GeneratedCard> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: snippet,
                },
            ],
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("AI backend unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Generation(format!(
                "AI backend returned HTTP {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("malformed AI backend response: {}", e)))?;

        let card = parse_generated_card(&chat.message.content)?;
        debug!(
            subsystem = "gen",
            component = "ollama",
            op = "generate",
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Generated card via AI backend"
        );
        Ok(card)
    }
}

#[async_trait]
impl AiStatus for OllamaGenerator {
    async fn status(&self) -> AiAvailability {
        if !self.enabled {
            return AiAvailability {
                available: false,
                provider: "ollama".into(),
                model: self.model.clone(),
                reason: Some("AI generation is disabled by configuration".into()),
            };
        }

        match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => AiAvailability {
                available: true,
                provider: "ollama".into(),
                model: self.model.clone(),
                reason: None,
            },
            Ok(response) => {
                warn!(
                    subsystem = "gen",
                    component = "ollama",
                    op = "status",
                    status = %response.status(),
                    "AI provider probe returned an error status"
                );
                AiAvailability {
                    available: false,
                    provider: "ollama".into(),
                    model: self.model.clone(),
                    reason: Some(format!("provider returned HTTP {}", response.status())),
                }
            }
            Err(e) => AiAvailability {
                available: false,
                provider: "ollama".into(),
                model: self.model.clone(),
                reason: Some(format!("provider unreachable: {}", e)),
            },
        }
    }
}
