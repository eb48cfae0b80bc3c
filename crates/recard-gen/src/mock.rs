//! Mock generation backend for deterministic testing.
//!
//! Stands in for both generation strategies and the AI availability
//! capability. Responses, failures, latency, and availability are all
//! scripted by the test; every call is logged for assertion.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use recard_core::{
    AiAvailability, AiStatus, CardGenerator, CardType, Error, GeneratedCard, Result,
};

#[derive(Debug, Clone)]
struct MockConfig {
    card: GeneratedCard,
    error: Option<String>,
    latency: Duration,
    available: bool,
    unavailable_reason: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            card: GeneratedCard {
                title: "Mock Title".to_string(),
                content: "Mock content.".to_string(),
                card_type: CardType::Concept,
                category: Some("General".to_string()),
                tags: vec!["mock".to_string()],
            },
            error: None,
            latency: Duration::ZERO,
            available: true,
            unavailable_reason: None,
        }
    }
}

/// Mock generation backend.
#[derive(Clone, Default)]
pub struct MockGenerator {
    config: Arc<MockConfig>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockGenerator {
    /// Create a mock with default configuration: always available,
    /// instant, returns a fixed concept card.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the card returned by every generate call.
    pub fn with_card(mut self, card: GeneratedCard) -> Self {
        Arc::make_mut(&mut self.config).card = card;
        self
    }

    /// Make every generate call fail with this message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).error = Some(message.into());
        self
    }

    /// Simulate backend latency on every generate call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        Arc::make_mut(&mut self.config).latency = latency;
        self
    }

    /// Report the provider as unavailable with the given reason.
    pub fn with_unavailable(mut self, reason: impl Into<String>) -> Self {
        let config = Arc::make_mut(&mut self.config);
        config.available = false;
        config.unavailable_reason = Some(reason.into());
        self
    }

    /// Snippets passed to generate, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of generate calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CardGenerator for MockGenerator {
    async fn generate(&self, snippet: &str) -> Result<GeneratedCard> {
        self.calls.lock().unwrap().push(snippet.to_string());
        if self.config.latency > Duration::ZERO {
            tokio::time::sleep(self.config.latency).await;
        }
        match &self.config.error {
            Some(message) => Err(Error::Generation(message.clone())),
            None => Ok(self.config.card.clone()),
        }
    }
}

#[async_trait]
impl AiStatus for MockGenerator {
    async fn status(&self) -> AiAvailability {
        AiAvailability {
            available: self.config.available,
            provider: "mock".to_string(),
            model: "mock-model".to_string(),
            reason: self.config.unavailable_reason.clone(),
        }
    }
}
