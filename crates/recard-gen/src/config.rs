//! AI provider configuration.
//!
//! Read from the environment once at startup and injected into the
//! engine as an explicit value. The engine itself never touches
//! configuration files; everything it can ask about the provider goes
//! through the [`recard_core::AiStatus`] capability.

use std::time::Duration;

use recard_core::defaults::{GEN_MODEL, GEN_TIMEOUT_SECS, OLLAMA_URL};

/// Configuration for the AI generation backend.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Whether AI generation is enabled at all. When false, the status
    /// capability reports unavailable without probing the provider.
    pub enabled: bool,
    /// Base URL of the provider's API.
    pub base_url: String,
    /// Generation model slug.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: OLLAMA_URL.to_string(),
            model: GEN_MODEL.to_string(),
            timeout: Duration::from_secs(GEN_TIMEOUT_SECS),
        }
    }
}

impl AiConfig {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        let enabled = std::env::var("RECARD_AI_ENABLED")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);
        let base_url = std::env::var("RECARD_OLLAMA_URL").unwrap_or_else(|_| OLLAMA_URL.to_string());
        let model = std::env::var("RECARD_GEN_MODEL").unwrap_or_else(|_| GEN_MODEL.to_string());
        let timeout = std::env::var("RECARD_GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(GEN_TIMEOUT_SECS));

        Self {
            enabled,
            base_url,
            model,
            timeout,
        }
    }
}
