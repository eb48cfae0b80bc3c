//! # recard-gen
//!
//! Generation backend abstraction for recard.
//!
//! This crate provides:
//! - The deterministic rule-based generator (always available)
//! - The Ollama AI backend with an availability probe
//! - Explicit AI provider configuration, injected rather than read from
//!   disk by the engine
//! - A mock backend for tests (feature `mock`)
//!
//! Both strategies implement [`recard_core::CardGenerator`]; the AI
//! side additionally implements [`recard_core::AiStatus`].

pub mod config;
pub mod ollama;
pub mod rule_based;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::AiConfig;
pub use ollama::OllamaGenerator;
pub use rule_based::RuleBasedGenerator;

// Re-export core types for consumers of this crate
pub use recard_core::{AiAvailability, AiStatus, CardGenerator, GeneratedCard};
