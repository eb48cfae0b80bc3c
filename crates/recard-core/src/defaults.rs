//! Centralized default constants for the recard system.
//!
//! **This module is the single source of truth** for shared default
//! values. Crates reference these constants instead of defining their
//! own magic numbers.

// =============================================================================
// PUBLIC IDS
// =============================================================================

/// Length of the shareable card id.
pub const CARD_ID_LENGTH: usize = 6;

/// How many allocation attempts before uniqueness-probe exhaustion is
/// treated as a fatal configuration error.
pub const CARD_ID_MAX_ATTEMPTS: u32 = 8;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for the card list endpoint.
pub const PAGE_LIMIT: i64 = 20;

/// Hard ceiling on requested page size.
pub const PAGE_LIMIT_MAX: i64 = 100;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// REGENERATION
// =============================================================================

/// Client-visible ceiling on comparison-mode regeneration. Past this,
/// the attempt is abandoned and any late backend response is discarded.
pub const COMPARISON_TIMEOUT_SECS: u64 = 60;

/// Timeout for a single generation backend call.
pub const GEN_TIMEOUT_SECS: u64 = 45;

// =============================================================================
// AI PROVIDER
// =============================================================================

/// Default Ollama endpoint.
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default generation model.
pub const GEN_MODEL: &str = "llama3.1:8b";

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 4000;

/// Default SQLite database path.
pub const DATABASE_PATH: &str = "data/recard.db";

// =============================================================================
// RATING
// =============================================================================

/// Inclusive rating bounds.
pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 5;
