//! Structured logging schema and field name constants for recard.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log aggregation can query by standardized names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "db", "ingest", "regen", "gen"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "card_repository", "public_id", "ollama", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "ingest", "regenerate", "allocate", "list"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Internal card UUID being operated on.
pub const CARD_ID: &str = "card_id";

/// Public shareable id of the card.
pub const PUBLIC_ID: &str = "public_id";

/// Owning principal of the card(s) in scope.
pub const OWNER_ID: &str = "owner_id";

/// Dedup fingerprint in play during ingestion.
pub const CONTENT_HASH: &str = "content_hash";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a query.
pub const RESULT_COUNT: &str = "result_count";

// ─── Generation fields ─────────────────────────────────────────────────────

/// Model name used for AI generation.
pub const MODEL: &str = "model";

/// Generation strategy ("rule-based", "ai", "comparison").
pub const STRATEGY: &str = "strategy";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Whether an ingestion resolved to an existing card.
pub const IS_DUPLICATE: &str = "is_duplicate";
