//! Core data models for recard.
//!
//! The `Card` entity and its satellite records (provenance, attachments,
//! review metadata), the candidate payload emitted by the upload
//! pipeline, and the generation result types exchanged with the
//! rule-based and AI backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// CARD ENUMS
// =============================================================================

/// The fixed card taxonomy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    #[default]
    Concept,
    Action,
    Quote,
    Checklist,
    Mindmap,
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concept => write!(f, "concept"),
            Self::Action => write!(f, "action"),
            Self::Quote => write!(f, "quote"),
            Self::Checklist => write!(f, "checklist"),
            Self::Mindmap => write!(f, "mindmap"),
        }
    }
}

impl std::str::FromStr for CardType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "concept" => Ok(Self::Concept),
            "action" => Ok(Self::Action),
            "quote" => Ok(Self::Quote),
            "checklist" => Ok(Self::Checklist),
            "mindmap" => Ok(Self::Mindmap),
            _ => Err(format!("Invalid card type: {}", s)),
        }
    }
}

/// Which generation strategy produced the card's *current* content.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratedBy {
    #[default]
    RuleBased,
    Ai,
}

impl std::fmt::Display for GeneratedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RuleBased => write!(f, "rule-based"),
            Self::Ai => write!(f, "ai"),
        }
    }
}

impl std::str::FromStr for GeneratedBy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rule-based" | "rule_based" => Ok(Self::RuleBased),
            "ai" => Ok(Self::Ai),
            _ => Err(format!("Invalid generation strategy: {}", s)),
        }
    }
}

// =============================================================================
// SATELLITE RECORDS
// =============================================================================

/// Structured evidence of where a card's content came from.
///
/// `source_file_id` and `file_hash` identify the originating upload and
/// are first-write-wins under merge. `snippet` is the verbatim excerpt
/// regeneration runs against. Field names stay snake_case on the wire:
/// this record crosses the boundary to the extraction pipeline as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Provenance {
    pub source_file_id: Option<String>,
    pub source_path: Option<String>,
    pub file_hash: Option<String>,
    /// Page/offset locator within the source file.
    pub location: Option<String>,
    /// Verbatim excerpt used to (re)generate this card.
    pub snippet: Option<String>,
    pub model_name: Option<String>,
    pub prompt_version: Option<String>,
    /// Extraction confidence in 0..=1, when the producer reports one.
    pub confidence_score: Option<f64>,
}

/// One file attached to a card. Append-only under merge, keyed by
/// `filename` (no duplicate filenames per card).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i64,
    pub path: String,
}

/// Review/rating metadata for a card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardMetadata {
    /// User rating in 1..=5, absent until first rated.
    pub rating: Option<i32>,
    /// Monotonically increasing review counter.
    pub review_count: i64,
    /// Set only by an explicit review action.
    pub last_reviewed: Option<DateTime<Utc>>,
}

// =============================================================================
// CARD
// =============================================================================

/// The central entity: one extracted or curated unit of knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Storage-internal identifier, never user-assigned.
    pub id: Uuid,
    /// Short shareable identifier: 6 uppercase alphanumeric characters,
    /// compared case-insensitively, stable for the card's lifetime.
    pub card_id: String,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub category: String,
    /// Canonicalized tag set (lowercased, sorted, deduplicated).
    pub tags: Vec<String>,
    /// Human-readable provenance label, comma-joined originating
    /// filenames after merges.
    pub source: Option<String>,
    pub is_public: bool,
    /// Fingerprint of normalized title+content. Derived, never
    /// user-editable; unique per owner.
    pub content_hash: String,
    pub generated_by: GeneratedBy,
    pub provenance: Option<Provenance>,
    pub attachments: Vec<Attachment>,
    pub metadata: CardMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency counter, bumped on every write. Internal;
    /// not part of the wire format.
    #[serde(skip)]
    pub version: i64,
}

// =============================================================================
// INGESTION PAYLOADS
// =============================================================================

/// Provenance fragment carried by a candidate card. The ingestion
/// orchestrator combines it with the upload descriptor to build the
/// stored [`Provenance`] record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CandidateProvenance {
    pub location: Option<String>,
    pub snippet: Option<String>,
    pub model_name: Option<String>,
    pub prompt_version: Option<String>,
    pub confidence_score: Option<f64>,
}

/// One candidate card emitted by the file-extraction pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCard {
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub card_type: Option<CardType>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Explicit strategy marker; defaults to rule-based when absent.
    #[serde(default)]
    pub generated_by: Option<GeneratedBy>,
    #[serde(default)]
    pub provenance: Option<CandidateProvenance>,
}

/// Descriptor of the uploaded file a candidate card was extracted from.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i64,
    pub path: String,
}

/// Outcome of one ingestion call: the persisted card and whether it was
/// a merge into an existing row.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub card: Card,
    pub is_duplicate: bool,
}

// =============================================================================
// GENERATION RESULTS
// =============================================================================

/// Output of one generation backend run against a snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCard {
    pub title: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub card_type: CardType,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The two-sided comparison produced by comparison-mode regeneration.
///
/// Either side may be absent when its backend failed; the corresponding
/// error field carries the reason. Ephemeral: the client echoes this
/// back on apply, nothing is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub rule_based: Option<GeneratedCard>,
    pub rule_based_error: Option<String>,
    pub ai: Option<GeneratedCard>,
    pub ai_error: Option<String>,
}

/// AI capability report from the configured provider.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiAvailability {
    pub available: bool,
    pub provider: String,
    pub model: String,
    /// Human-readable reason when unavailable.
    pub reason: Option<String>,
}

/// Per-owner aggregate counts for the card dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardStats {
    pub total: i64,
    pub by_type: std::collections::BTreeMap<String, i64>,
    pub by_category: std::collections::BTreeMap<String, i64>,
}
