//! Core traits for recard abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability: the card
//! store (SQLite in recard-db), and the generation/availability
//! collaborators (recard-gen, mocked in tests).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CARD REPOSITORY
// =============================================================================

/// Filters applied to list/count queries. List and count interpret these
/// through one shared query builder, so they can never disagree on which
/// rows match.
#[derive(Debug, Clone, Default)]
pub struct CardFilters {
    pub card_type: Option<CardType>,
    /// Exact category match, case-insensitive.
    pub category: Option<String>,
    /// Case-insensitive substring over title, content, and any tag.
    pub search: Option<String>,
    /// Case-insensitive substring over the source label.
    pub source: Option<String>,
    /// Attachment filename extension, e.g. "pdf".
    pub source_file_type: Option<String>,
    /// Inclusive creation-time bounds.
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Request for listing cards.
#[derive(Debug, Clone, Default)]
pub struct ListCardsRequest {
    pub filters: CardFilters,
    /// Sort field: "created_at" (default), "updated_at", "title",
    /// "rating", "review_count". Ties always break on id.
    pub sort_by: Option<String>,
    /// "asc" or "desc" (default).
    pub sort_order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response for listing cards. `total` is the unpaginated match count
/// under the same filters.
#[derive(Debug, Clone)]
pub struct ListCardsResponse {
    pub cards: Vec<Card>,
    pub total: i64,
}

/// A fully assembled card ready for insertion. The repository derives
/// `id`, `content_hash`, and the timestamps itself.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub owner_id: String,
    /// Pre-allocated public id (see PublicIdAllocator).
    pub card_id: String,
    pub title: String,
    pub content: String,
    pub card_type: CardType,
    pub category: String,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub is_public: bool,
    pub generated_by: GeneratedBy,
    pub provenance: Option<Provenance>,
    pub attachments: Vec<Attachment>,
}

/// Partial update; only provided fields change. A title or content
/// change recomputes `content_hash` so manual edits stay
/// dedup-consistent going forward.
#[derive(Debug, Clone, Default)]
pub struct UpdateCardRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub card_type: Option<CardType>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub source: Option<String>,
    pub is_public: Option<bool>,
}

/// The merged evidence written back to an existing card on re-ingest.
/// Applied as one single-row write so no partially-merged state is
/// observable.
#[derive(Debug, Clone)]
pub struct MergePatch {
    pub attachments: Vec<Attachment>,
    pub source: Option<String>,
    pub provenance: Option<Provenance>,
}

/// Repository for card persistence, scoped to an owning user.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Insert a new card. A `(owner_id, content_hash)` collision
    /// surfaces as `Error::Conflict` — the ingestion race backstop.
    async fn create(&self, card: NewCard) -> Result<Card>;

    /// Resolve a card by internal id or public card id. Public-id
    /// shaped identifiers resolve case-insensitively via `card_id` and
    /// permit the read when the owner matches or the card is public;
    /// everything else resolves via internal id restricted to the
    /// owner.
    async fn find_one_by_owner(&self, id_or_card_id: &str, owner_id: &str) -> Result<Card>;

    /// List cards with filtering, sorting, and pagination.
    async fn find_by_owner(&self, owner_id: &str, req: ListCardsRequest)
        -> Result<ListCardsResponse>;

    /// Count cards under the same filter semantics as `find_by_owner`.
    async fn count_by_owner(&self, owner_id: &str, filters: &CardFilters) -> Result<i64>;

    /// Aggregate counts by type and category.
    async fn stats_by_owner(&self, owner_id: &str) -> Result<CardStats>;

    /// Partial update of an owned card.
    async fn update(&self, id: Uuid, owner_id: &str, patch: UpdateCardRequest) -> Result<Card>;

    /// Delete an owned card. Collections cascade through this.
    async fn delete(&self, id_or_card_id: &str, owner_id: &str) -> Result<()>;

    /// The existing card with this content hash for this owner, if any.
    async fn find_duplicate(&self, content_hash: &str, owner_id: &str) -> Result<Option<Card>>;

    /// Write merged attachments/source/provenance in one row write.
    async fn merge_ingest(&self, id: Uuid, patch: MergePatch) -> Result<Card>;

    /// Increment the review counter and stamp the review time.
    async fn record_review(&self, id_or_card_id: &str, owner_id: &str) -> Result<Card>;

    /// Set the user rating (validated by the caller to 1..=5).
    async fn set_rating(&self, id_or_card_id: &str, owner_id: &str, rating: i32) -> Result<Card>;

    /// Apply a generation result to the card: title/content/type/
    /// category/tags plus `generated_by`, guarded by a version
    /// compare-and-swap. A concurrent modification surfaces as
    /// `Error::Conflict` and nothing is written.
    async fn apply_generated(
        &self,
        id: Uuid,
        owner_id: &str,
        generated: &GeneratedCard,
        generated_by: GeneratedBy,
        expected_version: i64,
    ) -> Result<Card>;

    /// Global existence probe for public id allocation.
    async fn card_id_exists(&self, card_id: &str) -> Result<bool>;
}

// =============================================================================
// GENERATION COLLABORATORS
// =============================================================================

/// One generation strategy: produce a card's title/content/tags from a
/// stored snippet. Both the deterministic rule-based generator and the
/// AI backend implement this; the coordinator treats them as opaque
/// collaborators reached over a call boundary.
#[async_trait]
pub trait CardGenerator: Send + Sync {
    async fn generate(&self, snippet: &str) -> Result<GeneratedCard>;
}

/// Availability capability for the AI provider. Injected explicitly so
/// the engine never reads provider configuration off disk itself.
#[async_trait]
pub trait AiStatus: Send + Sync {
    async fn status(&self) -> AiAvailability;
}
