//! Request/response types for the HTTP surface.
//!
//! Wire names are camelCase to match the clients of the original
//! system; the `type` key maps to `card_type` internally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use recard_core::defaults::{PAGE_LIMIT, PAGE_LIMIT_MAX};
use recard_core::{
    Card, CardFilters, CardType, ComparisonResult, ListCardsRequest,
};

use crate::error::ApiError;

// =============================================================================
// LIST / COUNT
// =============================================================================

/// Query parameters for the card list and count endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCardsQuery {
    #[serde(rename = "type")]
    pub card_type: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub source: Option<String>,
    pub source_file_type: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    /// 1-based page number.
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListCardsQuery {
    pub fn filters(&self) -> Result<CardFilters, ApiError> {
        let card_type = self
            .card_type
            .as_deref()
            .map(str::parse::<CardType>)
            .transpose()
            .map_err(ApiError::BadRequest)?;
        Ok(CardFilters {
            card_type,
            category: self.category.clone(),
            search: self.search.clone(),
            source: self.source.clone(),
            source_file_type: self.source_file_type.clone(),
            date_from: self.date_from,
            date_to: self.date_to,
        })
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(PAGE_LIMIT).clamp(1, PAGE_LIMIT_MAX)
    }

    pub fn into_list_request(self) -> Result<ListCardsRequest, ApiError> {
        let filters = self.filters()?;
        let limit = self.limit();
        let offset = (self.page() - 1) * limit;
        Ok(ListCardsRequest {
            filters,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            limit: Some(limit),
            offset: Some(offset),
        })
    }
}

/// Page metadata returned alongside card lists.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current: i64,
    pub total: i64,
    pub total_count: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn build(page: i64, limit: i64, total_count: i64) -> Self {
        let total = if total_count == 0 {
            0
        } else {
            (total_count + limit - 1) / limit
        };
        Self {
            current: page,
            total,
            total_count,
            has_next: page < total,
            has_prev: page > 1 && total > 0,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListCardsApiResponse {
    pub cards: Vec<Card>,
    pub pagination: PaginationMeta,
}

// =============================================================================
// CREATE / UPDATE / RATE
// =============================================================================

/// Body for manual card creation (bypasses dedup lookup).
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub card_type: Option<CardType>,
    pub tags: Option<Vec<String>>,
    pub source: Option<String>,
    pub is_public: Option<bool>,
}

/// Body for partial card update.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardBody {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub card_type: Option<CardType>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub source: Option<String>,
    pub is_public: Option<bool>,
}

impl From<UpdateCardBody> for recard_core::UpdateCardRequest {
    fn from(body: UpdateCardBody) -> Self {
        Self {
            title: body.title,
            content: body.content,
            card_type: body.card_type,
            category: body.category,
            tags: body.tags,
            source: body.source,
            is_public: body.is_public,
        }
    }
}

/// Body for the rate endpoint.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RateRequest {
    pub rating: Option<i32>,
}

// =============================================================================
// REGENERATION / INGESTION
// =============================================================================

/// Body for the regenerate endpoint. With no flags this runs the
/// simple rule-based path; `comparisonMode` runs both strategies and
/// returns the comparison; `selectedVersion` + `comparisonData` applies
/// a previously returned comparison.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegenerateRequest {
    #[serde(rename = "useAI")]
    pub use_ai: bool,
    pub comparison_mode: bool,
    /// "ruleBased" or "ai".
    pub selected_version: Option<String>,
    pub comparison_data: Option<ComparisonResult>,
}

/// Body for the upload pipeline's ingestion entry point.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub card: recard_core::CandidateCard,
    pub file: recard_core::UploadedFile,
    pub file_hash: String,
    pub file_id: String,
}
