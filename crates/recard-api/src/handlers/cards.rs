//! Card HTTP handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use recard_core::defaults::{RATING_MAX, RATING_MIN};
use recard_core::NewCard;

use crate::auth::AuthedUser;
use crate::error::ApiError;
use crate::query_types::{
    CreateCardRequest, IngestRequest, ListCardsApiResponse, ListCardsQuery, PaginationMeta,
    RateRequest, RegenerateRequest, UpdateCardBody,
};
use crate::services::RegenerationOutcome;
use crate::AppState;

/// List cards with filtering, sorting, and pagination.
///
/// GET /api/v1/cards
#[utoipa::path(get, path = "/api/v1/cards", tag = "Cards",
    responses((status = 200, description = "Filtered page of cards")))]
pub async fn list_cards(
    State(state): State<AppState>,
    user: AuthedUser,
    Query(query): Query<ListCardsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page();
    let limit = query.limit();
    let request = query.into_list_request()?;
    let response = state.cards.find_by_owner(&user.id, request).await?;

    Ok(Json(ListCardsApiResponse {
        pagination: PaginationMeta::build(page, limit, response.total),
        cards: response.cards,
    }))
}

/// Count cards under the same filter semantics as the list.
///
/// GET /api/v1/cards/count
#[utoipa::path(get, path = "/api/v1/cards/count", tag = "Cards",
    responses((status = 200, description = "Match count")))]
pub async fn count_cards(
    State(state): State<AppState>,
    user: AuthedUser,
    Query(query): Query<ListCardsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filters = query.filters()?;
    let count = state.cards.count_by_owner(&user.id, &filters).await?;
    Ok(Json(json!({ "count": count })))
}

/// Aggregate counts by type and category.
///
/// GET /api/v1/cards/stats
#[utoipa::path(get, path = "/api/v1/cards/stats", tag = "Cards",
    responses((status = 200, description = "Card statistics")))]
pub async fn card_stats(
    State(state): State<AppState>,
    user: AuthedUser,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.cards.stats_by_owner(&user.id).await?;
    Ok(Json(stats))
}

/// Fetch one card by internal id or shareable card id.
///
/// GET /api/v1/cards/:id_or_card_id
#[utoipa::path(get, path = "/api/v1/cards/{id_or_card_id}", tag = "Cards",
    responses((status = 200, description = "The card"), (status = 404, description = "Absent or inaccessible")))]
pub async fn get_card(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(id_or_card_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let card = state.cards.find_one_by_owner(&id_or_card_id, &user.id).await?;
    Ok(Json(card))
}

/// Manual card creation. Bypasses the dedup lookup; a content collision
/// with an existing card surfaces as 409.
///
/// POST /api/v1/cards
#[utoipa::path(post, path = "/api/v1/cards", tag = "Cards",
    request_body = CreateCardRequest,
    responses((status = 201, description = "Created"), (status = 400, description = "Missing required field")))]
pub async fn create_card(
    State(state): State<AppState>,
    user: AuthedUser,
    Json(body): Json<CreateCardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = require_field(body.title, "title")?;
    let content = require_field(body.content, "content")?;
    let category = require_field(body.category, "category")?;

    let card_id = state.allocator.allocate().await?;
    let card = state
        .cards
        .create(NewCard {
            owner_id: user.id,
            card_id,
            title,
            content,
            card_type: body.card_type.unwrap_or_default(),
            category,
            tags: body.tags.unwrap_or_default(),
            source: body.source,
            is_public: body.is_public.unwrap_or(false),
            generated_by: Default::default(),
            provenance: None,
            attachments: vec![],
        })
        .await?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// Partial update of an owned card.
///
/// PUT /api/v1/cards/:id
#[utoipa::path(put, path = "/api/v1/cards/{id}", tag = "Cards",
    request_body = UpdateCardBody,
    responses((status = 200, description = "Updated card"), (status = 404, description = "Not found")))]
pub async fn update_card(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateCardBody>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_card_uuid(&id)?;
    let card = state.cards.update(id, &user.id, body.into()).await?;
    Ok(Json(card))
}

/// Delete an owned card. Collection membership cascades through this.
///
/// DELETE /api/v1/cards/:id
#[utoipa::path(delete, path = "/api/v1/cards/{id}", tag = "Cards",
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not found")))]
pub async fn delete_card(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.cards.delete(&id, &user.id).await?;
    Ok(Json(json!({ "success": true })))
}

/// Record a review: bump the counter, stamp the time.
///
/// PATCH /api/v1/cards/:id/review
#[utoipa::path(patch, path = "/api/v1/cards/{id}/review", tag = "Cards",
    responses((status = 200, description = "Updated card")))]
pub async fn review_card(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let card = state.cards.record_review(&id, &user.id).await?;
    Ok(Json(card))
}

/// Rate a card 1..=5.
///
/// PATCH /api/v1/cards/:id/rate
#[utoipa::path(patch, path = "/api/v1/cards/{id}/rate", tag = "Cards",
    request_body = RateRequest,
    responses((status = 200, description = "Updated card"), (status = 400, description = "Rating out of range")))]
pub async fn rate_card(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(id): Path<String>,
    Json(body): Json<RateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rating = body
        .rating
        .filter(|r| (RATING_MIN..=RATING_MAX).contains(r))
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "rating must be between {} and {}",
                RATING_MIN, RATING_MAX
            ))
        })?;
    let card = state.cards.set_rating(&id, &user.id, rating).await?;
    Ok(Json(card))
}

/// Regenerate a card from its stored snippet, optionally in comparison
/// mode, or apply a previously returned comparison.
///
/// POST /api/v1/cards/:id/regenerate
#[utoipa::path(post, path = "/api/v1/cards/{id}/regenerate", tag = "Cards",
    request_body = RegenerateRequest,
    responses(
        (status = 200, description = "Applied card, or the two-sided comparison"),
        (status = 422, description = "No snippet stored, or AI unavailable"),
        (status = 409, description = "A regeneration for this card is already in flight")))]
pub async fn regenerate_card(
    State(state): State<AppState>,
    user: AuthedUser,
    Path(id): Path<String>,
    Json(body): Json<RegenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.regeneration.regenerate(&id, &user.id, body).await?;
    match outcome {
        RegenerationOutcome::Applied(card) => Ok(Json(serde_json::to_value(card)?)),
        RegenerationOutcome::Comparison(comparison) => {
            let mut value = serde_json::to_value(comparison)?;
            value["comparison"] = json!(true);
            Ok(Json(value))
        }
    }
}

/// Ingestion entry point consumed by the upload pipeline: one call per
/// extracted candidate card.
///
/// POST /api/v1/cards/ingest
#[utoipa::path(post, path = "/api/v1/cards/ingest", tag = "Cards",
    request_body = IngestRequest,
    responses((status = 200, description = "Card created or merged")))]
pub async fn ingest_card(
    State(state): State<AppState>,
    user: AuthedUser,
    Json(body): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .ingestion
        .ingest(body.card, &user.id, body.file, &body.file_hash, &body.file_id)
        .await?;
    Ok(Json(outcome))
}

fn require_field(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", name)))
}

fn parse_card_uuid(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound(format!("Card {} not found", id)))
}
