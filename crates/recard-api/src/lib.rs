//! # recard-api
//!
//! HTTP API server for recard: the REST card surface, the ingestion
//! and regeneration services, and the router/state wiring shared by the
//! binary and the integration tests.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod query_types;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use recard_core::{AiStatus, CardRepository, Result};
use recard_db::{create_pool, init_schema, PublicIdAllocator, SqliteCardRepository};
use recard_gen::{AiConfig, OllamaGenerator, RuleBasedGenerator};
use services::{IngestionService, RegenerationService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub cards: Arc<dyn CardRepository>,
    pub allocator: Arc<PublicIdAllocator>,
    pub ingestion: Arc<IngestionService>,
    pub regeneration: Arc<RegenerationService>,
    pub ai_status: Arc<dyn AiStatus>,
}

impl AppState {
    /// Assemble state from a repository and the generation
    /// collaborators. Tests inject mocks here; the binary wires the
    /// real backends via [`build_state`].
    pub fn new(
        cards: Arc<dyn CardRepository>,
        rule_based: Arc<dyn recard_core::CardGenerator>,
        ai: Arc<dyn recard_core::CardGenerator>,
        ai_status: Arc<dyn AiStatus>,
    ) -> Self {
        Self {
            allocator: Arc::new(PublicIdAllocator::new(cards.clone())),
            ingestion: Arc::new(IngestionService::new(cards.clone())),
            regeneration: Arc::new(RegenerationService::new(
                cards.clone(),
                rule_based,
                ai,
                ai_status.clone(),
            )),
            ai_status,
            cards,
        }
    }
}

/// Open the database, apply the schema, and wire the production
/// backends.
pub async fn build_state(db_path: &Path, ai_config: AiConfig) -> Result<AppState> {
    let pool = create_pool(db_path).await?;
    init_schema(&pool).await?;

    let cards: Arc<dyn CardRepository> = Arc::new(SqliteCardRepository::new(pool));
    let ollama = Arc::new(OllamaGenerator::new(&ai_config));
    let rule_based = Arc::new(RuleBasedGenerator::new());

    Ok(AppState::new(cards, rule_based, ollama.clone(), ollama))
}

/// OpenAPI documentation metadata. Endpoint annotations live on the
/// handlers themselves.
#[allow(dead_code)]
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Recard API",
        description = "Card ingestion, deduplication, and regeneration engine"
    ),
    tags(
        (name = "Cards", description = "Card CRUD, ingestion, and regeneration"),
        (name = "System", description = "Health checks and capability reports")
    )
)]
pub struct ApiDoc;

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::system::health))
        .route("/api/v1/ai/status", get(handlers::system::ai_status))
        .route(
            "/api/v1/cards",
            get(handlers::cards::list_cards).post(handlers::cards::create_card),
        )
        .route("/api/v1/cards/count", get(handlers::cards::count_cards))
        .route("/api/v1/cards/stats", get(handlers::cards::card_stats))
        .route("/api/v1/cards/ingest", post(handlers::cards::ingest_card))
        .route(
            "/api/v1/cards/:id",
            get(handlers::cards::get_card)
                .put(handlers::cards::update_card)
                .delete(handlers::cards::delete_card),
        )
        .route(
            "/api/v1/cards/:id/review",
            patch(handlers::cards::review_card),
        )
        .route("/api/v1/cards/:id/rate", patch(handlers::cards::rate_card))
        .route(
            "/api/v1/cards/:id/regenerate",
            post(handlers::cards::regenerate_card),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
