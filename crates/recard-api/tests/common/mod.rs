//! Shared test harness: a real router over a throwaway database with
//! scripted generation backends.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::StatusCode;
use axum::Router;
use http::{Method, Request};
use serde_json::Value;
use tower::ServiceExt;

use recard_api::services::{IngestionService, RegenerationService};
use recard_api::AppState;
use recard_core::{Card, CardRepository};
use recard_db::test_fixtures::{sample_new_card, sample_provenance, TestDatabase};
use recard_db::PublicIdAllocator;
use recard_gen::mock::MockGenerator;

pub const OWNER: &str = "user-1";
pub const OTHER_OWNER: &str = "user-2";

pub struct TestApp {
    pub router: Router,
    pub db: TestDatabase,
    pub rule: MockGenerator,
    pub ai: MockGenerator,
}

pub async fn setup() -> TestApp {
    setup_with(MockGenerator::new(), MockGenerator::new(), None).await
}

/// Build the app with scripted backends and an optional comparison
/// ceiling override.
pub async fn setup_with(
    rule: MockGenerator,
    ai: MockGenerator,
    comparison_timeout: Option<Duration>,
) -> TestApp {
    let db = TestDatabase::new().await;
    let cards: Arc<dyn CardRepository> = db.cards.clone();

    let mut regeneration = RegenerationService::new(
        cards.clone(),
        Arc::new(rule.clone()),
        Arc::new(ai.clone()),
        Arc::new(ai.clone()),
    );
    if let Some(timeout) = comparison_timeout {
        regeneration = regeneration.with_comparison_timeout(timeout);
    }

    let state = AppState {
        allocator: Arc::new(PublicIdAllocator::new(cards.clone())),
        ingestion: Arc::new(IngestionService::new(cards.clone())),
        regeneration: Arc::new(regeneration),
        ai_status: Arc::new(ai.clone()),
        cards,
    };

    TestApp {
        router: recard_api::create_router(state),
        db,
        rule,
        ai,
    }
}

/// Fire one request at the router and decode the JSON response.
pub async fn request(
    router: &Router,
    method: Method,
    path: &str,
    principal: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(principal) = principal {
        builder = builder.header("x-principal-id", principal);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Insert a card with a stored regeneration snippet directly through
/// the repository.
pub async fn seed_card_with_snippet(
    db: &TestDatabase,
    owner: &str,
    card_id: &str,
    snippet: &str,
) -> Card {
    let mut new = sample_new_card(owner, card_id, "Seed Title", &format!("Seed body {}", card_id));
    new.provenance = Some(sample_provenance("file-seed", "sha256:seed", snippet));
    db.cards.create(new).await.unwrap()
}

/// Insert a card without provenance (nothing to regenerate from).
pub async fn seed_card_without_snippet(db: &TestDatabase, owner: &str, card_id: &str) -> Card {
    db.cards
        .create(sample_new_card(
            owner,
            card_id,
            "Bare Title",
            &format!("Bare body {}", card_id),
        ))
        .await
        .unwrap()
}
