//! Integration tests for the regenerate/compare/apply workflow.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use http::Method;
use serde_json::json;

use common::{request, setup, setup_with, seed_card_with_snippet, seed_card_without_snippet, OWNER};
use recard_core::{CardType, GeneratedCard};
use recard_core::CardRepository;
use recard_gen::mock::MockGenerator;

fn rule_card() -> GeneratedCard {
    GeneratedCard {
        title: "Rule Title".into(),
        content: "Rule content.".into(),
        card_type: CardType::Concept,
        category: Some("General".into()),
        tags: vec!["rule".into()],
    }
}

fn ai_card() -> GeneratedCard {
    GeneratedCard {
        title: "AI Title".into(),
        content: "AI content.".into(),
        card_type: CardType::Action,
        category: Some("General".into()),
        tags: vec!["ai".into()],
    }
}

#[tokio::test]
async fn test_rule_based_regenerate_applies_directly() {
    let app = setup_with(
        MockGenerator::new().with_card(rule_card()),
        MockGenerator::new().with_card(ai_card()),
        None,
    )
    .await;
    let card = seed_card_with_snippet(&app.db, OWNER, "RGN001", "the stored snippet").await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Rule Title");
    assert_eq!(body["generatedBy"], "rule-based");
    // The generator ran against the stored snippet, nothing else.
    assert_eq!(app.rule.calls(), vec!["the stored snippet"]);
    assert_eq!(app.ai.call_count(), 0);
}

#[tokio::test]
async fn test_regenerate_without_snippet_fails_fast() {
    let app = setup().await;
    let card = seed_card_without_snippet(&app.db, OWNER, "RGN002").await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("snippet"));
    assert_eq!(app.rule.call_count(), 0);
}

#[tokio::test]
async fn test_ai_regenerate_requires_available_backend() {
    let app = setup_with(
        MockGenerator::new().with_card(rule_card()),
        MockGenerator::new().with_unavailable("maintenance window"),
        None,
    )
    .await;
    let card = seed_card_with_snippet(&app.db, OWNER, "RGN003", "snippet").await;

    for body in [json!({ "useAI": true }), json!({ "comparisonMode": true })] {
        let (status, response) = request(
            &app.router,
            Method::POST,
            &format!("/api/v1/cards/{}/regenerate", card.id),
            Some(OWNER),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response["error"]
            .as_str()
            .unwrap()
            .contains("maintenance window"));
    }
    // Neither backend was called.
    assert_eq!(app.ai.call_count(), 0);
    assert_eq!(app.rule.call_count(), 0);
}

#[tokio::test]
async fn test_comparison_returns_both_sides() {
    let app = setup_with(
        MockGenerator::new().with_card(rule_card()),
        MockGenerator::new().with_card(ai_card()),
        None,
    )
    .await;
    let card = seed_card_with_snippet(&app.db, OWNER, "RGN004", "snippet").await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({ "comparisonMode": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comparison"], true);
    assert_eq!(body["ruleBased"]["title"], "Rule Title");
    assert_eq!(body["ai"]["title"], "AI Title");
    assert!(body["aiError"].is_null());

    // Nothing was applied yet.
    let unchanged = app
        .db
        .cards
        .find_one_by_owner(&card.id.to_string(), OWNER)
        .await
        .unwrap();
    assert_eq!(unchanged.title, card.title);
}

#[tokio::test]
async fn test_comparison_isolates_ai_failure_and_rejects_applying_it() {
    let app = setup_with(
        MockGenerator::new().with_card(rule_card()),
        MockGenerator::new().with_error("model exploded"),
        None,
    )
    .await;
    let card = seed_card_with_snippet(&app.db, OWNER, "RGN005", "snippet").await;

    let (status, comparison) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({ "comparisonMode": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comparison["comparison"], true);
    assert_eq!(comparison["ruleBased"]["title"], "Rule Title");
    assert!(comparison["ai"].is_null());
    assert!(comparison["aiError"]
        .as_str()
        .unwrap()
        .contains("model exploded"));

    // Applying the missing AI side is rejected.
    let (status, body) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({
            "selectedVersion": "ai",
            "comparisonData": comparison
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    // Applying the rule-based side succeeds and stamps the strategy.
    let (status, applied) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({
            "selectedVersion": "ruleBased",
            "comparisonData": comparison
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(applied["title"], "Rule Title");
    assert_eq!(applied["generatedBy"], "rule-based");
}

#[tokio::test]
async fn test_comparison_cancel_leaves_card_untouched() {
    let app = setup_with(
        MockGenerator::new().with_card(rule_card()),
        MockGenerator::new().with_card(ai_card()),
        None,
    )
    .await;
    let card = seed_card_with_snippet(&app.db, OWNER, "RGN006", "snippet").await;

    let (_, _comparison) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({ "comparisonMode": true })),
    )
    .await;

    // Cancel is client-side: the attempt is simply dropped. The card
    // must be untouched and a fresh regeneration must be accepted.
    let unchanged = app
        .db
        .cards
        .find_one_by_owner(&card.id.to_string(), OWNER)
        .await
        .unwrap();
    assert_eq!(unchanged.title, card.title);
    assert_eq!(unchanged.version, card.version);

    let (status, _) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({ "comparisonMode": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_comparison_timeout_discards_late_ai_response() {
    let app = setup_with(
        MockGenerator::new().with_card(rule_card()),
        MockGenerator::new()
            .with_card(ai_card())
            .with_latency(Duration::from_millis(300)),
        Some(Duration::from_millis(50)),
    )
    .await;
    let card = seed_card_with_snippet(&app.db, OWNER, "RGN007", "snippet").await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({ "comparisonMode": true })),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["error"].as_str().unwrap().contains("abandoned"));

    // Wait past the backend's would-be completion: the late response
    // must not mutate the card nor resurrect any comparison state.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let current = app
        .db
        .cards
        .find_one_by_owner(&card.id.to_string(), OWNER)
        .await
        .unwrap();
    assert_eq!(current.title, card.title);
    assert_eq!(current.version, card.version);

    // The abandoned attempt released the in-flight guard.
    let (status, _) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_second_regenerate_rejected_while_in_flight() {
    let app = setup_with(
        MockGenerator::new()
            .with_card(rule_card())
            .with_latency(Duration::from_millis(200)),
        MockGenerator::new().with_card(ai_card()),
        None,
    )
    .await;
    let card = seed_card_with_snippet(&app.db, OWNER, "RGN008", "snippet").await;

    let path = format!("/api/v1/cards/{}/regenerate", card.id);
    let (first, second) = tokio::join!(
        request(&app.router, Method::POST, &path, Some(OWNER), Some(json!({}))),
        async {
            // Let the first request take the guard.
            tokio::time::sleep(Duration::from_millis(50)).await;
            request(&app.router, Method::POST, &path, Some(OWNER), Some(json!({}))).await
        }
    );

    let statuses = [first.0, second.0];
    assert!(statuses.contains(&StatusCode::OK));
    assert!(statuses.contains(&StatusCode::CONFLICT), "got {:?}", statuses);
}

#[tokio::test]
async fn test_both_sides_failing_is_a_total_failure() {
    let app = setup_with(
        MockGenerator::new().with_error("rules broke"),
        MockGenerator::new().with_error("model broke"),
        None,
    )
    .await;
    let card = seed_card_with_snippet(&app.db, OWNER, "RGN009", "snippet").await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({ "comparisonMode": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("both"));
}

#[tokio::test]
async fn test_apply_requires_comparison_data() {
    let app = setup().await;
    let card = seed_card_with_snippet(&app.db, OWNER, "RGN010", "snippet").await;

    let (status, body) = request(
        &app.router,
        Method::POST,
        &format!("/api/v1/cards/{}/regenerate", card.id),
        Some(OWNER),
        Some(json!({ "selectedVersion": "ruleBased" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("comparisonData"));
}
