//! Integration tests for the SQLite card repository.

use chrono::{Duration, Utc};
use std::collections::HashSet;

use recard_core::{
    CardFilters, CardType, Error, GeneratedBy, GeneratedCard, ListCardsRequest, MergePatch,
    UpdateCardRequest,
};
use recard_db::test_fixtures::{
    sample_attachment, sample_new_card, sample_provenance, TestDatabase,
};
use recard_db::CardRepository;

const OWNER: &str = "user-1";
const OTHER_OWNER: &str = "user-2";

#[tokio::test]
async fn test_create_and_fetch_round_trip() {
    let db = TestDatabase::new().await;

    let mut new = sample_new_card(OWNER, "ab12cd", "Review Cycle", "Conduct quarterly reviews.");
    new.tags = vec!["Review".into(), "policy".into(), "review".into()];
    new.provenance = Some(sample_provenance("file-1", "sha256:abc", "the snippet"));
    new.attachments = vec![sample_attachment("a.pdf", "policy.pdf")];
    let created = db.cards.create(new).await.unwrap();

    // Public id is stored in canonical uppercase.
    assert_eq!(created.card_id, "AB12CD");
    assert!(created.content_hash.starts_with("sha256:"));
    // Tags are canonicalized to a sorted lowercase set.
    assert_eq!(created.tags, vec!["policy", "review"]);

    let fetched = db
        .cards
        .find_one_by_owner(&created.id.to_string(), OWNER)
        .await
        .unwrap();
    assert_eq!(fetched.title, "Review Cycle");
    assert_eq!(fetched.attachments.len(), 1);
    assert_eq!(
        fetched.provenance.as_ref().unwrap().source_file_id.as_deref(),
        Some("file-1")
    );
    assert_eq!(fetched.metadata.review_count, 0);
    assert_eq!(fetched.content_hash, created.content_hash);
}

#[tokio::test]
async fn test_card_id_lookup_is_case_insensitive() {
    let db = TestDatabase::new().await;
    db.cards
        .create(sample_new_card(OWNER, "AB12CD", "T", "C"))
        .await
        .unwrap();

    let upper = db.cards.find_one_by_owner("AB12CD", OWNER).await.unwrap();
    let lower = db.cards.find_one_by_owner("ab12cd", OWNER).await.unwrap();
    assert_eq!(upper.id, lower.id);
}

#[tokio::test]
async fn test_public_card_readable_by_non_owner_via_card_id_only() {
    let db = TestDatabase::new().await;
    let mut new = sample_new_card(OWNER, "PUB001", "Shared", "Visible to everyone.");
    new.is_public = true;
    let card = db.cards.create(new).await.unwrap();

    // Readable through the shareable id.
    let read = db
        .cards
        .find_one_by_owner("pub001", OTHER_OWNER)
        .await
        .unwrap();
    assert_eq!(read.id, card.id);

    // The internal id stays owner-scoped even for public cards.
    let err = db
        .cards
        .find_one_by_owner(&card.id.to_string(), OTHER_OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_private_card_hidden_from_non_owner() {
    let db = TestDatabase::new().await;
    db.cards
        .create(sample_new_card(OWNER, "PRIV01", "Secret", "Mine."))
        .await
        .unwrap();

    let err = db
        .cards
        .find_one_by_owner("PRIV01", OTHER_OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_duplicate_content_hash_rejected_per_owner() {
    let db = TestDatabase::new().await;
    db.cards
        .create(sample_new_card(OWNER, "AAAAA1", "Same", "Content."))
        .await
        .unwrap();

    // Identical normalized content for the same owner violates the
    // dedup index.
    let err = db
        .cards
        .create(sample_new_card(OWNER, "AAAAA2", "same ", "  content."))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // A different owner may hold the same content.
    db.cards
        .create(sample_new_card(OTHER_OWNER, "AAAAA3", "Same", "Content."))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_find_duplicate_by_hash() {
    let db = TestDatabase::new().await;
    let created = db
        .cards
        .create(sample_new_card(OWNER, "DUP001", "Review Cycle", "Quarterly."))
        .await
        .unwrap();

    let hit = db
        .cards
        .find_duplicate(&created.content_hash, OWNER)
        .await
        .unwrap();
    assert_eq!(hit.unwrap().id, created.id);

    let miss = db
        .cards
        .find_duplicate(&created.content_hash, OTHER_OWNER)
        .await
        .unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn test_update_recomputes_content_hash_on_edit() {
    let db = TestDatabase::new().await;
    let created = db
        .cards
        .create(sample_new_card(OWNER, "EDIT01", "Title", "Body."))
        .await
        .unwrap();

    let unchanged = db
        .cards
        .update(
            created.id,
            OWNER,
            UpdateCardRequest {
                category: Some("Ops".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unchanged.content_hash, created.content_hash);
    assert_eq!(unchanged.category, "Ops");

    let edited = db
        .cards
        .update(
            created.id,
            OWNER,
            UpdateCardRequest {
                content: Some("Rewritten body.".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_ne!(edited.content_hash, created.content_hash);
    assert_eq!(
        edited.content_hash,
        recard_core::fingerprint("Title", "Rewritten body.")
    );
}

#[tokio::test]
async fn test_merge_ingest_is_single_row_write() {
    let db = TestDatabase::new().await;
    let mut new = sample_new_card(OWNER, "MRG001", "T", "C");
    new.source = Some("policy.pdf".into());
    new.attachments = vec![sample_attachment("a.pdf", "policy.pdf")];
    let created = db.cards.create(new).await.unwrap();

    let merged = db
        .cards
        .merge_ingest(
            created.id,
            MergePatch {
                attachments: vec![
                    sample_attachment("a.pdf", "policy.pdf"),
                    sample_attachment("b.pdf", "policy_v2.pdf"),
                ],
                source: Some("policy.pdf, policy_v2.pdf".into()),
                provenance: Some(sample_provenance("file-1", "sha256:abc", "snippet")),
            },
        )
        .await
        .unwrap();

    assert_eq!(merged.attachments.len(), 2);
    assert_eq!(merged.source.as_deref(), Some("policy.pdf, policy_v2.pdf"));
    assert!(merged.provenance.is_some());
    assert!(merged.version > created.version);
}

#[tokio::test]
async fn test_review_and_rating() {
    let db = TestDatabase::new().await;
    let created = db
        .cards
        .create(sample_new_card(OWNER, "REV001", "T", "C"))
        .await
        .unwrap();
    assert!(created.metadata.last_reviewed.is_none());

    let once = db.cards.record_review("REV001", OWNER).await.unwrap();
    assert_eq!(once.metadata.review_count, 1);
    assert!(once.metadata.last_reviewed.is_some());

    let twice = db.cards.record_review("REV001", OWNER).await.unwrap();
    assert_eq!(twice.metadata.review_count, 2);

    let rated = db.cards.set_rating("REV001", OWNER, 4).await.unwrap();
    assert_eq!(rated.metadata.rating, Some(4));
    // Review metadata survives rating.
    assert_eq!(rated.metadata.review_count, 2);
}

#[tokio::test]
async fn test_apply_generated_version_check() {
    let db = TestDatabase::new().await;
    let created = db
        .cards
        .create(sample_new_card(OWNER, "CAS001", "Old", "Old body."))
        .await
        .unwrap();

    let generated = GeneratedCard {
        title: "New".into(),
        content: "New body.".into(),
        card_type: CardType::Action,
        category: Some("Ops".into()),
        tags: vec!["new".into()],
    };

    let applied = db
        .cards
        .apply_generated(created.id, OWNER, &generated, GeneratedBy::Ai, created.version)
        .await
        .unwrap();
    assert_eq!(applied.title, "New");
    assert_eq!(applied.generated_by, GeneratedBy::Ai);
    assert_eq!(
        applied.content_hash,
        recard_core::fingerprint("New", "New body.")
    );

    // A stale version must not clobber the newer content.
    let err = db
        .cards
        .apply_generated(created.id, OWNER, &generated, GeneratedBy::Ai, created.version)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    let current = db
        .cards
        .find_one_by_owner(&created.id.to_string(), OWNER)
        .await
        .unwrap();
    assert_eq!(current.title, "New");
}

#[tokio::test]
async fn test_delete_is_owner_scoped() {
    let db = TestDatabase::new().await;
    let created = db
        .cards
        .create(sample_new_card(OWNER, "DEL001", "T", "C"))
        .await
        .unwrap();

    let err = db.cards.delete("DEL001", OTHER_OWNER).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    db.cards.delete("DEL001", OWNER).await.unwrap();
    let err = db
        .cards
        .find_one_by_owner(&created.id.to_string(), OWNER)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = db.cards.delete("DEL001", OWNER).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

async fn seed_filter_corpus(db: &TestDatabase) {
    let mut a = sample_new_card(OWNER, "FILT01", "Review Cycle", "Conduct quarterly reviews.");
    a.card_type = CardType::Action;
    a.category = "Operations".into();
    a.tags = vec!["governance".into()];
    a.source = Some("policy.pdf".into());
    a.attachments = vec![sample_attachment("a.pdf", "policy.pdf")];
    db.cards.create(a).await.unwrap();

    let mut b = sample_new_card(OWNER, "FILT02", "Mission", "Why the team exists.");
    b.card_type = CardType::Concept;
    b.category = "Strategy".into();
    b.tags = vec!["vision".into(), "review".into()];
    b.source = Some("handbook.docx".into());
    b.attachments = vec![sample_attachment("b.docx", "handbook.docx")];
    db.cards.create(b).await.unwrap();

    let mut c = sample_new_card(OWNER, "FILT03", "Quote of the day", "Stay hungry.");
    c.card_type = CardType::Quote;
    c.category = "Inspiration".into();
    db.cards.create(c).await.unwrap();

    // Belongs to another owner; must never leak into OWNER's results.
    db.cards
        .create(sample_new_card(OTHER_OWNER, "FILT04", "Review Cycle", "Other owner."))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_filters_match_expected_rows() {
    let db = TestDatabase::new().await;
    seed_filter_corpus(&db).await;

    let by_type = db
        .cards
        .find_by_owner(
            OWNER,
            ListCardsRequest {
                filters: CardFilters {
                    card_type: Some(CardType::Quote),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_type.cards.len(), 1);
    assert_eq!(by_type.cards[0].card_id, "FILT03");

    // Search matches title OR content OR any tag, case-insensitively.
    let by_search = db
        .cards
        .find_by_owner(
            OWNER,
            ListCardsRequest {
                filters: CardFilters {
                    search: Some("REVIEW".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids: HashSet<_> = by_search.cards.iter().map(|c| c.card_id.clone()).collect();
    assert_eq!(ids, HashSet::from(["FILT01".to_string(), "FILT02".to_string()]));

    let by_source = db
        .cards
        .find_by_owner(
            OWNER,
            ListCardsRequest {
                filters: CardFilters {
                    source: Some("handbook".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_source.cards.len(), 1);

    let by_file_type = db
        .cards
        .find_by_owner(
            OWNER,
            ListCardsRequest {
                filters: CardFilters {
                    source_file_type: Some("pdf".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_file_type.cards.len(), 1);
    assert_eq!(by_file_type.cards[0].card_id, "FILT01");

    let by_category = db
        .cards
        .find_by_owner(
            OWNER,
            ListCardsRequest {
                filters: CardFilters {
                    category: Some("strategy".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_category.cards.len(), 1);
}

#[tokio::test]
async fn test_count_agrees_with_list_for_every_filter() {
    let db = TestDatabase::new().await;
    seed_filter_corpus(&db).await;

    let filter_cases = vec![
        CardFilters::default(),
        CardFilters {
            card_type: Some(CardType::Concept),
            ..Default::default()
        },
        CardFilters {
            search: Some("review".into()),
            ..Default::default()
        },
        CardFilters {
            source_file_type: Some("pdf".into()),
            ..Default::default()
        },
        CardFilters {
            category: Some("Inspiration".into()),
            search: Some("hungry".into()),
            ..Default::default()
        },
        CardFilters {
            date_from: Some(Utc::now() - Duration::hours(1)),
            date_to: Some(Utc::now() + Duration::hours(1)),
            ..Default::default()
        },
        CardFilters {
            date_from: Some(Utc::now() + Duration::hours(1)),
            ..Default::default()
        },
    ];

    for filters in filter_cases {
        let count = db.cards.count_by_owner(OWNER, &filters).await.unwrap();
        let listed = db
            .cards
            .find_by_owner(
                OWNER,
                ListCardsRequest {
                    filters: filters.clone(),
                    limit: Some(100),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(count, listed.total, "count/total disagree: {:?}", filters);
        assert_eq!(
            count,
            listed.cards.len() as i64,
            "count/list disagree: {:?}",
            filters
        );
    }
}

#[tokio::test]
async fn test_pagination_is_stable_under_timestamp_ties() {
    let db = TestDatabase::new().await;
    for i in 0..5 {
        db.cards
            .create(sample_new_card(
                OWNER,
                &format!("PAGE0{}", i),
                &format!("Card {}", i),
                &format!("Body {}", i),
            ))
            .await
            .unwrap();
    }

    // Force every card onto the same creation timestamp so only the id
    // tiebreaker separates them.
    let tied = Utc::now();
    sqlx::query("UPDATE card SET created_at = ?")
        .bind(tied)
        .execute(&db.pool)
        .await
        .unwrap();

    let mut seen = Vec::new();
    for page in 0..3 {
        let response = db
            .cards
            .find_by_owner(
                OWNER,
                ListCardsRequest {
                    limit: Some(2),
                    offset: Some(page * 2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        seen.extend(response.cards.into_iter().map(|c| c.id));
    }

    assert_eq!(seen.len(), 5, "pages skipped or duplicated rows");
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 5);
}

#[tokio::test]
async fn test_stats_by_owner() {
    let db = TestDatabase::new().await;
    seed_filter_corpus(&db).await;

    let stats = db.cards.stats_by_owner(OWNER).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_type.get("quote"), Some(&1));
    assert_eq!(stats.by_type.get("action"), Some(&1));
    assert_eq!(stats.by_category.get("Strategy"), Some(&1));
}
