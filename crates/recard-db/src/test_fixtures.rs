//! Test fixtures for database integration tests.
//!
//! Provides a throwaway SQLite database per test: a temp directory, a
//! real file-backed pool (so concurrent-writer tests exercise the same
//! locking the server sees), and the schema pre-applied.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recard_db::test_fixtures::TestDatabase;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let test_db = TestDatabase::new().await;
//!     let card = test_db.cards.create(...).await.unwrap();
//! }
//! ```

use std::sync::Arc;

use sqlx::SqlitePool;
use tempfile::TempDir;

use recard_core::{Attachment, CandidateProvenance, CardType, GeneratedBy, NewCard, Provenance};

use crate::cards::SqliteCardRepository;
use crate::pool::create_pool;
use crate::schema::init_schema;

/// A temp-file SQLite database with the schema applied. The directory
/// (and database) is removed when the fixture drops.
pub struct TestDatabase {
    pub pool: SqlitePool,
    pub cards: Arc<SqliteCardRepository>,
    _dir: TempDir,
}

impl TestDatabase {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let db_path = dir.path().join("recard_test.db");
        let pool = create_pool(&db_path)
            .await
            .expect("failed to create test pool");
        init_schema(&pool).await.expect("failed to apply schema");
        Self {
            cards: Arc::new(SqliteCardRepository::new(pool.clone())),
            pool,
            _dir: dir,
        }
    }
}

/// A NewCard with sensible defaults for tests.
pub fn sample_new_card(owner_id: &str, card_id: &str, title: &str, content: &str) -> NewCard {
    NewCard {
        owner_id: owner_id.to_string(),
        card_id: card_id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        card_type: CardType::Concept,
        category: "General".to_string(),
        tags: vec![],
        source: None,
        is_public: false,
        generated_by: GeneratedBy::RuleBased,
        provenance: None,
        attachments: vec![],
    }
}

/// An attachment with sensible defaults for tests.
pub fn sample_attachment(filename: &str, original_name: &str) -> Attachment {
    Attachment {
        filename: filename.to_string(),
        original_name: original_name.to_string(),
        mimetype: "application/pdf".to_string(),
        size: 2048,
        path: format!("/uploads/{}", filename),
    }
}

/// A full provenance record for first-write-wins tests.
pub fn sample_provenance(file_id: &str, file_hash: &str, snippet: &str) -> Provenance {
    Provenance {
        source_file_id: Some(file_id.to_string()),
        source_path: Some(format!("/uploads/{}", file_id)),
        file_hash: Some(file_hash.to_string()),
        location: Some("page 1".to_string()),
        snippet: Some(snippet.to_string()),
        model_name: None,
        prompt_version: None,
        confidence_score: Some(0.9),
    }
}

/// A candidate provenance fragment as the extraction pipeline sends it.
pub fn sample_candidate_provenance(snippet: &str) -> CandidateProvenance {
    CandidateProvenance {
        location: Some("page 1".to_string()),
        snippet: Some(snippet.to_string()),
        model_name: None,
        prompt_version: None,
        confidence_score: Some(0.9),
    }
}
