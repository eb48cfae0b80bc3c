//! Embedded schema bootstrap.
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so startup can run
//! it unconditionally against a fresh or existing database.

use sqlx::SqlitePool;
use tracing::info;

use recard_core::{Error, Result};

/// All DDL for the card engine. Provenance and attachments live as JSON
/// columns on the card row so a merge is one single-row write; the
/// `(owner_id, content_hash)` unique index is the dedup race backstop.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS card (
        id            BLOB PRIMARY KEY,
        card_id       TEXT NOT NULL,
        owner_id      TEXT NOT NULL,
        title         TEXT NOT NULL,
        content       TEXT NOT NULL,
        card_type     TEXT NOT NULL,
        category      TEXT NOT NULL,
        tags          TEXT NOT NULL DEFAULT '[]',
        source        TEXT,
        is_public     INTEGER NOT NULL DEFAULT 0,
        content_hash  TEXT NOT NULL,
        generated_by  TEXT NOT NULL,
        provenance    TEXT,
        attachments   TEXT NOT NULL DEFAULT '[]',
        rating        INTEGER,
        review_count  INTEGER NOT NULL DEFAULT 0,
        last_reviewed TEXT,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL,
        version       INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_card_owner_content_hash
        ON card(owner_id, content_hash)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_card_public_id
        ON card(card_id)",
    "CREATE INDEX IF NOT EXISTS idx_card_owner_created
        ON card(owner_id, created_at)",
];

/// Create tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }
    info!(
        subsystem = "db",
        component = "schema",
        op = "init",
        "Database schema ready"
    );
    Ok(())
}
