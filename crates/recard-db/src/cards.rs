//! Card repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use recard_core::{
    fingerprint, normalize_tags, public_id, Card, CardFilters, CardMetadata, CardRepository,
    CardStats, Error, GeneratedBy, GeneratedCard, ListCardsRequest, ListCardsResponse, MergePatch,
    NewCard, Result, UpdateCardRequest,
};

/// SQLite implementation of CardRepository.
pub struct SqliteCardRepository {
    pool: SqlitePool,
}

impl SqliteCardRepository {
    /// Create a new SqliteCardRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve a card the caller must own (no public-read allowance).
    /// Used by the mutating operations; reads go through
    /// `find_one_by_owner`.
    async fn resolve_owned(&self, id_or_card_id: &str, owner_id: &str) -> Result<Card> {
        let row = if public_id::is_public_id_shape(id_or_card_id) {
            let canonical = public_id::canonicalize(id_or_card_id);
            sqlx::query("SELECT * FROM card WHERE card_id = ? AND owner_id = ?")
                .bind(canonical)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?
        } else {
            let id = parse_internal_id(id_or_card_id)?;
            sqlx::query("SELECT * FROM card WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?
        };

        match row {
            Some(row) => map_row_to_card(&row),
            None => Err(Error::NotFound(format!("Card {} not found", id_or_card_id))),
        }
    }

    async fn fetch_by_id(&self, id: Uuid) -> Result<Card> {
        let row = sqlx::query("SELECT * FROM card WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        match row {
            Some(row) => map_row_to_card(&row),
            None => Err(Error::NotFound(format!("Card {} not found", id))),
        }
    }
}

/// Parse a storage-internal identifier. Anything that is neither a
/// public-id shape nor a UUID cannot reference a card.
fn parse_internal_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| Error::NotFound(format!("Card {} not found", s)))
}

/// Map a uniqueness violation on insert/update to a typed conflict the
/// ingestion layer can recover from; everything else stays a database
/// error.
fn map_write_error(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let message = db_err.message().to_string();
            return if message.contains("content_hash") {
                Error::Conflict("card with identical content already exists for this owner".into())
            } else if message.contains("card_id") {
                Error::Conflict("public card id already allocated".into())
            } else {
                Error::Conflict(message)
            };
        }
    }
    Error::Database(e)
}

/// Map a database row to a Card.
fn map_row_to_card(row: &SqliteRow) -> Result<Card> {
    let card_type: String = row.try_get("card_type").map_err(Error::Database)?;
    let generated_by: String = row.try_get("generated_by").map_err(Error::Database)?;
    let tags_json: String = row.try_get("tags").map_err(Error::Database)?;
    let attachments_json: String = row.try_get("attachments").map_err(Error::Database)?;
    let provenance_json: Option<String> = row.try_get("provenance").map_err(Error::Database)?;

    Ok(Card {
        id: row.try_get("id").map_err(Error::Database)?,
        card_id: row.try_get("card_id").map_err(Error::Database)?,
        owner_id: row.try_get("owner_id").map_err(Error::Database)?,
        title: row.try_get("title").map_err(Error::Database)?,
        content: row.try_get("content").map_err(Error::Database)?,
        card_type: card_type.parse().map_err(Error::Internal)?,
        category: row.try_get("category").map_err(Error::Database)?,
        tags: serde_json::from_str(&tags_json)?,
        source: row.try_get("source").map_err(Error::Database)?,
        is_public: row.try_get("is_public").map_err(Error::Database)?,
        content_hash: row.try_get("content_hash").map_err(Error::Database)?,
        generated_by: generated_by.parse().map_err(Error::Internal)?,
        provenance: provenance_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?,
        attachments: serde_json::from_str(&attachments_json)?,
        metadata: CardMetadata {
            rating: row.try_get("rating").map_err(Error::Database)?,
            review_count: row.try_get("review_count").map_err(Error::Database)?,
            last_reviewed: row.try_get("last_reviewed").map_err(Error::Database)?,
        },
        created_at: row.try_get("created_at").map_err(Error::Database)?,
        updated_at: row.try_get("updated_at").map_err(Error::Database)?,
        version: row.try_get("version").map_err(Error::Database)?,
    })
}

// =============================================================================
// FILTER QUERY BUILDING
// =============================================================================

/// A deferred bind value for dynamically built queries.
enum QueryParam {
    Text(String),
    Date(DateTime<Utc>),
}

/// Shared WHERE builder for list and count. Both operations interpret
/// filters through this one builder, which is what makes their results
/// agree under every filter combination.
struct CardQueryBuilder {
    clauses: Vec<String>,
    params: Vec<QueryParam>,
}

impl CardQueryBuilder {
    fn new(owner_id: &str, filters: &CardFilters) -> Self {
        let mut builder = Self {
            clauses: vec!["owner_id = ?".to_string()],
            params: vec![QueryParam::Text(owner_id.to_string())],
        };
        builder.apply(filters);
        builder
    }

    fn apply(&mut self, filters: &CardFilters) {
        if let Some(card_type) = filters.card_type {
            self.clauses.push("card_type = ?".into());
            self.params.push(QueryParam::Text(card_type.to_string()));
        }
        if let Some(category) = &filters.category {
            self.clauses.push("LOWER(category) = ?".into());
            self.params.push(QueryParam::Text(category.to_lowercase()));
        }
        if let Some(search) = &filters.search {
            let needle = search.to_lowercase();
            self.clauses.push(
                "(INSTR(LOWER(title), ?) > 0 \
                 OR INSTR(LOWER(content), ?) > 0 \
                 OR EXISTS (SELECT 1 FROM json_each(card.tags) \
                            WHERE INSTR(LOWER(json_each.value), ?) > 0))"
                    .into(),
            );
            self.params.push(QueryParam::Text(needle.clone()));
            self.params.push(QueryParam::Text(needle.clone()));
            self.params.push(QueryParam::Text(needle));
        }
        if let Some(source) = &filters.source {
            self.clauses
                .push("INSTR(LOWER(COALESCE(source, '')), ?) > 0".into());
            self.params.push(QueryParam::Text(source.to_lowercase()));
        }
        if let Some(file_type) = &filters.source_file_type {
            let ext = file_type.trim_start_matches('.').to_lowercase();
            self.clauses.push(
                "EXISTS (SELECT 1 FROM json_each(card.attachments) \
                 WHERE LOWER(json_extract(json_each.value, '$.filename')) LIKE ?)"
                    .into(),
            );
            self.params.push(QueryParam::Text(format!("%.{}", ext)));
        }
        if let Some(from) = filters.date_from {
            self.clauses.push("created_at >= ?".into());
            self.params.push(QueryParam::Date(from));
        }
        if let Some(to) = filters.date_to {
            self.clauses.push("created_at <= ?".into());
            self.params.push(QueryParam::Date(to));
        }
    }

    fn where_sql(&self) -> String {
        format!("WHERE {}", self.clauses.join(" AND "))
    }
}

fn validate_sort_order(sort_order: Option<&str>) -> &'static str {
    match sort_order.map(str::to_uppercase).as_deref() {
        Some("ASC") => "ASC",
        _ => "DESC",
    }
}

/// Build the order clause. The id tiebreaker keeps skip/limit paging
/// stable when many cards share a sort key.
fn build_order_clause(sort_by: Option<&str>, sort_order: Option<&str>) -> String {
    let direction = validate_sort_order(sort_order);
    let column = match sort_by {
        Some("updated_at") => "updated_at",
        Some("title") => "LOWER(title)",
        Some("rating") => "COALESCE(rating, 0)",
        Some("review_count") => "review_count",
        _ => "created_at",
    };
    format!("ORDER BY {} {}, id ASC", column, direction)
}

// =============================================================================
// REPOSITORY IMPLEMENTATION
// =============================================================================

#[async_trait]
impl CardRepository for SqliteCardRepository {
    async fn create(&self, new: NewCard) -> Result<Card> {
        let now = Utc::now();
        let content_hash = fingerprint(&new.title, &new.content);
        let card = Card {
            id: Uuid::new_v4(),
            card_id: public_id::canonicalize(&new.card_id),
            owner_id: new.owner_id,
            title: new.title,
            content: new.content,
            card_type: new.card_type,
            category: new.category,
            tags: normalize_tags(&new.tags),
            source: new.source,
            is_public: new.is_public,
            content_hash,
            generated_by: new.generated_by,
            provenance: new.provenance,
            attachments: new.attachments,
            metadata: CardMetadata::default(),
            created_at: now,
            updated_at: now,
            version: 0,
        };

        let provenance_json = card
            .provenance
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            "INSERT INTO card (id, card_id, owner_id, title, content, card_type, category,
                               tags, source, is_public, content_hash, generated_by,
                               provenance, attachments, rating, review_count, last_reviewed,
                               created_at, updated_at, version)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, 0, NULL, ?, ?, 0)",
        )
        .bind(card.id)
        .bind(&card.card_id)
        .bind(&card.owner_id)
        .bind(&card.title)
        .bind(&card.content)
        .bind(card.card_type.to_string())
        .bind(&card.category)
        .bind(serde_json::to_string(&card.tags)?)
        .bind(&card.source)
        .bind(card.is_public)
        .bind(&card.content_hash)
        .bind(card.generated_by.to_string())
        .bind(provenance_json)
        .bind(serde_json::to_string(&card.attachments)?)
        .bind(card.created_at)
        .bind(card.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        info!(
            subsystem = "db",
            component = "card_repository",
            op = "create",
            card_id = %card.id,
            public_id = %card.card_id,
            owner_id = %card.owner_id,
            "Card created"
        );
        Ok(card)
    }

    async fn find_one_by_owner(&self, id_or_card_id: &str, owner_id: &str) -> Result<Card> {
        if public_id::is_public_id_shape(id_or_card_id) {
            let canonical = public_id::canonicalize(id_or_card_id);
            let row = sqlx::query("SELECT * FROM card WHERE card_id = ?")
                .bind(&canonical)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
            match row {
                Some(row) => {
                    let card = map_row_to_card(&row)?;
                    if card.owner_id == owner_id || card.is_public {
                        Ok(card)
                    } else {
                        Err(Error::NotFound(format!("Card {} not found", id_or_card_id)))
                    }
                }
                None => Err(Error::NotFound(format!("Card {} not found", id_or_card_id))),
            }
        } else {
            let id = parse_internal_id(id_or_card_id)?;
            let row = sqlx::query("SELECT * FROM card WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
            match row {
                Some(row) => map_row_to_card(&row),
                None => Err(Error::NotFound(format!("Card {} not found", id_or_card_id))),
            }
        }
    }

    async fn find_by_owner(
        &self,
        owner_id: &str,
        req: ListCardsRequest,
    ) -> Result<ListCardsResponse> {
        let builder = CardQueryBuilder::new(owner_id, &req.filters);

        let count_sql = format!("SELECT COUNT(*) FROM card {}", builder.where_sql());
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for param in &builder.params {
            count_query = match param {
                QueryParam::Text(s) => count_query.bind(s),
                QueryParam::Date(d) => count_query.bind(d),
            };
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let limit = req
            .limit
            .unwrap_or(recard_core::defaults::PAGE_LIMIT)
            .clamp(1, recard_core::defaults::PAGE_LIMIT_MAX);
        let offset = req.offset.unwrap_or(recard_core::defaults::PAGE_OFFSET).max(0);

        let list_sql = format!(
            "SELECT * FROM card {} {} LIMIT ? OFFSET ?",
            builder.where_sql(),
            build_order_clause(req.sort_by.as_deref(), req.sort_order.as_deref()),
        );
        let mut list_query = sqlx::query(&list_sql);
        for param in &builder.params {
            list_query = match param {
                QueryParam::Text(s) => list_query.bind(s),
                QueryParam::Date(d) => list_query.bind(d),
            };
        }
        let rows = list_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let cards = rows
            .iter()
            .map(map_row_to_card)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "db",
            component = "card_repository",
            op = "list",
            owner_id = %owner_id,
            result_count = cards.len(),
            total,
            "Listed cards"
        );
        Ok(ListCardsResponse { cards, total })
    }

    async fn count_by_owner(&self, owner_id: &str, filters: &CardFilters) -> Result<i64> {
        let builder = CardQueryBuilder::new(owner_id, filters);
        let sql = format!("SELECT COUNT(*) FROM card {}", builder.where_sql());
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for param in &builder.params {
            query = match param {
                QueryParam::Text(s) => query.bind(s),
                QueryParam::Date(d) => query.bind(d),
            };
        }
        query.fetch_one(&self.pool).await.map_err(Error::Database)
    }

    async fn stats_by_owner(&self, owner_id: &str) -> Result<CardStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM card WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut stats = CardStats {
            total,
            ..Default::default()
        };

        let type_rows =
            sqlx::query("SELECT card_type, COUNT(*) AS n FROM card WHERE owner_id = ? GROUP BY card_type")
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;
        for row in type_rows {
            let ty: String = row.try_get("card_type").map_err(Error::Database)?;
            let n: i64 = row.try_get("n").map_err(Error::Database)?;
            stats.by_type.insert(ty, n);
        }

        let category_rows =
            sqlx::query("SELECT category, COUNT(*) AS n FROM card WHERE owner_id = ? GROUP BY category")
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;
        for row in category_rows {
            let category: String = row.try_get("category").map_err(Error::Database)?;
            let n: i64 = row.try_get("n").map_err(Error::Database)?;
            stats.by_category.insert(category, n);
        }

        Ok(stats)
    }

    async fn update(&self, id: Uuid, owner_id: &str, patch: UpdateCardRequest) -> Result<Card> {
        let mut card = self.resolve_owned(&id.to_string(), owner_id).await?;

        let content_changed = patch.title.is_some() || patch.content.is_some();
        if let Some(title) = patch.title {
            card.title = title;
        }
        if let Some(content) = patch.content {
            card.content = content;
        }
        if let Some(card_type) = patch.card_type {
            card.card_type = card_type;
        }
        if let Some(category) = patch.category {
            card.category = category;
        }
        if let Some(tags) = patch.tags {
            card.tags = normalize_tags(&tags);
        }
        if let Some(source) = patch.source {
            card.source = Some(source);
        }
        if let Some(is_public) = patch.is_public {
            card.is_public = is_public;
        }
        if content_changed {
            // Manual edits stay dedup-consistent going forward; dedup is
            // not re-triggered against other existing cards.
            card.content_hash = fingerprint(&card.title, &card.content);
        }
        card.updated_at = Utc::now();
        card.version += 1;

        let result = sqlx::query(
            "UPDATE card SET title = ?, content = ?, card_type = ?, category = ?, tags = ?,
                             source = ?, is_public = ?, content_hash = ?, updated_at = ?,
                             version = version + 1
             WHERE id = ? AND owner_id = ?",
        )
        .bind(&card.title)
        .bind(&card.content)
        .bind(card.card_type.to_string())
        .bind(&card.category)
        .bind(serde_json::to_string(&card.tags)?)
        .bind(&card.source)
        .bind(card.is_public)
        .bind(&card.content_hash)
        .bind(card.updated_at)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Card {} not found", id)));
        }
        Ok(card)
    }

    async fn delete(&self, id_or_card_id: &str, owner_id: &str) -> Result<()> {
        let card = self.resolve_owned(id_or_card_id, owner_id).await?;
        sqlx::query("DELETE FROM card WHERE id = ?")
            .bind(card.id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        info!(
            subsystem = "db",
            component = "card_repository",
            op = "delete",
            card_id = %card.id,
            owner_id = %owner_id,
            "Card deleted"
        );
        Ok(())
    }

    async fn find_duplicate(&self, content_hash: &str, owner_id: &str) -> Result<Option<Card>> {
        let row = sqlx::query("SELECT * FROM card WHERE owner_id = ? AND content_hash = ?")
            .bind(owner_id)
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.as_ref().map(map_row_to_card).transpose()
    }

    async fn merge_ingest(&self, id: Uuid, patch: MergePatch) -> Result<Card> {
        let provenance_json = patch
            .provenance
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        // One row write: attachments, source, and provenance land
        // together or not at all.
        let result = sqlx::query(
            "UPDATE card SET attachments = ?, source = ?, provenance = ?, updated_at = ?,
                             version = version + 1
             WHERE id = ?",
        )
        .bind(serde_json::to_string(&patch.attachments)?)
        .bind(&patch.source)
        .bind(provenance_json)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Card {} not found", id)));
        }
        self.fetch_by_id(id).await
    }

    async fn record_review(&self, id_or_card_id: &str, owner_id: &str) -> Result<Card> {
        let card = self.resolve_owned(id_or_card_id, owner_id).await?;
        sqlx::query(
            "UPDATE card SET review_count = review_count + 1, last_reviewed = ?, updated_at = ?,
                             version = version + 1
             WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(card.id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        self.fetch_by_id(card.id).await
    }

    async fn set_rating(&self, id_or_card_id: &str, owner_id: &str, rating: i32) -> Result<Card> {
        let card = self.resolve_owned(id_or_card_id, owner_id).await?;
        sqlx::query(
            "UPDATE card SET rating = ?, updated_at = ?, version = version + 1 WHERE id = ?",
        )
        .bind(rating)
        .bind(Utc::now())
        .bind(card.id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        self.fetch_by_id(card.id).await
    }

    async fn apply_generated(
        &self,
        id: Uuid,
        owner_id: &str,
        generated: &GeneratedCard,
        generated_by: GeneratedBy,
        expected_version: i64,
    ) -> Result<Card> {
        let current = self.resolve_owned(&id.to_string(), owner_id).await?;
        let category = generated
            .category
            .clone()
            .unwrap_or_else(|| current.category.clone());
        let content_hash = fingerprint(&generated.title, &generated.content);

        let result = sqlx::query(
            "UPDATE card SET title = ?, content = ?, card_type = ?, category = ?, tags = ?,
                             content_hash = ?, generated_by = ?, updated_at = ?,
                             version = version + 1
             WHERE id = ? AND owner_id = ? AND version = ?",
        )
        .bind(&generated.title)
        .bind(&generated.content)
        .bind(generated.card_type.to_string())
        .bind(&category)
        .bind(serde_json::to_string(&normalize_tags(&generated.tags))?)
        .bind(&content_hash)
        .bind(generated_by.to_string())
        .bind(Utc::now())
        .bind(id)
        .bind(owner_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            warn!(
                subsystem = "db",
                component = "card_repository",
                op = "apply_generated",
                card_id = %id,
                expected_version,
                "Version check failed applying generated content"
            );
            return Err(Error::Conflict(
                "card was modified while regeneration was in progress".into(),
            ));
        }

        info!(
            subsystem = "db",
            component = "card_repository",
            op = "apply_generated",
            card_id = %id,
            strategy = %generated_by,
            "Applied generated content"
        );
        self.fetch_by_id(id).await
    }

    async fn card_id_exists(&self, card_id: &str) -> Result<bool> {
        let canonical = public_id::canonicalize(card_id);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM card WHERE card_id = ?")
            .bind(&canonical)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(count > 0)
    }
}
