//! Ingestion orchestration: candidate card in, persisted card out.
//!
//! Called once per candidate the extraction pipeline produces. Computes
//! the content fingerprint, resolves create-vs-merge against the
//! owner's existing cards, and keeps provenance and the attachment
//! ledger consistent under re-ingestion. The whole operation is
//! idempotent by fingerprint: retrying after a transient failure lands
//! on the merge path.

use std::sync::Arc;

use tracing::{info, warn};

use recard_core::{
    append_attachment, extend_source_label, fingerprint, merge_provenance, Attachment, CandidateCard,
    Card, CardRepository, Error, GeneratedBy, IngestOutcome, MergePatch, NewCard, Provenance,
    Result, UploadedFile,
};
use recard_db::PublicIdAllocator;

/// Orchestrates `createOrUpdateFromProcessedItem` for the upload
/// pipeline.
pub struct IngestionService {
    cards: Arc<dyn CardRepository>,
    allocator: PublicIdAllocator,
}

impl IngestionService {
    pub fn new(cards: Arc<dyn CardRepository>) -> Self {
        Self {
            allocator: PublicIdAllocator::new(cards.clone()),
            cards,
        }
    }

    /// Ingest one candidate card extracted from an uploaded file.
    pub async fn ingest(
        &self,
        candidate: CandidateCard,
        owner_id: &str,
        file: UploadedFile,
        file_hash: &str,
        file_id: &str,
    ) -> Result<IngestOutcome> {
        if owner_id.trim().is_empty() {
            return Err(Error::Validation("owner id is required".into()));
        }
        if candidate.title.trim().is_empty() || candidate.content.trim().is_empty() {
            return Err(Error::Validation(
                "candidate card needs a title and content".into(),
            ));
        }

        let content_hash = fingerprint(&candidate.title, &candidate.content);

        if let Some(existing) = self.cards.find_duplicate(&content_hash, owner_id).await? {
            let card = self
                .merge(existing, &candidate, &file, file_hash, file_id)
                .await?;
            return Ok(IngestOutcome {
                card,
                is_duplicate: true,
            });
        }

        let card_id = self.allocator.allocate().await?;
        let new = NewCard {
            owner_id: owner_id.to_string(),
            card_id,
            title: candidate.title.clone(),
            content: candidate.content.clone(),
            card_type: candidate.card_type.unwrap_or_default(),
            category: candidate
                .category
                .clone()
                .unwrap_or_else(|| "General".to_string()),
            tags: candidate.tags.clone().unwrap_or_default(),
            source: Some(file.original_name.clone()),
            is_public: false,
            generated_by: candidate.generated_by.unwrap_or(GeneratedBy::RuleBased),
            provenance: Some(build_provenance(&candidate, &file, file_hash, file_id)),
            attachments: vec![attachment_from(&file)],
        };

        match self.cards.create(new).await {
            Ok(card) => {
                info!(
                    subsystem = "ingest",
                    component = "ingestion_service",
                    op = "ingest",
                    card_id = %card.id,
                    owner_id = %owner_id,
                    content_hash = %content_hash,
                    is_duplicate = false,
                    "Created card from candidate"
                );
                Ok(IngestOutcome {
                    card,
                    is_duplicate: false,
                })
            }
            // Race recovery: a concurrent ingestion of the same
            // fingerprint won the create. The unique index on
            // (owner_id, content_hash) is the backstop; treat the loss
            // as "someone else just created it" and merge into their
            // row.
            Err(Error::Conflict(reason)) => {
                warn!(
                    subsystem = "ingest",
                    component = "ingestion_service",
                    op = "recover_create_race",
                    owner_id = %owner_id,
                    content_hash = %content_hash,
                    "Create lost a dedup race, retrying as merge"
                );
                match self.cards.find_duplicate(&content_hash, owner_id).await? {
                    Some(existing) => {
                        let card = self
                            .merge(existing, &candidate, &file, file_hash, file_id)
                            .await?;
                        Ok(IngestOutcome {
                            card,
                            is_duplicate: true,
                        })
                    }
                    // The conflict was not the dedup index (or the
                    // winning row vanished); nothing to merge into.
                    None => Err(Error::Conflict(reason)),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Merge a re-ingested duplicate into the existing card: append the
    /// attachment (unless the filename is already ledgered), extend the
    /// source label, and fill provenance only while the card has no
    /// established file identity. One row write.
    async fn merge(
        &self,
        existing: Card,
        candidate: &CandidateCard,
        file: &UploadedFile,
        file_hash: &str,
        file_id: &str,
    ) -> Result<Card> {
        let (attachments, attachment_added) =
            append_attachment(&existing.attachments, &attachment_from(file));
        let source = extend_source_label(existing.source.as_deref(), &file.original_name);
        let provenance = merge_provenance(
            existing.provenance.clone(),
            Some(build_provenance(candidate, file, file_hash, file_id)),
        );

        info!(
            subsystem = "ingest",
            component = "ingestion_service",
            op = "merge",
            card_id = %existing.id,
            owner_id = %existing.owner_id,
            attachment_added,
            is_duplicate = true,
            "Merging re-ingested duplicate"
        );

        self.cards
            .merge_ingest(
                existing.id,
                MergePatch {
                    attachments,
                    source: Some(source),
                    provenance,
                },
            )
            .await
    }
}

fn attachment_from(file: &UploadedFile) -> Attachment {
    Attachment {
        filename: file.filename.clone(),
        original_name: file.original_name.clone(),
        mimetype: file.mimetype.clone(),
        size: file.size,
        path: file.path.clone(),
    }
}

/// Combine the candidate's provenance fragment with the upload
/// descriptor into the stored record.
fn build_provenance(
    candidate: &CandidateCard,
    file: &UploadedFile,
    file_hash: &str,
    file_id: &str,
) -> Provenance {
    let fragment = candidate.provenance.clone().unwrap_or_default();
    Provenance {
        source_file_id: Some(file_id.to_string()),
        source_path: Some(file.path.clone()),
        file_hash: Some(file_hash.to_string()),
        location: fragment.location,
        snippet: fragment.snippet,
        model_name: fragment.model_name,
        prompt_version: fragment.prompt_version,
        confidence_score: fragment.confidence_score,
    }
}
