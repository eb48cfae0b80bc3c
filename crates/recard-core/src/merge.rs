//! Merge semantics for re-ingested duplicates.
//!
//! When an ingestion event resolves to an existing card, three pieces of
//! evidence are combined: the attachment ledger (append-only, keyed by
//! filename), the human-readable source label (comma-joined originating
//! filenames), and the structured provenance record (first-write-wins on
//! file identity). All helpers here are pure; the repository persists
//! the merged values in one row write.

use std::collections::HashSet;

use crate::models::{Attachment, Provenance};

/// Append an attachment unless its `filename` is already ledgered.
///
/// Returns the resulting collection and whether it grew.
pub fn append_attachment(existing: &[Attachment], candidate: &Attachment) -> (Vec<Attachment>, bool) {
    if existing.iter().any(|a| a.filename == candidate.filename) {
        return (existing.to_vec(), false);
    }
    let mut merged = existing.to_vec();
    merged.push(candidate.clone());
    (merged, true)
}

/// Extend the source label with a new originating filename, skipping
/// names already present in the comma-joined list.
pub fn extend_source_label(existing: Option<&str>, original_name: &str) -> String {
    match existing {
        None | Some("") => original_name.to_string(),
        Some(label) => {
            let present = label
                .split(',')
                .map(str::trim)
                .any(|part| part == original_name);
            if present {
                label.to_string()
            } else {
                format!("{}, {}", label, original_name)
            }
        }
    }
}

/// First-write-wins provenance merge: the incoming record is taken only
/// while the stored card has not yet established a file identity
/// (`source_file_id` unset). Later ingests never clobber it.
pub fn merge_provenance(
    existing: Option<Provenance>,
    incoming: Option<Provenance>,
) -> Option<Provenance> {
    match existing {
        Some(current) if current.source_file_id.is_some() => Some(current),
        Some(current) => incoming.or(Some(current)),
        None => incoming,
    }
}

/// Canonicalize a tag set: lowercase, trim, drop empties, sort, dedupe.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut result: Vec<String> = tags
        .into_iter()
        .filter_map(|tag| {
            let tag = tag.as_ref().trim().to_lowercase();
            if tag.is_empty() || !seen.insert(tag.clone()) {
                None
            } else {
                Some(tag)
            }
        })
        .collect();
    result.sort();
    result
}
