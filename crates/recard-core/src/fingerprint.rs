//! Content fingerprinting for duplicate recognition.
//!
//! A card's identity is its semantic content: the normalized title and
//! body. Formatting, casing, and whitespace differences must not change
//! the fingerprint, so a re-upload of the same text from a different
//! file resolves to the same card.

use sha2::{Digest, Sha256};

/// Separator between the normalized title and content inside the hash
/// input. Must never occur in normalized text (normalization collapses
/// whitespace and the unit separator is a control character).
const FIELD_SEPARATOR: char = '\u{1f}';

/// Normalize one field: case-fold and collapse all whitespace runs to a
/// single space (which also trims).
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compute the dedup fingerprint of a card's semantic content.
///
/// Deterministic and collision-resistant (SHA-256 over normalized
/// title + content). Output format is `sha256:<hex>`.
pub fn fingerprint(title: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(title).as_bytes());
    hasher.update(FIELD_SEPARATOR.to_string().as_bytes());
    hasher.update(normalize(content).as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
