//! Public card identifier shape and canonicalization.
//!
//! A card's shareable id is a fixed-length alphanumeric code, distinct
//! from the storage-internal UUID. Comparison is case-insensitive;
//! storage is canonical uppercase. Allocation (randomness + uniqueness
//! probing) lives in the database layer; this module holds the pure
//! parts so the store can route lookups by shape.

use crate::defaults::CARD_ID_LENGTH;

/// Alphabet public ids are drawn from.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Whether an identifier string has the public-id shape (fixed length,
/// ASCII alphanumeric). Identifiers with this shape resolve via
/// `card_id`; everything else resolves via the internal id.
pub fn is_public_id_shape(s: &str) -> bool {
    s.len() == CARD_ID_LENGTH && s.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Canonical storage/lookup form of a public id.
pub fn canonicalize(s: &str) -> String {
    s.to_ascii_uppercase()
}
