//! Public card id allocation.
//!
//! Codes are drawn uniformly from the uppercase alphanumeric alphabet
//! and probed for global uniqueness against the card store before being
//! accepted. The id space is 36^6 (~2.2 billion), so a collision on a
//! probe is already rare; exhausting the bounded retry budget means the
//! deployment has a real problem (id space nearly full, or a broken
//! store) and is reported as a configuration error, never papered over
//! with a longer format.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use recard_core::defaults::{CARD_ID_LENGTH, CARD_ID_MAX_ATTEMPTS};
use recard_core::public_id::ALPHABET;
use recard_core::{CardRepository, Error, Result};

/// Allocates globally unique public card ids.
pub struct PublicIdAllocator {
    repo: Arc<dyn CardRepository>,
}

impl PublicIdAllocator {
    pub fn new(repo: Arc<dyn CardRepository>) -> Self {
        Self { repo }
    }

    /// Generate one candidate code.
    fn random_id() -> String {
        let mut rng = rand::thread_rng();
        (0..CARD_ID_LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Allocate a fresh, globally unique public id.
    ///
    /// The card table's unique index on `card_id` remains the final
    /// backstop if two allocations race between probe and insert.
    pub async fn allocate(&self) -> Result<String> {
        for attempt in 1..=CARD_ID_MAX_ATTEMPTS {
            let candidate = Self::random_id();
            if !self.repo.card_id_exists(&candidate).await? {
                debug!(
                    subsystem = "db",
                    component = "public_id",
                    op = "allocate",
                    public_id = %candidate,
                    attempt,
                    "Allocated public card id"
                );
                return Ok(candidate);
            }
            warn!(
                subsystem = "db",
                component = "public_id",
                op = "allocate",
                attempt,
                "Public id collision, retrying"
            );
        }
        Err(Error::Config(format!(
            "exhausted {} public id allocation attempts",
            CARD_ID_MAX_ATTEMPTS
        )))
    }
}
