//! # recard-core
//!
//! Core types, traits, and abstractions for the recard card engine.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other recard crates depend on: the `Card`
//! model, the error taxonomy, content fingerprinting, public-id shape
//! helpers, duplicate-merge semantics, and the repository/generator
//! traits.

pub mod defaults;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod merge;
pub mod models;
pub mod public_id;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use merge::{append_attachment, extend_source_label, merge_provenance, normalize_tags};
pub use models::*;
pub use traits::*;
