//! # recard-db
//!
//! SQLite persistence layer for recard.
//!
//! This crate provides the concrete [`recard_core::CardRepository`]
//! implementation, public id allocation, connection pool bootstrap, the
//! embedded schema, and reusable test fixtures.

pub mod cards;
pub mod pool;
pub mod public_id;
pub mod schema;
pub mod test_fixtures;

pub use cards::SqliteCardRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use public_id::PublicIdAllocator;
pub use schema::init_schema;

// Re-export core types for consumers of this crate
pub use recard_core::{CardRepository, Error, Result};
