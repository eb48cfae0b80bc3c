//! Service layer: orchestration on top of the repository and the
//! generation backends.

pub mod ingestion;
pub mod regeneration;

pub use ingestion::IngestionService;
pub use regeneration::{RegenerationOutcome, RegenerationService};
