//! Revline Core - record model and status machine for literature reviews
//!
//! Records move through a fixed status pipeline (import, preparation,
//! deduplication, prescreen, PDF, screening, synthesis). This crate holds
//! the state machine, the record model with provenance and origins, the
//! arena the collection lives in, and the shared logging/progress setup.

pub mod arena;
pub mod error;
pub mod logging;
pub mod prep;
pub mod progress;
pub mod quality;
pub mod record;
pub mod shutdown;
pub mod similarity;
pub mod stats;
pub mod status;

// Re-exports for convenience
pub use arena::{RecordArena, Slot};
pub use error::ReviewError;
pub use logging::{init_logging, Verbosity};
pub use prep::{prep, PrepSummary};
pub use progress::{fmt_num, ProgressContext};
pub use quality::{default_checkers, QualityChecker};
pub use record::{ProvenanceEntry, Record, StatusChange, CURATED, IDENTIFYING_FIELDS};
pub use shutdown::{install_signal_handlers, is_interrupted, request_interrupt};
pub use stats::StatusStats;
pub use status::RecordState;
