//! revline-store: persistence for review projects
//!
//! Keeps the record collection in `data/records.json` and a
//! content-addressed commit history under `.revline/`, so every batch
//! operation ends in one reviewable commit.

pub mod dataset;
pub mod hash;
pub mod import;
pub mod manifest;

pub use dataset::{CommitInfo, Dataset, DatasetGateway, VerifyResult, RECORDS_FILE, SETTINGS_FILE};
pub use import::{import_search_file, ImportSummary};
pub use manifest::CommitManifest;
