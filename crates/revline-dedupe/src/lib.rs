//! revline-dedupe: resolve duplicates against curated records of the same issue
//!
//! The flow is plan → session → apply:
//! - [`plan()`] partitions records by table-of-contents key and ranks
//!   same-issue curated candidates by similarity;
//! - [`DedupeSession`] turns the plan into decision requests answered by a
//!   [`Prompter`] (terminal or scripted);
//! - [`apply()`] merges the confirmed duplicates in one atomic batch.

pub mod apply;
pub mod decision;
pub mod error;
pub mod plan;
pub mod report;
pub mod session;
pub mod settings;

pub use apply::{apply, apply_additions, apply_merges, ApplySummary};
pub use decision::{choose_survivor, Decision, MergeDecision};
pub use error::DedupeError;
pub use plan::{plan, Candidate, DedupePlan, PlanItem};
pub use report::{SourceMergeReport, SourceStatus};
pub use session::{
    run_session, CandidateView, DecisionRequest, DecisionResponse, DedupeOutcome, DedupeSession,
    Prompter, RecordSummary, ScriptedPrompter,
};
pub use settings::{DedupeScope, DedupeSettings};
