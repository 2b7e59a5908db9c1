//! revline-data: synthesis endpoints and the synthesized record status matrix
//!
//! Endpoints (manuscript, structured data sheet, PRISMA counts, Zettlr
//! notes) are selected in `[data]` of settings.toml. Each one writes its
//! artifact and reports which included records it has finished; a record
//! becomes `rev_synthesized` once every endpoint reports it.

pub mod block;
pub mod context;
pub mod endpoint;
pub mod endpoints;
pub mod matrix;
pub mod reconcile;

pub use context::{DataContext, ProjectInfo};
pub use endpoint::{DataEndpoint, DataSettings, EndpointSettings};
pub use endpoints::{ManuscriptEndpoint, PrismaEndpoint, StructuredEndpoint, ZettlrEndpoint};
pub use matrix::{eligible_ids, SynthesisMatrix};
pub use reconcile::{apply_matrix, reconcile, update_data, DataSummary, MatrixApplied};
