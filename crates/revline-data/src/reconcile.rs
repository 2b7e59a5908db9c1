//! Reconciling endpoint artifacts into record statuses

use std::path::PathBuf;

use anyhow::Result;
use revline_core::{RecordArena, RecordState, ReviewError};

use crate::context::DataContext;
use crate::endpoint::DataEndpoint;
use crate::matrix::{eligible_ids, SynthesisMatrix};

fn empty_matrix(arena: &RecordArena, endpoints: &[Box<dyn DataEndpoint>]) -> SynthesisMatrix {
    SynthesisMatrix::new(
        &eligible_ids(arena),
        endpoints.iter().map(|e| e.endpoint_id()),
    )
}

/// Build the status matrix from what the endpoints currently report.
/// Always computed from scratch.
pub fn reconcile(
    ctx: &DataContext,
    arena: &RecordArena,
    endpoints: &[Box<dyn DataEndpoint>],
) -> Result<SynthesisMatrix> {
    let mut matrix = empty_matrix(arena, endpoints);
    for endpoint in endpoints {
        endpoint.update_status_matrix(ctx, &mut matrix, endpoint.endpoint_id())?;
    }
    log::debug!(
        "synthesis matrix: {} of {} records synthesized",
        matrix.synthesized_ids().len(),
        matrix.len()
    );
    Ok(matrix)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixApplied {
    /// `rev_included` records that reached `rev_synthesized`.
    pub synthesized: Vec<String>,
    /// `rev_synthesized` records whose artifacts are no longer complete.
    pub reopened: Vec<String>,
}

impl MatrixApplied {
    pub fn changed(&self) -> bool {
        !self.synthesized.is_empty() || !self.reopened.is_empty()
    }
}

/// Set record statuses from the matrix.
pub fn apply_matrix(
    arena: &mut RecordArena,
    matrix: &SynthesisMatrix,
) -> Result<MatrixApplied, ReviewError> {
    let mut applied = MatrixApplied::default();
    for id in matrix.record_ids() {
        let record = arena.get_mut(&id)?;
        match (record.status(), matrix.is_synthesized(&id)) {
            (RecordState::RevIncluded, true) => {
                record.set_status(RecordState::RevSynthesized)?;
                applied.synthesized.push(id);
            }
            (RecordState::RevSynthesized, false) => {
                log::warn!(
                    "{id}: no longer complete in {}",
                    matrix.pending_endpoints(&id).join(", ")
                );
                record.override_status(
                    RecordState::RevIncluded,
                    "synthesis artifacts no longer complete",
                );
                applied.reopened.push(id);
            }
            _ => {}
        }
    }
    if applied.changed() {
        log::info!(
            "{} records synthesized, {} reopened",
            applied.synthesized.len(),
            applied.reopened.len()
        );
    }
    Ok(applied)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSummary {
    /// Project-relative paths the endpoints wrote.
    pub written: Vec<PathBuf>,
    pub applied: MatrixApplied,
}

/// The data operation: update every endpoint, reconcile, apply. The
/// arena is only changed when all steps succeed.
pub fn update_data(
    ctx: &DataContext,
    arena: &mut RecordArena,
    endpoints: &[Box<dyn DataEndpoint>],
) -> Result<DataSummary> {
    let mut summary = DataSummary::default();
    let matrix = empty_matrix(arena, endpoints);
    for endpoint in endpoints {
        log::info!("updating {} endpoint", endpoint.endpoint_id());
        summary.written.extend(endpoint.update(ctx, arena, &matrix)?);
    }

    let matrix = reconcile(ctx, arena, endpoints)?;
    let mut work = arena.clone();
    summary.applied = apply_matrix(&mut work, &matrix)?;
    *arena = work;
    Ok(summary)
}
