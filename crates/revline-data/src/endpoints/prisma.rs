//! PRISMA endpoint: flow diagram counts regenerated from the status counts

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use revline_core::{RecordArena, RecordState, StatusStats};

use crate::context::DataContext;
use crate::endpoint::{DataEndpoint, EndpointSettings};
use crate::matrix::SynthesisMatrix;

pub struct PrismaEndpoint {
    path: PathBuf,
}

impl Default for PrismaEndpoint {
    fn default() -> Self {
        Self::new(PathBuf::from("data/PRISMA.csv"))
    }
}

impl PrismaEndpoint {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// `(data, n)` rows of the PRISMA sheet.
pub fn prisma_rows(stats: &StatusStats) -> Vec<(&'static str, String)> {
    let exclusion = stats
        .exclusion_reasons
        .iter()
        .map(|(reason, n)| format!("Reason {reason}, {n}"))
        .collect::<Vec<_>>()
        .join("; ");
    vec![
        ("database_results", stats.total().to_string()),
        ("duplicates", stats.duplicates_removed().to_string()),
        ("records_screened", stats.screened().to_string()),
        (
            "records_excluded",
            stats.count(RecordState::RevPrescreenExcluded).to_string(),
        ),
        ("dbr_sought_reports", stats.sought().to_string()),
        ("dbr_notretrieved_reports", stats.not_retrieved().to_string()),
        ("dbr_assessed", stats.assessed().to_string()),
        ("dbr_excluded", exclusion),
        ("new_studies", stats.included().to_string()),
    ]
}

impl DataEndpoint for PrismaEndpoint {
    fn endpoint_id(&self) -> &str {
        "prisma"
    }

    fn default_setup(&self) -> EndpointSettings {
        EndpointSettings::Prisma {
            path: self.path.clone(),
        }
    }

    fn update(
        &self,
        ctx: &DataContext,
        arena: &RecordArena,
        _matrix: &SynthesisMatrix,
    ) -> Result<Vec<PathBuf>> {
        let stats = StatusStats::from_arena(arena);
        let path = ctx.path(&self.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writer.write_record(["data", "n"])?;
        for (data, n) in prisma_rows(&stats) {
            writer.write_record([data, n.as_str()])?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to write {}", path.display()))?;

        log::info!("exported {}", self.path.display());
        if !stats.is_review_complete() {
            log::warn!("review not (yet) complete, PRISMA counts are preliminary");
        }
        Ok(vec![self.path.clone()])
    }

    /// The diagram covers every eligible record once regenerated.
    fn completed_ids(&self, _ctx: &DataContext, eligible: &[String]) -> Result<BTreeSet<String>> {
        Ok(eligible.iter().cloned().collect())
    }
}
