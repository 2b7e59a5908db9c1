//! Per-source merge status: which search sources still have records
//! waiting for duplicate resolution

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use revline_core::{Record, RecordArena, RecordState};

const COLUMNS: [&str; 9] = [
    "ID", "status", "journal", "booktitle", "year", "volume", "number", "title", "author",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStatus {
    /// Active records with at least one origin from this source.
    pub total: usize,
    /// Those still before curation.
    pub waiting: Vec<String>,
}

impl SourceStatus {
    pub fn fully_merged(&self) -> bool {
        self.waiting.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMergeReport {
    pub sources: BTreeMap<String, SourceStatus>,
}

fn source_of(origin: &str) -> &str {
    origin.split_once('/').map_or(origin, |(file, _)| file)
}

/// Numeric-aware sort on year, volume, number. Missing or non-numeric
/// values sort last.
fn issue_order(a: &Record, b: &Record) -> Ordering {
    let key = |r: &Record, field: &str| -> (u64, String) {
        let value = r.get(field).unwrap_or("");
        (value.trim().parse().unwrap_or(u64::MAX), value.to_string())
    };
    ["year", "volume", "number"]
        .iter()
        .map(|f| key(a, *f).cmp(&key(b, *f)))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id().cmp(b.id()))
}

impl SourceMergeReport {
    pub fn from_arena(arena: &RecordArena) -> Self {
        let mut report = Self::default();
        for record in arena.iter_active() {
            let waiting = RecordState::PRE_CURATION.contains(&record.status());
            let mut seen = Vec::new();
            for origin in record.origin() {
                let source = source_of(origin);
                if seen.contains(&source) {
                    continue;
                }
                seen.push(source);
                let status = report.sources.entry(source.to_string()).or_default();
                status.total += 1;
                if waiting {
                    status.waiting.push(record.id().to_string());
                }
            }
        }
        report
    }

    /// Write `<dir>/<source>.csv` for every source that is not fully merged.
    pub fn export(&self, arena: &RecordArena, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (source, status) in &self.sources {
            if status.fully_merged() {
                log::info!("source {source} fully merged");
                continue;
            }
            log::info!("source {source} not fully merged ({} waiting)", status.waiting.len());
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;

            let mut records: Vec<&Record> = status
                .waiting
                .iter()
                .filter_map(|id| arena.get(id).ok())
                .collect();
            records.sort_by(|a, b| issue_order(a, b));

            let path = dir.join(format!("{source}.csv"));
            let mut writer = csv::Writer::from_path(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            writer.write_record(COLUMNS)?;
            for record in records {
                let status = record.status().to_string();
                let row = COLUMNS.map(|column| match column {
                    "ID" => record.id(),
                    "status" => status.as_str(),
                    field => record.get(field).unwrap_or(""),
                });
                writer.write_record(row)?;
            }
            writer
                .flush()
                .with_context(|| format!("failed to write {}", path.display()))?;
            written.push(path);
        }
        Ok(written)
    }
}
