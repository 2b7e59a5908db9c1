//! Table-based prescreen: export a CSV, reviewers mark `in`/`out`, import it back

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use revline_core::{RecordArena, RecordState};

pub const INCLUSION_COLUMN: &str = "prescreen_inclusion";

const FIELDS: [&str; 11] = [
    "ID", "author", "title", "journal", "booktitle", "year", "volume", "number", "pages", "doi",
    "abstract",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableImportSummary {
    pub included: usize,
    pub excluded: usize,
    pub todo: usize,
    /// Rows skipped with a warning (invalid value, unknown ID, illegal move).
    pub skipped: usize,
}

/// Write the prescreen table. Records from `md_processed` on are exported;
/// with `todos_only` only those still awaiting a decision. A non-empty
/// `split` restricts the table to those IDs. Returns the row count.
pub fn export_table(
    arena: &RecordArena,
    path: &Path,
    split: &[String],
    todos_only: bool,
) -> Result<usize> {
    let exported = RecordState::get_post_x_states(RecordState::MdProcessed);
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut header: Vec<&str> = FIELDS.to_vec();
    header.push(INCLUSION_COLUMN);
    writer.write_record(&header)?;

    let mut rows = 0;
    for record in arena.iter_active() {
        if !exported.contains(&record.status()) {
            continue;
        }
        if !split.is_empty() && !split.iter().any(|id| id == record.id()) {
            continue;
        }
        let inclusion = match record.status() {
            RecordState::MdProcessed => "TODO",
            _ if todos_only => continue,
            RecordState::RevPrescreenExcluded => "out",
            _ => "in",
        };
        let mut row: Vec<&str> = FIELDS
            .iter()
            .map(|&field| match field {
                "ID" => record.id(),
                field => record.get(field).unwrap_or(""),
            })
            .collect();
        row.push(inclusion);
        writer.write_record(&row)?;
        rows += 1;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("exported {rows} records to {}", path.display());
    log::info!("mark [in|out] in the {INCLUSION_COLUMN} column, then import the table");
    Ok(rows)
}

/// Apply the decisions of a filled-in prescreen table.
///
/// Records already past `rev_prescreen_included` are not touched by `in`.
/// Invalid values and unknown IDs are warned about and skipped.
pub fn import_table(arena: &mut RecordArena, path: &Path) -> Result<TableImportSummary> {
    if !path.is_file() {
        bail!("prescreen table not found: {}", path.display());
    }
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let Some(id_col) = headers.iter().position(|h| h == "ID") else {
        bail!("{}: ID column missing", path.display());
    };
    let Some(inclusion_col) = headers.iter().position(|h| h == INCLUSION_COLUMN) else {
        bail!("{}: {INCLUSION_COLUMN} column missing", path.display());
    };

    let post_included = RecordState::get_post_x_states(RecordState::RevPrescreenIncluded);
    let mut summary = TableImportSummary::default();
    let mut decisions: BTreeMap<String, String> = BTreeMap::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("malformed row in {}", path.display()))?;
        let id = row.get(id_col).unwrap_or("").trim().to_string();
        let value = row.get(inclusion_col).unwrap_or("").trim().to_string();
        decisions.insert(id, value);
    }

    for (id, value) in decisions {
        let Ok(record) = arena.get_mut(&id) else {
            log::warn!("ID not in records: {id}");
            summary.skipped += 1;
            continue;
        };
        let status = record.status();
        let target = match value.as_str() {
            "TODO" => {
                summary.todo += 1;
                continue;
            }
            "in" if post_included.contains(&status) => continue,
            "in" => RecordState::RevPrescreenIncluded,
            "out" => RecordState::RevPrescreenExcluded,
            other => {
                log::warn!("invalid value in {INCLUSION_COLUMN}: {other:?} ({id})");
                summary.skipped += 1;
                continue;
            }
        };
        if status == target {
            continue;
        }
        if target == RecordState::RevPrescreenExcluded
            && post_included.contains(&status)
            && status != RecordState::RevPrescreenIncluded
        {
            log::warn!("{id}: excluded in prescreen table although already {status}");
            record.override_status(target, "excluded in prescreen table");
        } else if let Err(err) = record.set_status(target) {
            log::warn!("{err}, skipping");
            summary.skipped += 1;
            continue;
        }
        match target {
            RecordState::RevPrescreenIncluded => summary.included += 1,
            _ => summary.excluded += 1,
        }
    }

    log::info!(
        "prescreen table: {} included, {} excluded, {} to do",
        summary.included,
        summary.excluded,
        summary.todo
    );
    Ok(summary)
}

/// Split the records awaiting prescreen into `n` near-equal groups.
pub fn create_split(arena: &RecordArena, n: usize) -> Vec<Vec<String>> {
    arena.split_ids(&[RecordState::MdProcessed], n)
}
