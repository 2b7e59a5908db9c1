//! Table-based screen: full texts are coded `in`/`out`, either directly or
//! per inclusion criterion, and imported back as the final decision

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use revline_core::stats::SCREENING_CRITERIA;
use revline_core::{RecordArena, RecordState};

use crate::settings::ScreenCriterion;

pub const INCLUSION_COLUMN: &str = "screen_inclusion";

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

/// `criterion=in;criterion=out` into a map.
fn parse_criteria(value: &str) -> BTreeMap<&str, &str> {
    value
        .split(';')
        .filter_map(|item| item.split_once('='))
        .map(|(name, decision)| (name.trim(), decision.trim()))
        .collect()
}

/// One row's decision, before it is applied to the record.
enum RowDecision {
    Todo,
    Invalid(String),
    Decided {
        target: RecordState,
        criteria: Option<String>,
    },
}

fn decide(values: &[(&str, &str)], coded: bool) -> RowDecision {
    if values.iter().any(|(_, v)| *v == "TODO" || v.is_empty()) {
        return RowDecision::Todo;
    }
    if let Some((name, v)) = values.iter().find(|(_, v)| *v != "in" && *v != "out") {
        return RowDecision::Invalid(format!("{name}: {v:?}"));
    }
    let target = if values.iter().any(|(_, v)| *v == "out") {
        RecordState::RevExcluded
    } else {
        RecordState::RevIncluded
    };
    let criteria = coded.then(|| {
        values
            .iter()
            .map(|(name, v)| format!("{name}={v}"))
            .collect::<Vec<_>>()
            .join(";")
    });
    RowDecision::Decided { target, criteria }
}

/// Write the screen table. Records in `pdf_prepared` are exported as
/// `TODO`; without `todos_only` decided records follow with their
/// decision. A non-empty `split` restricts the table to those IDs.
/// Returns the row count.
pub fn export_table(
    arena: &RecordArena,
    path: &Path,
    split: &[String],
    criteria: &BTreeMap<String, ScreenCriterion>,
    todos_only: bool,
) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut header: Vec<&str> = FIELDS.to_vec();
    if criteria.is_empty() {
        header.push(INCLUSION_COLUMN);
    } else {
        header.extend(criteria.keys().map(String::as_str));
    }
    writer.write_record(&header)?;

    let mut rows = 0;
    for record in arena.iter_active() {
        let decision = match record.status() {
            RecordState::PdfPrepared => "TODO",
            _ if todos_only => continue,
            RecordState::RevExcluded => "out",
            RecordState::RevIncluded | RecordState::RevSynthesized => "in",
            _ => continue,
        };
        if !split.is_empty() && !split.iter().any(|id| id == record.id()) {
            continue;
        }
        let mut row: Vec<&str> = FIELDS
            .iter()
            .map(|&field| match field {
                "ID" => record.id(),
                field => record.get(field).unwrap_or(""),
            })
            .collect();
        if criteria.is_empty() {
            row.push(decision);
        } else {
            let coded = parse_criteria(record.get(SCREENING_CRITERIA).unwrap_or(""));
            row.extend(
                criteria
                    .keys()
                    .map(|name| coded.get(name.as_str()).copied().unwrap_or("TODO")),
            );
        }
        writer.write_record(&row)?;
        rows += 1;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("exported {rows} records to {}", path.display());
    if criteria.is_empty() {
        log::info!("mark [in|out] in the {INCLUSION_COLUMN} column, then import the table");
    } else {
        log::info!("mark [in|out] per criterion, then import the table");
    }
    Ok(rows)
}

/// Apply the decisions of a filled-in screen table.
///
/// With criteria every criterion column must be coded; a record is
/// excluded when any criterion is `out`, and the coding is kept in
/// `screening_criteria`. Rows with a `TODO` are counted and left alone.
pub fn import_table(
    arena: &mut RecordArena,
    path: &Path,
    criteria: &BTreeMap<String, ScreenCriterion>,
) -> Result<TableImportSummary> {
    if !path.is_file() {
        bail!("screen table not found: {}", path.display());
    }
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let Some(id_col) = column("ID") else {
        bail!("{}: ID column missing", path.display());
    };
    let names: Vec<&str> = if criteria.is_empty() {
        vec![INCLUSION_COLUMN]
    } else {
        criteria.keys().map(String::as_str).collect()
    };
    let mut decision_cols = Vec::with_capacity(names.len());
    for name in &names {
        let Some(col) = column(name) else {
            bail!("{}: {name} column missing", path.display());
        };
        decision_cols.push(col);
    }

    let mut rows: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("malformed row in {}", path.display()))?;
        let id = row.get(id_col).unwrap_or("").trim().to_string();
        let values = decision_cols
            .iter()
            .map(|&col| row.get(col).unwrap_or("").trim().to_string())
            .collect();
        rows.insert(id, values);
    }

    let mut summary = TableImportSummary::default();
    for (id, values) in rows {
        let Ok(record) = arena.get_mut(&id) else {
            log::warn!("ID not in records: {id}");
            summary.skipped += 1;
            continue;
        };
        let pairs: Vec<(&str, &str)> = names
            .iter()
            .copied()
            .zip(values.iter().map(String::as_str))
            .collect();
        let (target, coded) = match decide(&pairs, !criteria.is_empty()) {
            RowDecision::Todo => {
                summary.todo += 1;
                continue;
            }
            RowDecision::Invalid(what) => {
                log::warn!("invalid screen decision {what} ({id})");
                summary.skipped += 1;
                continue;
            }
            RowDecision::Decided { target, criteria } => (target, criteria),
        };

        let status = record.status();
        let recoded = coded.as_deref().is_some_and(|c| record.get(SCREENING_CRITERIA) != Some(c));
        if target == RecordState::RevIncluded && status == RecordState::RevSynthesized {
            continue;
        }
        if status == target && !recoded {
            continue;
        }
        if status == RecordState::RevSynthesized {
            log::warn!("{id}: excluded in screen table although already {status}");
            record.override_status(target, "excluded in screen table");
        } else if let Err(err) = record.set_status(target) {
            log::warn!("{err}, skipping");
            summary.skipped += 1;
            continue;
        }
        if let Some(coded) = coded {
            record.set_field(SCREENING_CRITERIA, coded, "screen");
        }
        match target {
            RecordState::RevIncluded => summary.included += 1,
            _ => summary.excluded += 1,
        }
    }

    log::info!(
        "screen table: {} included, {} excluded, {} to do",
        summary.included,
        summary.excluded,
        summary.todo
    );
    Ok(summary)
}

/// Split the records awaiting screen into `n` near-equal groups.
pub fn create_split(arena: &RecordArena, n: usize) -> Vec<Vec<String>> {
    arena.split_ids(&[RecordState::PdfPrepared], n)
}
