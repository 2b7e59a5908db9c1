//! `revline status` - record counts per status

use anyhow::Result;
use clap::Args;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, CellAlignment, Color, Table};
use revline_core::{fmt_num, RecordState, StatusStats};
use revline_store::DatasetGateway;

use super::Project;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Also list states without records
    #[arg(long)]
    pub all: bool,
}

/// Suggested next command for the furthest-behind records.
fn next_step(stats: &StatusStats) -> Option<&'static str> {
    let pending = |s| stats.count(s) > 0;
    if pending(RecordState::MdImported) || pending(RecordState::MdNeedsManualPreparation) {
        Some("revline prep")
    } else if pending(RecordState::MdPrepared) {
        Some("revline dedupe")
    } else if pending(RecordState::MdProcessed) {
        Some("revline prescreen")
    } else if pending(RecordState::RevPrescreenIncluded)
        || pending(RecordState::PdfNeedsManualRetrieval)
        || pending(RecordState::PdfImported)
        || pending(RecordState::PdfNeedsManualPreparation)
    {
        Some("revline pdfs")
    } else if pending(RecordState::PdfPrepared) {
        Some("revline screen")
    } else if pending(RecordState::RevIncluded) {
        Some("revline data")
    } else {
        None
    }
}

pub fn run(args: StatusArgs, project: &Project) -> Result<()> {
    let arena = project.load_records()?;
    let stats = StatusStats::from_arena(&arena);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Status").fg(Color::Cyan),
            Cell::new("Records").fg(Color::Cyan),
        ]);
    for state in RecordState::ALL {
        let n = stats.count(state);
        if n == 0 && !args.all {
            continue;
        }
        table.add_row(vec![
            Cell::new(state),
            Cell::new(fmt_num(n)).set_alignment(CellAlignment::Right),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!(
        "{} active records from {} search results, {} duplicates removed",
        fmt_num(arena.active_len()),
        fmt_num(stats.origins),
        fmt_num(stats.duplicates_removed())
    );
    if project.dataset.has_changes()? {
        eprintln!("Uncommitted changes in the project.");
    }
    if stats.total() > 0 && stats.is_review_complete() {
        eprintln!("Review complete.");
    } else if let Some(step) = next_step(&stats) {
        eprintln!("Next: {step}");
    }
    Ok(())
}
