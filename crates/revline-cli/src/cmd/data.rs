//! `revline data` - update synthesis endpoints and record synthesis status

use anyhow::{bail, Result};
use clap::Args;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use revline_core::ProgressContext;
use revline_data::{reconcile, update_data, DataContext, EndpointSettings, SynthesisMatrix};

use super::Project;

#[derive(Args, Debug)]
pub struct DataArgs {
    /// Add an endpoint (manuscript, structured, prisma, zettlr)
    #[arg(long)]
    pub add: Option<String>,

    /// Only show the synthesis status matrix
    #[arg(long)]
    pub matrix: bool,
}

fn print_matrix(matrix: &SynthesisMatrix) {
    let mut rows = matrix.rows().peekable();
    let Some((_, first)) = rows.peek() else {
        eprintln!("No records eligible for synthesis.");
        return;
    };
    let mut header = vec![Cell::new("ID").fg(Color::Cyan)];
    header.extend(first.keys().map(|e| Cell::new(e).fg(Color::Cyan)));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    for (id, row) in rows {
        let mut cells = vec![Cell::new(id)];
        cells.extend(row.values().map(|&done| {
            if done {
                Cell::new("done").fg(Color::Green)
            } else {
                Cell::new("pending").fg(Color::DarkGrey)
            }
        }));
        table.add_row(cells);
    }
    eprintln!("\n{table}");
    eprintln!(
        "{} of {} records synthesized",
        matrix.synthesized_ids().len(),
        matrix.len()
    );
}

pub fn run(args: DataArgs, project: &mut Project, progress: &ProgressContext) -> Result<()> {
    if let Some(kind) = args.add {
        let Some(endpoint) = EndpointSettings::defaults(&kind) else {
            bail!(
                "unknown data endpoint {kind} (available: {})",
                EndpointSettings::KINDS.join(", ")
            );
        };
        if project.settings.data.has(&kind) {
            bail!("data endpoint {kind} already configured");
        }
        project.settings.data.endpoints.push(endpoint);
        project.save_settings()?;
        let commit = project.commit(None, &[], &format!("Add data endpoint {kind}"))?;
        eprintln!("Added {kind} endpoint (commit {})", commit.id);
        return Ok(());
    }

    let endpoints = project.settings.data.build_endpoints()?;
    if endpoints.is_empty() {
        log::warn!("no data endpoints configured (add one with `revline data --add <kind>`)");
        return Ok(());
    }
    let ctx = DataContext::new(project.root(), project.settings.project.clone());
    let mut arena = project.load_records()?;

    if args.matrix {
        print_matrix(&reconcile(&ctx, &arena, &endpoints)?);
        return Ok(());
    }

    let spinner = progress.stage_line("data");
    let summary = update_data(&ctx, &mut arena, &endpoints)?;
    spinner.finish_and_clear();

    if summary.written.is_empty() && !summary.applied.changed() {
        eprintln!("Data endpoints up to date.");
    } else {
        let records = summary.applied.changed().then_some(&arena);
        let commit = project.commit(records, &summary.written, "Update data endpoints")?;
        eprintln!(
            "{} files updated, {} records synthesized, {} reopened (commit {})",
            summary.written.len(),
            summary.applied.synthesized.len(),
            summary.applied.reopened.len(),
            commit.id
        );
    }
    print_matrix(&reconcile(&ctx, &arena, &endpoints)?);
    Ok(())
}
