//! `revline log` - commit history of the project

use anyhow::{bail, Result};
use clap::Args;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use super::Project;

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Verify snapshots of the latest commit
    #[arg(long)]
    pub verify: bool,
}

pub fn run(args: LogArgs, project: &Project) -> Result<()> {
    if args.verify {
        return verify(project);
    }
    let commits = project.dataset.log()?;
    if commits.is_empty() {
        eprintln!("No commits.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Commit").fg(Color::Cyan),
            Cell::new("Date").fg(Color::Cyan),
            Cell::new("Author").fg(Color::Cyan),
            Cell::new("Message").fg(Color::Cyan),
            Cell::new("Files").fg(Color::Cyan),
        ]);
    for commit in &commits {
        table.add_row(vec![
            Cell::new(&commit.id),
            Cell::new(commit.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&commit.author),
            Cell::new(&commit.message),
            Cell::new(commit.changed.join("\n")),
        ]);
    }
    eprintln!("\n{table}");
    eprintln!("{} commits", commits.len());
    Ok(())
}

fn verify(project: &Project) -> Result<()> {
    let results = project.dataset.verify()?;
    let mut failed = 0;
    for result in &results {
        if result.ok() {
            log::debug!("{}: ok", result.path);
        } else {
            failed += 1;
            eprintln!(
                "{}: expected {}, found {}",
                result.path,
                &result.expected[..8.min(result.expected.len())],
                result.actual.as_deref().unwrap_or("missing")
            );
        }
    }
    if failed > 0 {
        bail!("{failed} of {} snapshots failed verification", results.len());
    }
    eprintln!("{} snapshots verified", results.len());
    Ok(())
}
