//! `revline prep` - metadata checks deciding prepared vs. manual preparation

use anyhow::Result;
use clap::Args;
use revline_core::{default_checkers, prep, ProgressContext};

use super::Project;

#[derive(Args, Debug)]
pub struct PrepArgs {}

pub fn run(_args: PrepArgs, project: &mut Project, progress: &ProgressContext) -> Result<()> {
    let mut arena = project.load_records()?;
    let spinner = progress.stage_line("prep");
    let summary = prep(&mut arena, &default_checkers())?;
    spinner.finish_and_clear();

    if summary.prepared.is_empty() && summary.needs_manual_preparation.is_empty() {
        eprintln!("No records to prepare.");
        return Ok(());
    }
    let commit = project.commit(Some(&arena), &[], "Prepare records")?;
    eprintln!(
        "{} prepared, {} need manual preparation (commit {})",
        summary.prepared.len(),
        summary.needs_manual_preparation.len(),
        commit.id
    );
    for id in &summary.needs_manual_preparation {
        let record = arena.get(id)?;
        progress.println(format!("  {id}: {}", record.citation()));
    }
    Ok(())
}
