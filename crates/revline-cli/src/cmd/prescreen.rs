//! `revline prescreen` - first inclusion decision on curated records

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use revline_prescreen::{create_split, export_table, import_table, include_all, scope_prescreen};

use super::Project;

#[derive(Args, Debug)]
pub struct PrescreenArgs {
    #[command(subcommand)]
    pub action: PrescreenAction,
}

#[derive(Subcommand, Debug)]
pub enum PrescreenAction {
    /// Include every processed record
    IncludeAll,
    /// Exclude records outside the scope in [prescreen.scope]
    Scope,
    /// Write the prescreen table for manual decisions
    Export {
        /// Table path, relative to the project
        #[arg(short, long, default_value = "prescreen.csv")]
        output: PathBuf,

        /// Also export records that were already decided
        #[arg(long)]
        all: bool,
    },
    /// Apply the decisions of a filled-in prescreen table
    Import {
        #[arg(default_value = "prescreen.csv")]
        table: PathBuf,
    },
    /// Split pending records into one table per reviewer
    Split {
        /// Number of reviewers
        n: usize,
    },
}

pub fn run(args: PrescreenArgs, project: &mut Project) -> Result<()> {
    let mut arena = project.load_records()?;
    let root = project.root().to_path_buf();

    match args.action {
        PrescreenAction::IncludeAll => {
            let included = include_all(&mut arena)?;
            if included.is_empty() {
                eprintln!("No records to prescreen.");
                return Ok(());
            }
            let commit = project.commit(Some(&arena), &[], "Pre-screen (include all)")?;
            eprintln!("Included {} records (commit {})", included.len(), commit.id);
        }
        PrescreenAction::Scope => {
            let scope = project.settings.prescreen.scope.clone();
            if scope.is_empty() {
                bail!("no scope restrictions in [prescreen.scope] of settings.toml");
            }
            let excluded = scope_prescreen(&mut arena, &scope)?;
            if excluded.is_empty() {
                eprintln!("All records within scope.");
                return Ok(());
            }
            let commit = project.commit(Some(&arena), &[], "Pre-screen (scope)")?;
            eprintln!("Excluded {} records (commit {})", excluded.len(), commit.id);
        }
        PrescreenAction::Export { output, all } => {
            let todos_only = project.settings.prescreen.export_todos_only && !all;
            let rows = export_table(&arena, &root.join(&output), &[], todos_only)?;
            eprintln!("Exported {rows} records to {}", output.display());
        }
        PrescreenAction::Import { table } => {
            let before = arena.clone();
            let summary = import_table(&mut arena, &root.join(&table))?;
            if arena == before {
                eprintln!("No prescreen decisions to apply ({} still TODO).", summary.todo);
                return Ok(());
            }
            let commit = project.commit(Some(&arena), &[], "Pre-screen (table)")?;
            eprintln!(
                "{} included, {} excluded, {} TODO, {} skipped (commit {})",
                summary.included, summary.excluded, summary.todo, summary.skipped, commit.id
            );
        }
        PrescreenAction::Split { n } => {
            if n == 0 {
                bail!("number of reviewers must be at least 1");
            }
            let todos_only = project.settings.prescreen.export_todos_only;
            for (i, group) in create_split(&arena, n).iter().enumerate() {
                // An empty split would export everything
                if group.is_empty() {
                    continue;
                }
                let name = format!("prescreen_{}.csv", i + 1);
                let rows = export_table(&arena, &root.join(&name), group, todos_only)?;
                eprintln!("{name}: {rows} records");
            }
        }
    }
    Ok(())
}
