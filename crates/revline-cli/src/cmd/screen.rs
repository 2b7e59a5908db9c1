//! `revline screen` - final inclusion decision on full texts

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use revline_screen::{create_split, export_table, import_table, include_all};

use super::Project;

#[derive(Args, Debug)]
pub struct ScreenArgs {
    #[command(subcommand)]
    pub action: ScreenAction,
}

#[derive(Subcommand, Debug)]
pub enum ScreenAction {
    /// Include every record with a prepared PDF
    IncludeAll,
    /// Write the screen table for manual decisions
    Export {
        /// Table path, relative to the project
        #[arg(short, long, default_value = "screen/screen.csv")]
        output: PathBuf,

        /// Also export records that were already decided
        #[arg(long)]
        all: bool,
    },
    /// Apply the decisions of a filled-in screen table
    Import {
        #[arg(default_value = "screen/screen.csv")]
        table: PathBuf,
    },
    /// Split pending records into one table per reviewer
    Split {
        /// Number of reviewers
        n: usize,
    },
}

pub fn run(args: ScreenArgs, project: &mut Project) -> Result<()> {
    let mut arena = project.load_records()?;
    let root = project.root().to_path_buf();
    let criteria = project.settings.screen.criteria.clone();

    match args.action {
        ScreenAction::IncludeAll => {
            let included = include_all(&mut arena)?;
            if included.is_empty() {
                eprintln!("No records to screen.");
                return Ok(());
            }
            let commit = project.commit(Some(&arena), &[], "Screen (include all)")?;
            eprintln!("Included {} records (commit {})", included.len(), commit.id);
        }
        ScreenAction::Export { output, all } => {
            let todos_only = project.settings.screen.export_todos_only && !all;
            let rows = export_table(&arena, &root.join(&output), &[], &criteria, todos_only)?;
            eprintln!("Exported {rows} records to {}", output.display());
        }
        ScreenAction::Import { table } => {
            let before = arena.clone();
            let summary = import_table(&mut arena, &root.join(&table), &criteria)?;
            if arena == before {
                eprintln!("No screen decisions to apply ({} still TODO).", summary.todo);
                return Ok(());
            }
            let commit = project.commit(Some(&arena), &[], "Screen (table)")?;
            eprintln!(
                "{} included, {} excluded, {} TODO, {} skipped (commit {})",
                summary.included, summary.excluded, summary.todo, summary.skipped, commit.id
            );
        }
        ScreenAction::Split { n } => {
            if n == 0 {
                bail!("number of reviewers must be at least 1");
            }
            let todos_only = project.settings.screen.export_todos_only;
            for (i, group) in create_split(&arena, n).iter().enumerate() {
                // An empty split would export everything
                if group.is_empty() {
                    continue;
                }
                let name = PathBuf::from(format!("screen/screen_{}.csv", i + 1));
                let rows = export_table(&arena, &root.join(&name), group, &criteria, todos_only)?;
                eprintln!("{}: {rows} records", name.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use revline_core::{Record, RecordArena, RecordState};
    use revline_screen::ScreenCriterion;
    use revline_store::{Dataset, DatasetGateway};

    use crate::settings::ProjectSettings;

    fn project_with(arena: &RecordArena, settings: ProjectSettings) -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = Dataset::init(dir.path(), "Reviewer").unwrap();
        dataset.save_records(arena).unwrap();
        dataset.create_commit("Seed records").unwrap();
        (dir, Project { dataset, settings })
    }

    fn prepared(ids: &[&str]) -> RecordArena {
        let mut arena = RecordArena::new();
        for id in ids {
            arena
                .insert(Record::new(*id, RecordState::PdfPrepared).with_field("title", "Gig work"))
                .unwrap();
        }
        arena
    }

    #[test]
    fn table_round_trip_reaches_included() {
        let mut settings = ProjectSettings::default();
        settings
            .screen
            .criteria
            .insert("empirical".to_string(), ScreenCriterion::default());
        let (dir, mut project) = project_with(&prepared(&["A", "B"]), settings);

        let export = ScreenAction::Export {
            output: PathBuf::from("screen/screen.csv"),
            all: false,
        };
        run(ScreenArgs { action: export }, &mut project).unwrap();
        let path = dir.path().join("screen/screen.csv");
        let exported = std::fs::read_to_string(&path).unwrap();
        assert!(exported.lines().next().unwrap().ends_with(",empirical"));
        assert_eq!(exported.matches("TODO").count(), 2);

        std::fs::write(&path, "ID,empirical\nA,in\nB,out\n").unwrap();
        let import = ScreenAction::Import {
            table: PathBuf::from("screen/screen.csv"),
        };
        run(ScreenArgs { action: import }, &mut project).unwrap();

        let records = project.load_records().unwrap();
        assert_eq!(records.get("A").unwrap().status(), RecordState::RevIncluded);
        let b = records.get("B").unwrap();
        assert_eq!(b.status(), RecordState::RevExcluded);
        assert_eq!(b.get("screening_criteria"), Some("empirical=out"));
        assert_eq!(project.dataset.log().unwrap().len(), 2);
    }

    #[test]
    fn include_all_commits_once() {
        let (_dir, mut project) = project_with(&prepared(&["A"]), ProjectSettings::default());
        let args = ScreenArgs {
            action: ScreenAction::IncludeAll,
        };
        run(args, &mut project).unwrap();
        let records = project.load_records().unwrap();
        assert_eq!(records.get("A").unwrap().status(), RecordState::RevIncluded);
        assert_eq!(project.dataset.log().unwrap().len(), 2);

        // Nothing left to screen: no new commit
        let args = ScreenArgs {
            action: ScreenAction::IncludeAll,
        };
        run(args, &mut project).unwrap();
        assert_eq!(project.dataset.log().unwrap().len(), 2);
    }
}
