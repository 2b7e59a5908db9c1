//! `revline import` - load search results into the record collection

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use revline_core::ProgressContext;
use revline_store::import_search_file;

use super::Project;
use crate::settings::SourceSettings;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Search result files (JSON). Copied to data/search/ and registered
    /// as sources. Without files, every registered source is imported.
    pub files: Vec<PathBuf>,

    /// Description of the search, stored with newly registered sources
    #[arg(long)]
    pub search: Option<String>,
}

pub fn run(args: ImportArgs, project: &mut Project, progress: &ProgressContext) -> Result<()> {
    let search_dir = project.dataset.search_dir();
    let mut changed_paths = Vec::new();

    for file in &args.files {
        let name = file
            .file_name()
            .with_context(|| format!("no file name in {}", file.display()))?;
        let target = search_dir.join(name);
        if file.canonicalize().ok() != target.canonicalize().ok() {
            std::fs::copy(file, &target).with_context(|| {
                format!("failed to copy {} to {}", file.display(), target.display())
            })?;
        }
        let filename = PathBuf::from(name);
        if !project.settings.has_source(&filename) {
            log::info!("registering source {}", filename.display());
            project.settings.sources.push(SourceSettings {
                filename,
                search: args.search.clone(),
            });
        }
        changed_paths.push(target);
    }

    if project.settings.sources.is_empty() {
        bail!("no search sources registered; pass search result files to import");
    }

    let mut arena = project.load_records()?;
    let before = arena.len();
    let bar = progress.counter("import", project.settings.sources.len() as u64);
    for source in &project.settings.sources {
        let path = search_dir.join(&source.filename);
        let summary = import_search_file(&mut arena, &path)?;
        log::info!(
            "{}: {} imported, {} already present",
            source.filename.display(),
            summary.imported.len(),
            summary.already_present
        );
        if !changed_paths.contains(&path) {
            changed_paths.push(path);
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    if !args.files.is_empty() {
        project.save_settings()?;
    }
    let imported = arena.len() - before;
    if imported == 0 && args.files.is_empty() {
        eprintln!("No new search results.");
        return Ok(());
    }
    let commit = project.commit(Some(&arena), &changed_paths, "Import search results")?;
    eprintln!(
        "Imported {} records ({} total), commit {}",
        revline_core::fmt_num(imported),
        revline_core::fmt_num(arena.active_len()),
        commit.id
    );
    Ok(())
}
