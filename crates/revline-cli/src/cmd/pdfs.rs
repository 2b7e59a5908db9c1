//! `revline pdfs` - link full texts to prescreen-included records

use anyhow::Result;
use clap::Args;
use revline_screen::{get_pdfs, mark_not_available};

use super::Project;

#[derive(Args, Debug)]
pub struct PdfsArgs {
    /// Record that no PDF can be obtained for these IDs
    #[arg(long, value_name = "ID", num_args = 1..)]
    pub not_available: Vec<String>,
}

pub fn run(args: PdfsArgs, project: &mut Project) -> Result<()> {
    let mut arena = project.load_records()?;

    if !args.not_available.is_empty() {
        let marked = mark_not_available(&mut arena, &args.not_available)?;
        if marked.is_empty() {
            eprintln!("Records already marked not available.");
            return Ok(());
        }
        let commit = project.commit(Some(&arena), &[], "Mark PDFs not available")?;
        eprintln!("{} records not available (commit {})", marked.len(), commit.id);
        return Ok(());
    }

    let pdf_dir = project.settings.pdfs.dir.clone();
    let before = arena.clone();
    let summary = get_pdfs(&mut arena, project.root(), &pdf_dir)?;
    if arena == before {
        eprintln!("No PDFs to link.");
    } else {
        let commit = project.commit(Some(&arena), &[], "Retrieve PDFs")?;
        eprintln!(
            "{} imported, {} prepared (commit {})",
            summary.imported.len(),
            summary.prepared.len(),
            commit.id
        );
    }
    if !summary.needs_manual_retrieval.is_empty() {
        eprintln!(
            "Place <ID>.pdf in {} for: {}",
            pdf_dir.display(),
            summary.needs_manual_retrieval.join(", ")
        );
    }
    if !summary.needs_manual_preparation.is_empty() {
        eprintln!(
            "Not a readable PDF: {}",
            summary.needs_manual_preparation.join(", ")
        );
    }
    Ok(())
}
