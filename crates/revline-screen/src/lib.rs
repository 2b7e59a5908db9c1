//! revline-screen: full texts and the final inclusion decision
//!
//! Prescreen-included records get a local PDF linked and checked, then
//! are screened on the full text: include everything, or round-trip a
//! CSV table coded directly or per inclusion criterion.

pub mod pdf;
pub mod settings;
pub mod table;

use revline_core::{RecordArena, RecordState, ReviewError};

pub use pdf::{get_pdfs, mark_not_available, PdfSummary, FILE_FIELD};
pub use settings::{PdfSettings, ScreenCriterion, ScreenSettings};
pub use table::{create_split, export_table, import_table, TableImportSummary, INCLUSION_COLUMN};

/// Include every `pdf_prepared` record. Returns the included IDs.
pub fn include_all(arena: &mut RecordArena) -> Result<Vec<String>, ReviewError> {
    let mut included = Vec::new();
    for record in arena.iter_active_mut() {
        if record.status() != RecordState::PdfPrepared {
            continue;
        }
        record.set_status(RecordState::RevIncluded)?;
        log::debug!("{}: included in screen (automatically)", record.id());
        included.push(record.id().to_string());
    }
    log::info!("screen: {} records included", included.len());
    Ok(included)
}
