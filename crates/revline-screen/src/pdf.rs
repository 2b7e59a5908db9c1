//! Full-text stage: link local PDFs to prescreen-included records and
//! check that they can be screened

use std::io::Read;
use std::path::Path;

use revline_core::{RecordArena, RecordState, ReviewError};

/// Field holding the PDF path, relative to the project.
pub const FILE_FIELD: &str = "file";

const NOT_A_PDF: &str = "not-a-pdf";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfSummary {
    pub imported: Vec<String>,
    pub needs_manual_retrieval: Vec<String>,
    pub prepared: Vec<String>,
    pub needs_manual_preparation: Vec<String>,
}

fn has_pdf_header(path: &Path) -> bool {
    let mut magic = [0u8; 5];
    match std::fs::File::open(path).and_then(|mut f| f.read_exact(&mut magic)) {
        Ok(()) => &magic == b"%PDF-",
        Err(e) => {
            log::debug!("{}: {e}", path.display());
            false
        }
    }
}

/// Link `<pdf_dir>/<ID>.pdf` to records awaiting a full text, then move
/// every imported PDF to `pdf_prepared` when it carries a PDF header.
///
/// Records without a file go to `pdf_needs_manual_retrieval`; unreadable
/// files go to `pdf_needs_manual_preparation`. Both are retried on the
/// next run.
pub fn get_pdfs(
    arena: &mut RecordArena,
    root: &Path,
    pdf_dir: &Path,
) -> Result<PdfSummary, ReviewError> {
    let mut summary = PdfSummary::default();

    let awaiting = [
        RecordState::RevPrescreenIncluded,
        RecordState::PdfNeedsManualRetrieval,
    ];
    for id in arena.ids_in(&awaiting) {
        let relative = pdf_dir.join(format!("{id}.pdf"));
        let record = arena.get_mut(&id)?;
        if root.join(&relative).is_file() {
            record.set_field(FILE_FIELD, relative.to_string_lossy(), "pdf_get");
            record.set_status(RecordState::PdfImported)?;
            summary.imported.push(id);
        } else if record.status() != RecordState::PdfNeedsManualRetrieval {
            record.set_status(RecordState::PdfNeedsManualRetrieval)?;
            summary.needs_manual_retrieval.push(id);
        }
    }

    let to_prepare = [
        RecordState::PdfImported,
        RecordState::PdfNeedsManualPreparation,
    ];
    for id in arena.ids_in(&to_prepare) {
        let record = arena.get_mut(&id)?;
        let readable = record
            .get(FILE_FIELD)
            .is_some_and(|file| has_pdf_header(&root.join(file)));
        if readable {
            record.remove_data_provenance_note(FILE_FIELD, NOT_A_PDF);
            record.set_status(RecordState::PdfPrepared)?;
            summary.prepared.push(id);
        } else {
            record.add_data_provenance_note(FILE_FIELD, NOT_A_PDF);
            if record.status() != RecordState::PdfNeedsManualPreparation {
                record.set_status(RecordState::PdfNeedsManualPreparation)?;
                summary.needs_manual_preparation.push(id);
            }
        }
    }

    log::info!(
        "pdfs: {} imported, {} prepared, {} to retrieve, {} to fix",
        summary.imported.len(),
        summary.prepared.len(),
        summary.needs_manual_retrieval.len(),
        summary.needs_manual_preparation.len()
    );
    Ok(summary)
}

/// Record that no full text can be obtained for `ids`.
pub fn mark_not_available(
    arena: &mut RecordArena,
    ids: &[String],
) -> Result<Vec<String>, ReviewError> {
    let mut marked = Vec::new();
    for id in ids {
        let record = arena.get_mut(id)?;
        if record.status() == RecordState::PdfNotAvailable {
            continue;
        }
        record.set_status(RecordState::PdfNotAvailable)?;
        marked.push(id.clone());
    }
    Ok(marked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use revline_core::Record;

    fn arena() -> RecordArena {
        let mut arena = RecordArena::new();
        for (id, status) in [
            ("A", RecordState::RevPrescreenIncluded),
            ("B", RecordState::RevPrescreenIncluded),
            ("C", RecordState::RevPrescreenIncluded),
            ("D", RecordState::MdProcessed),
        ] {
            arena.insert(Record::new(id, status)).unwrap();
        }
        arena
    }

    #[test]
    fn links_and_prepares_local_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        let pdfs = dir.path().join("data/pdfs");
        std::fs::create_dir_all(&pdfs).unwrap();
        std::fs::write(pdfs.join("A.pdf"), b"%PDF-1.7\n...").unwrap();
        std::fs::write(pdfs.join("B.pdf"), b"<html>login</html>").unwrap();

        let mut arena = arena();
        let summary = get_pdfs(&mut arena, dir.path(), Path::new("data/pdfs")).unwrap();
        assert_eq!(summary.imported, vec!["A", "B"]);
        assert_eq!(summary.prepared, vec!["A"]);
        assert_eq!(summary.needs_manual_preparation, vec!["B"]);
        assert_eq!(summary.needs_manual_retrieval, vec!["C"]);

        let a = arena.get("A").unwrap();
        assert_eq!(a.status(), RecordState::PdfPrepared);
        assert_eq!(a.get(FILE_FIELD), Some("data/pdfs/A.pdf"));
        assert_eq!(arena.get("D").unwrap().status(), RecordState::MdProcessed);

        // C's PDF arrives, B is replaced by the real file
        std::fs::write(pdfs.join("C.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(pdfs.join("B.pdf"), b"%PDF-1.4").unwrap();
        let summary = get_pdfs(&mut arena, dir.path(), Path::new("data/pdfs")).unwrap();
        assert_eq!(summary.imported, vec!["C"]);
        assert_eq!(summary.prepared, vec!["B", "C"]);
        assert!(summary.needs_manual_retrieval.is_empty());
    }

    #[test]
    fn not_available_only_from_retrieval_states() {
        let dir = tempfile::tempdir().unwrap();
        let mut arena = arena();
        get_pdfs(&mut arena, dir.path(), Path::new("data/pdfs")).unwrap();

        let marked = mark_not_available(&mut arena, &["A".to_string()]).unwrap();
        assert_eq!(marked, vec!["A"]);
        assert_eq!(arena.get("A").unwrap().status(), RecordState::PdfNotAvailable);
        assert!(mark_not_available(&mut arena, &["D".to_string()]).is_err());
    }
}
