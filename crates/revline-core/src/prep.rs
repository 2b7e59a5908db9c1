//! Metadata preparation: quality checks decide prepared vs manual work

use crate::arena::RecordArena;
use crate::error::ReviewError;
use crate::quality::{run_checks, QualityChecker};
use crate::status::RecordState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepSummary {
    pub prepared: Vec<String>,
    pub needs_manual_preparation: Vec<String>,
}

/// Check every `md_imported` and `md_needs_manual_preparation` record.
///
/// Records without defects move to `md_prepared`, the rest to (or stay in)
/// `md_needs_manual_preparation`.
pub fn prep(
    arena: &mut RecordArena,
    checkers: &[Box<dyn QualityChecker>],
) -> Result<PrepSummary, ReviewError> {
    let mut summary = PrepSummary::default();
    for record in arena.iter_active_mut() {
        if !matches!(
            record.status(),
            RecordState::MdImported | RecordState::MdNeedsManualPreparation
        ) {
            continue;
        }
        if run_checks(record, checkers) {
            record.set_status(RecordState::MdNeedsManualPreparation)?;
            summary.needs_manual_preparation.push(record.id().to_string());
        } else {
            record.set_status(RecordState::MdPrepared)?;
            summary.prepared.push(record.id().to_string());
        }
    }
    log::info!(
        "prep: {} prepared, {} need manual preparation",
        summary.prepared.len(),
        summary.needs_manual_preparation.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::default_checkers;
    use crate::record::Record;

    #[test]
    fn defects_route_to_manual_preparation() {
        let mut arena = RecordArena::new();
        arena
            .insert(Record::new("A", RecordState::MdImported).with_field("year", "2020"))
            .unwrap();
        arena
            .insert(Record::new("B", RecordState::MdImported).with_field("year", "20x0"))
            .unwrap();
        arena
            .insert(Record::new("C", RecordState::MdProcessed).with_field("year", "bad"))
            .unwrap();

        let summary = prep(&mut arena, &default_checkers()).unwrap();
        assert_eq!(summary.prepared, vec!["A"]);
        assert_eq!(summary.needs_manual_preparation, vec!["B"]);
        assert_eq!(arena.get("C").unwrap().status(), RecordState::MdProcessed);

        // Fix the defect and re-run
        arena.get_mut("B").unwrap().fields.insert("year".into(), "2020".into());
        let summary = prep(&mut arena, &default_checkers()).unwrap();
        assert_eq!(summary.prepared, vec!["B"]);
        assert_eq!(arena.get("B").unwrap().status(), RecordState::MdPrepared);
    }
}
