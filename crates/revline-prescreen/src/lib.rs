//! revline-prescreen: first inclusion decision on curated records
//!
//! Three ways to decide `md_processed` records: include everything,
//! exclude by scope restrictions, or round-trip a CSV table that
//! reviewers fill in (optionally split between several reviewers).

pub mod scope;
pub mod table;

use revline_core::{RecordArena, RecordState, ReviewError};

pub use scope::{scope_prescreen, OutletValue, PrescreenSettings, ScopeSettings, PRESCREEN_EXCLUSION};
pub use table::{create_split, export_table, import_table, TableImportSummary, INCLUSION_COLUMN};

/// Include every `md_processed` record. Returns the included IDs.
pub fn include_all(arena: &mut RecordArena) -> Result<Vec<String>, ReviewError> {
    let mut included = Vec::new();
    for record in arena.iter_active_mut() {
        if record.status() != RecordState::MdProcessed {
            continue;
        }
        record.set_status(RecordState::RevPrescreenIncluded)?;
        log::debug!("{}: included in prescreen (automatically)", record.id());
        included.push(record.id().to_string());
    }
    log::info!("prescreen: {} records included", included.len());
    Ok(included)
}

#[cfg(test)]
mod tests {
    use super::*;
    use revline_core::Record;

    #[test]
    fn include_all_only_touches_processed() {
        let mut arena = RecordArena::new();
        arena.insert(Record::new("A", RecordState::MdProcessed)).unwrap();
        arena.insert(Record::new("B", RecordState::MdPrepared)).unwrap();
        arena.insert(Record::new("C", RecordState::RevPrescreenExcluded)).unwrap();

        assert_eq!(include_all(&mut arena).unwrap(), vec!["A"]);
        assert_eq!(
            arena.get("A").unwrap().status(),
            RecordState::RevPrescreenIncluded
        );
        assert_eq!(arena.get("B").unwrap().status(), RecordState::MdPrepared);
        assert_eq!(
            arena.get("C").unwrap().status(),
            RecordState::RevPrescreenExcluded
        );
    }
}
