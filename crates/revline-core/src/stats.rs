//! Status counts over the record collection

use std::collections::BTreeMap;

use serde::Serialize;

use crate::arena::RecordArena;
use crate::status::RecordState;

/// Field holding screening decisions as `criterion=in;criterion=out`.
pub const SCREENING_CRITERIA: &str = "screening_criteria";

/// Per-state record counts, retired records included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusStats {
    pub counts: BTreeMap<RecordState, usize>,
    /// Number of search results across all records (origin entries).
    pub origins: usize,
    /// Screening exclusion reasons with their counts.
    pub exclusion_reasons: BTreeMap<String, usize>,
}

impl StatusStats {
    pub fn from_arena(arena: &RecordArena) -> Self {
        let mut stats = Self::default();
        for slot in arena.iter() {
            let record = slot.record();
            *stats.counts.entry(record.status()).or_default() += 1;
            if slot.is_active() {
                stats.origins += record.origin().len();
            }
            if record.status() == RecordState::RevExcluded {
                for reason in excluded_criteria(record.get(SCREENING_CRITERIA)) {
                    *stats.exclusion_reasons.entry(reason).or_default() += 1;
                }
            }
        }
        stats
    }

    pub fn count(&self, state: RecordState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    /// Records at or past `stage`.
    pub fn count_post(&self, stage: RecordState) -> usize {
        RecordState::get_post_x_states(stage)
            .into_iter()
            .map(|s| self.count(s))
            .sum()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn duplicates_removed(&self) -> usize {
        self.count(RecordState::MdDuplicatesRemoved)
    }

    /// Records that went through prescreening.
    pub fn screened(&self) -> usize {
        self.count(RecordState::RevPrescreenExcluded) + self.sought()
    }

    /// Records sought for full-text retrieval.
    pub fn sought(&self) -> usize {
        self.count_post(RecordState::RevPrescreenIncluded)
    }

    pub fn not_retrieved(&self) -> usize {
        self.count(RecordState::PdfNotAvailable)
    }

    /// Full texts assessed for eligibility.
    pub fn assessed(&self) -> usize {
        self.count(RecordState::RevExcluded) + self.included()
    }

    pub fn included(&self) -> usize {
        self.count(RecordState::RevIncluded) + self.count(RecordState::RevSynthesized)
    }

    /// Every active record reached a final decision.
    pub fn is_review_complete(&self) -> bool {
        const FINAL: [RecordState; 5] = [
            RecordState::MdDuplicatesRemoved,
            RecordState::RevPrescreenExcluded,
            RecordState::PdfNotAvailable,
            RecordState::RevExcluded,
            RecordState::RevSynthesized,
        ];
        self.counts
            .iter()
            .all(|(state, &n)| n == 0 || FINAL.contains(state) || *state == RecordState::RevIncluded)
    }
}

fn excluded_criteria(criteria: Option<&str>) -> Vec<String> {
    criteria
        .unwrap_or("")
        .split(';')
        .filter_map(|item| item.split_once('='))
        .filter(|(_, decision)| decision.trim() == "out")
        .map(|(criterion, _)| criterion.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn counts_include_retired() {
        let mut arena = RecordArena::new();
        arena
            .insert(Record::new("A", RecordState::MdProcessed).with_origin("s/1"))
            .unwrap();
        arena
            .insert(Record::new("B", RecordState::MdPrepared).with_origin("s/2"))
            .unwrap();
        arena
            .insert(Record::new("C", RecordState::RevPrescreenIncluded).with_origin("s/3"))
            .unwrap();
        arena.merge_into("A", "B", true).unwrap();

        let stats = StatusStats::from_arena(&arena);
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.duplicates_removed(), 1);
        assert_eq!(stats.origins, 3);
        assert_eq!(stats.count_post(RecordState::MdProcessed), 2);
        assert_eq!(stats.sought(), 1);
        assert!(!stats.is_review_complete());
    }

    #[test]
    fn exclusion_reasons_counted() {
        let mut arena = RecordArena::new();
        arena
            .insert(
                Record::new("A", RecordState::RevExcluded)
                    .with_field(SCREENING_CRITERIA, "method=out;topic=in"),
            )
            .unwrap();
        arena
            .insert(
                Record::new("B", RecordState::RevExcluded)
                    .with_field(SCREENING_CRITERIA, "method=out;topic=out"),
            )
            .unwrap();
        arena
            .insert(Record::new("C", RecordState::RevSynthesized))
            .unwrap();
        let stats = StatusStats::from_arena(&arena);
        assert_eq!(stats.exclusion_reasons["method"], 2);
        assert_eq!(stats.exclusion_reasons["topic"], 1);
        assert_eq!(stats.assessed(), 3);
        assert_eq!(stats.included(), 1);
        assert!(stats.is_review_complete());
    }
}
