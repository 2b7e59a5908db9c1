//! Merge decisions and the survivor rule

use std::cmp::Ordering;

use revline_core::Record;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Duplicate,
    NotDuplicate,
}

/// Outcome of comparing two records. For duplicates `id1` is the record
/// expected to survive; [`choose_survivor`] has the final word on apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDecision {
    pub id1: String,
    pub id2: String,
    pub decision: Decision,
}

impl MergeDecision {
    pub fn duplicate(id1: &str, id2: &str) -> Self {
        Self {
            id1: id1.to_string(),
            id2: id2.to_string(),
            decision: Decision::Duplicate,
        }
    }

    pub fn not_duplicate(id1: &str, id2: &str) -> Self {
        Self {
            id1: id1.to_string(),
            id2: id2.to_string(),
            decision: Decision::NotDuplicate,
        }
    }
}

/// Position of the record's best origin in the preferred source list.
fn source_rank(record: &Record, preferred_sources: &[String]) -> usize {
    record
        .origin()
        .iter()
        .filter_map(|origin| {
            let file = origin.split_once('/').map_or(origin.as_str(), |(f, _)| f);
            preferred_sources.iter().position(|s| s == file)
        })
        .min()
        .unwrap_or(usize::MAX)
}

/// `Greater` when `a` should survive a merge with `b`.
///
/// Higher status wins; then the earlier preferred source; then a curated
/// record; then the smaller ID.
pub fn survivor_order(a: &Record, b: &Record, preferred_sources: &[String]) -> Ordering {
    a.status()
        .cmp(&b.status())
        .then_with(|| {
            source_rank(b, preferred_sources).cmp(&source_rank(a, preferred_sources))
        })
        .then_with(|| a.is_curated().cmp(&b.is_curated()))
        .then_with(|| b.id().cmp(a.id()))
}

/// Returns `(survivor, loser)`.
pub fn choose_survivor<'a>(
    a: &'a Record,
    b: &'a Record,
    preferred_sources: &[String],
) -> (&'a Record, &'a Record) {
    match survivor_order(a, b, preferred_sources) {
        Ordering::Less => (b, a),
        _ => (a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revline_core::RecordState;

    #[test]
    fn higher_status_survives() {
        let a = Record::new("A", RecordState::MdPrepared);
        let b = Record::new("B", RecordState::RevIncluded);
        let (survivor, loser) = choose_survivor(&a, &b, &[]);
        assert_eq!(survivor.id(), "B");
        assert_eq!(loser.id(), "A");
    }

    #[test]
    fn preferred_source_breaks_tie() {
        let a = Record::new("A", RecordState::MdProcessed).with_origin("scopus.json/1");
        let b = Record::new("B", RecordState::MdProcessed).with_origin("crossref.json/7");
        let prefs = vec!["crossref.json".to_string(), "scopus.json".to_string()];
        assert_eq!(choose_survivor(&a, &b, &prefs).0.id(), "B");
        assert_eq!(choose_survivor(&b, &a, &prefs).0.id(), "B");
    }

    #[test]
    fn curated_then_id_break_ties() {
        let a = Record::new("A", RecordState::MdProcessed);
        let mut b = Record::new("B", RecordState::MdProcessed);
        assert_eq!(choose_survivor(&a, &b, &[]).0.id(), "A");
        assert_eq!(choose_survivor(&b, &a, &[]).0.id(), "A");
        b.mark_curated("curation");
        assert_eq!(choose_survivor(&a, &b, &[]).0.id(), "B");
    }
}
