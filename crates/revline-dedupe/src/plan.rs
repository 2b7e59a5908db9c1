//! Candidate planning: which records need a decision, and against what

use rayon::prelude::*;
use revline_core::{Record, RecordArena, RecordState};
use rustc_hash::FxHashMap;

use crate::settings::DedupeSettings;

/// A same-issue record offered as a possible duplicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub similarity: f64,
    pub highlighted: bool,
}

/// A record in scope with its ranked candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanItem {
    pub record_id: String,
    pub toc_key: String,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupePlan {
    pub items: Vec<PlanItem>,
    /// In-scope records without a TOC key, with the reason.
    pub not_toc_identifiable: Vec<(String, String)>,
    /// In-scope records whose issue has no curated record.
    pub no_candidates: Vec<String>,
}

impl DedupePlan {
    pub fn in_scope(&self) -> usize {
        self.items.len() + self.not_toc_identifiable.len() + self.no_candidates.len()
    }
}

fn is_candidate_state(state: RecordState) -> bool {
    !RecordState::PRE_CURATION.contains(&state)
}

/// Partition records by TOC key, rank same-issue curated candidates.
///
/// Records are visited in ID order and candidates are ordered by
/// similarity (descending) then ID, so the plan is deterministic.
pub fn plan(arena: &RecordArena, settings: &DedupeSettings) -> DedupePlan {
    let scope = settings.scope.states();
    let records: Vec<&Record> = arena.iter_active().collect();

    let keyed: Vec<(&Record, Result<String, String>)> = records
        .par_iter()
        .map(|r| (*r, r.get_toc_key().map_err(|e| e.to_string())))
        .collect();

    let mut by_toc: FxHashMap<&str, Vec<&Record>> = FxHashMap::default();
    for (record, key) in &keyed {
        if let Ok(key) = key {
            if is_candidate_state(record.status()) {
                by_toc.entry(key.as_str()).or_default().push(record);
            }
        }
    }

    let mut plan = DedupePlan::default();
    let in_scope: Vec<(&Record, &str)> = keyed
        .iter()
        .filter(|(r, _)| scope.contains(&r.status()))
        .filter_map(|(r, key)| match key {
            Ok(key) => Some((*r, key.as_str())),
            Err(reason) => {
                log::debug!("{}: skipped, {reason}", r.id());
                plan.not_toc_identifiable
                    .push((r.id().to_string(), reason.clone()));
                None
            }
        })
        .collect();

    let ranked: Vec<(String, String, Vec<Candidate>)> = in_scope
        .par_iter()
        .map(|(record, key)| {
            let mut candidates: Vec<Candidate> = by_toc
                .get(key)
                .map(|pool| {
                    pool.iter()
                        .filter(|c| c.id() != record.id())
                        .map(|c| {
                            let similarity = c.get_similarity(record);
                            Candidate {
                                id: c.id().to_string(),
                                similarity,
                                highlighted: similarity > settings.highlight_threshold,
                            }
                        })
                        .collect()
                })
                .unwrap_or_default();
            candidates.sort_by(|a, b| {
                b.similarity
                    .total_cmp(&a.similarity)
                    .then_with(|| a.id.cmp(&b.id))
            });
            candidates.truncate(settings.max_candidates);
            (record.id().to_string(), key.to_string(), candidates)
        })
        .collect();

    for (record_id, toc_key, candidates) in ranked {
        if candidates.is_empty() {
            plan.no_candidates.push(record_id);
        } else {
            plan.items.push(PlanItem {
                record_id,
                toc_key,
                candidates,
            });
        }
    }

    log::info!(
        "dedupe plan: {} to decide, {} without curated counterpart, {} not TOC-identifiable",
        plan.items.len(),
        plan.no_candidates.len(),
        plan.not_toc_identifiable.len()
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, status: RecordState, title: &str, number: &str) -> Record {
        Record::new(id, status)
            .with_field("title", title)
            .with_field("journal", "X")
            .with_field("volume", "1")
            .with_field("number", number)
    }

    fn arena(records: Vec<Record>) -> RecordArena {
        let mut arena = RecordArena::new();
        for r in records {
            arena.insert(r).unwrap();
        }
        arena
    }

    #[test]
    fn candidates_are_same_issue_curated_records() {
        let arena = arena(vec![
            article("R1", RecordState::MdPrepared, "Digital Work", "1"),
            article("R2", RecordState::MdProcessed, "Digital Work Study", "1"),
            article("R3", RecordState::RevIncluded, "Something else entirely", "1"),
            article("R4", RecordState::MdProcessed, "Digital Work", "2"),
            article("R5", RecordState::MdPrepared, "Digital Work", "1"),
        ]);
        let plan = plan(&arena, &DedupeSettings::default());

        assert_eq!(plan.items.len(), 2);
        let item = &plan.items[0];
        assert_eq!(item.record_id, "R1");
        assert_eq!(item.toc_key, "x|1|1");
        let ids: Vec<_> = item.candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["R2", "R3"]);
        assert!(item.candidates[0].highlighted);
        assert!(!item.candidates[1].highlighted);
    }

    #[test]
    fn not_toc_identifiable_is_reported_not_fatal() {
        let arena = arena(vec![
            Record::new("R1", RecordState::MdPrepared).with_field("title", "No venue"),
            article("R2", RecordState::MdProcessed, "No venue", "1"),
        ]);
        let plan = plan(&arena, &DedupeSettings::default());
        assert!(plan.items.is_empty());
        assert_eq!(plan.not_toc_identifiable.len(), 1);
        assert_eq!(plan.not_toc_identifiable[0].0, "R1");
    }

    #[test]
    fn candidates_capped() {
        let mut records = vec![article("R0", RecordState::MdPrepared, "Digital Work", "1")];
        for i in 1..=5 {
            records.push(article(
                &format!("C{i}"),
                RecordState::MdProcessed,
                "Digital Work",
                "1",
            ));
        }
        let settings = DedupeSettings {
            max_candidates: 3,
            ..DedupeSettings::default()
        };
        let plan = plan(&arena(records), &settings);
        let ids: Vec<_> = plan.items[0].candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C2", "C3"]);
    }

    #[test]
    fn issue_without_curated_record() {
        let arena = arena(vec![article("R1", RecordState::MdPrepared, "Digital Work", "1")]);
        let plan = plan(&arena, &DedupeSettings::default());
        assert_eq!(plan.no_candidates, vec!["R1"]);
        assert_eq!(plan.in_scope(), 1);
    }
}
