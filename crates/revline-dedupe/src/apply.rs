//! Batch application of a dedupe outcome to the record collection
//!
//! Every function here works on a clone and only replaces the caller's
//! arena when all steps succeeded.

use revline_core::{RecordArena, RecordState};

use crate::decision::{choose_survivor, Decision};
use crate::error::DedupeError;
use crate::session::DedupeOutcome;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// `(survivor, retired)` pairs.
    pub merged: Vec<(String, String)>,
    /// Duplicate pairs whose records were already merged.
    pub already_merged: usize,
    pub not_duplicate: usize,
    pub sent_to_preparation: Vec<String>,
    pub added_as_new: Vec<String>,
}

impl ApplySummary {
    pub fn merges_changed(&self) -> bool {
        !self.merged.is_empty() || !self.sent_to_preparation.is_empty()
    }
}

/// Move a record to `target` by a legal step, or by an audited override.
fn operator_move(
    arena: &mut RecordArena,
    id: &str,
    target: RecordState,
    reason: &str,
) -> Result<(), DedupeError> {
    let record = arena.get_mut(id)?;
    if record.status() == target || record.status().can_transition_to(target) {
        record.set_status(target)?;
    } else {
        record.override_status(target, reason);
    }
    Ok(())
}

/// Merge duplicate pairs and send records to manual preparation.
pub fn apply_merges(
    arena: &mut RecordArena,
    outcome: &DedupeOutcome,
    preferred_sources: &[String],
) -> Result<ApplySummary, DedupeError> {
    let mut work = arena.clone();
    let mut summary = ApplySummary::default();

    for decision in &outcome.decisions {
        if decision.decision == Decision::NotDuplicate {
            summary.not_duplicate += 1;
            continue;
        }
        let a = work.resolve(&decision.id1)?.to_string();
        let b = work.resolve(&decision.id2)?.to_string();
        if a == b {
            summary.already_merged += 1;
            continue;
        }
        let (survivor, loser) = {
            let (s, l) = choose_survivor(work.get(&a)?, work.get(&b)?, preferred_sources);
            (s.id().to_string(), l.id().to_string())
        };
        work.merge_into(&survivor, &loser, true)?;

        let record = work.get_mut(&survivor)?;
        if record.status() == RecordState::MdPrepared {
            record.set_status(RecordState::MdProcessed)?;
        }
        summary.merged.push((survivor, loser));
    }

    for id in &outcome.send_to_preparation {
        if work.resolve(id)? != id {
            log::warn!("{id} was merged in this batch, not sending it to preparation");
            continue;
        }
        operator_move(
            &mut work,
            id,
            RecordState::MdNeedsManualPreparation,
            "sent to manual preparation during dedupe",
        )?;
        summary.sent_to_preparation.push(id.clone());
    }

    *arena = work;
    log::info!(
        "merged {} duplicate pairs, {} sent to preparation",
        summary.merged.len(),
        summary.sent_to_preparation.len()
    );
    Ok(summary)
}

/// Add records confirmed as non-duplicates to the curated set.
pub fn apply_additions(
    arena: &mut RecordArena,
    outcome: &DedupeOutcome,
) -> Result<Vec<String>, DedupeError> {
    let mut work = arena.clone();
    let mut added = Vec::new();
    for id in &outcome.add_as_new {
        if work.resolve(id)? != id {
            log::warn!("{id} was merged in this batch, not adding it as new");
            continue;
        }
        if !RecordState::PRE_CURATION.contains(&work.get(id)?.status()) {
            continue;
        }
        operator_move(
            &mut work,
            id,
            RecordState::MdProcessed,
            "added as non-duplicate during dedupe",
        )?;
        added.push(id.clone());
    }
    *arena = work;
    Ok(added)
}

/// Apply a whole outcome atomically: merges, then additions.
pub fn apply(
    arena: &mut RecordArena,
    outcome: &DedupeOutcome,
    preferred_sources: &[String],
) -> Result<ApplySummary, DedupeError> {
    let mut work = arena.clone();
    let mut summary = apply_merges(&mut work, outcome, preferred_sources)?;
    summary.added_as_new = apply_additions(&mut work, outcome)?;
    *arena = work;
    Ok(summary)
}
