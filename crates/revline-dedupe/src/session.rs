//! Decision protocol: one request per planned record, resumed on a typed response
//!
//! The session never reads input itself. A caller (terminal prompt or a
//! scripted harness) takes the current [`DecisionRequest`], answers with a
//! [`DecisionResponse`], and the session advances. Invalid candidate
//! selections leave the position unchanged so the same request is asked again.

use std::collections::VecDeque;

use revline_core::{is_interrupted, RecordArena, RecordState, ReviewError};

use crate::decision::MergeDecision;
use crate::error::DedupeError;
use crate::plan::DedupePlan;

/// Display data for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    pub id: String,
    pub status: RecordState,
    pub citation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateView {
    /// 1-based index used in responses.
    pub index: usize,
    pub record: RecordSummary,
    pub similarity: f64,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRequest {
    /// 1-based position among the planned records.
    pub position: usize,
    pub total: usize,
    pub record: RecordSummary,
    pub candidates: Vec<CandidateView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionResponse {
    /// Duplicate of candidate `k` (1-based).
    Duplicate(usize),
    Skip,
    /// Not a duplicate of any candidate; add as a new curated record.
    AddAsNew,
    /// Metadata needs fixing before a decision is possible.
    SendToPreparation,
    Quit,
}

/// Everything decided in a session, applied later in one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupeOutcome {
    pub decisions: Vec<MergeDecision>,
    pub add_as_new: Vec<String>,
    pub send_to_preparation: Vec<String>,
    pub skipped: Vec<String>,
    /// The session was ended before every record was decided.
    pub quit: bool,
}

impl DedupeOutcome {
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
            && self.add_as_new.is_empty()
            && self.send_to_preparation.is_empty()
    }
}

pub struct DedupeSession {
    requests: Vec<DecisionRequest>,
    position: usize,
    outcome: DedupeOutcome,
}

fn summary(arena: &RecordArena, id: &str) -> Result<RecordSummary, ReviewError> {
    let record = arena.get(id)?;
    Ok(RecordSummary {
        id: id.to_string(),
        status: record.status(),
        citation: record.citation(),
    })
}

impl DedupeSession {
    /// Fails when the plan names a record that `arena` does not hold.
    pub fn new(arena: &RecordArena, plan: &DedupePlan) -> Result<Self, DedupeError> {
        let total = plan.items.len();
        let requests = plan
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let candidates = item
                    .candidates
                    .iter()
                    .enumerate()
                    .map(|(k, c)| {
                        Ok(CandidateView {
                            index: k + 1,
                            record: summary(arena, &c.id)?,
                            similarity: c.similarity,
                            highlighted: c.highlighted,
                        })
                    })
                    .collect::<Result<Vec<_>, ReviewError>>()?;
                Ok(DecisionRequest {
                    position: i + 1,
                    total,
                    record: summary(arena, &item.record_id)?,
                    candidates,
                })
            })
            .collect::<Result<Vec<_>, ReviewError>>()?;
        Ok(Self {
            requests,
            position: 0,
            outcome: DedupeOutcome::default(),
        })
    }

    /// The request awaiting a response, or `None` when finished.
    pub fn current(&self) -> Option<&DecisionRequest> {
        if self.outcome.quit {
            return None;
        }
        self.requests.get(self.position)
    }

    pub fn is_finished(&self) -> bool {
        self.current().is_none()
    }

    pub fn respond(&mut self, response: DecisionResponse) -> Result<(), DedupeError> {
        let request = self.current().ok_or(DedupeError::SessionFinished)?;
        let record_id = request.record.id.clone();

        match response {
            DecisionResponse::Duplicate(k) => {
                let available = request.candidates.len();
                let Some(candidate) = k.checked_sub(1).and_then(|i| request.candidates.get(i))
                else {
                    return Err(DedupeError::InvalidSelection {
                        selected: k,
                        available,
                    });
                };
                // Higher status first: that side is expected to survive
                let decision = if request.record.status < candidate.record.status {
                    MergeDecision::duplicate(&candidate.record.id, &record_id)
                } else {
                    MergeDecision::duplicate(&record_id, &candidate.record.id)
                };
                self.outcome.decisions.push(decision);
            }
            DecisionResponse::Skip => self.outcome.skipped.push(record_id),
            DecisionResponse::AddAsNew => {
                let rejected: Vec<MergeDecision> = request
                    .candidates
                    .iter()
                    .map(|c| MergeDecision::not_duplicate(&c.record.id, &record_id))
                    .collect();
                self.outcome.decisions.extend(rejected);
                self.outcome.add_as_new.push(record_id);
            }
            DecisionResponse::SendToPreparation => {
                self.outcome.send_to_preparation.push(record_id)
            }
            DecisionResponse::Quit => {
                self.outcome.quit = true;
                return Ok(());
            }
        }
        self.position += 1;
        Ok(())
    }

    pub fn outcome(&self) -> &DedupeOutcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> DedupeOutcome {
        self.outcome
    }
}

/// Something that answers decision requests.
pub trait Prompter {
    fn decide(&mut self, request: &DecisionRequest) -> DecisionResponse;

    /// Called when a response was rejected; the same request follows.
    fn rejected(&mut self, _error: &DedupeError) {}
}

/// Answers from a fixed list, then quits.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    responses: VecDeque<DecisionResponse>,
    pub rejections: usize,
}

impl ScriptedPrompter {
    pub fn new(responses: impl IntoIterator<Item = DecisionResponse>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            rejections: 0,
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn decide(&mut self, _request: &DecisionRequest) -> DecisionResponse {
        self.responses.pop_front().unwrap_or(DecisionResponse::Quit)
    }

    fn rejected(&mut self, _error: &DedupeError) {
        self.rejections += 1;
    }
}

/// Drive a session to completion. An interrupt counts as quit.
pub fn run_session(mut session: DedupeSession, prompter: &mut dyn Prompter) -> DedupeOutcome {
    while let Some(request) = session.current() {
        let response = if is_interrupted() {
            DecisionResponse::Quit
        } else {
            prompter.decide(request)
        };
        match session.respond(response) {
            Ok(()) => {}
            Err(err @ DedupeError::InvalidSelection { .. }) => prompter.rejected(&err),
            Err(err) => {
                log::warn!("dedupe session stopped: {err}");
                break;
            }
        }
    }
    session.into_outcome()
}
