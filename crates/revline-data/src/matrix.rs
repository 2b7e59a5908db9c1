//! Synthesized record status matrix

use std::collections::BTreeMap;

use revline_core::{RecordArena, RecordState};
use serde::Serialize;

/// Records that take part in synthesis.
pub const ELIGIBLE_STATES: [RecordState; 2] = [RecordState::RevIncluded, RecordState::RevSynthesized];

/// IDs of active records eligible for synthesis, in ID order.
pub fn eligible_ids(arena: &RecordArena) -> Vec<String> {
    arena.ids_in(&ELIGIBLE_STATES)
}

/// Per record, per endpoint: has the endpoint finished synthesizing it?
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisMatrix {
    rows: BTreeMap<String, BTreeMap<String, bool>>,
}

impl SynthesisMatrix {
    /// Every cell starts `false`.
    pub fn new<'a>(ids: &[String], endpoint_ids: impl IntoIterator<Item = &'a str> + Clone) -> Self {
        let rows = ids
            .iter()
            .map(|id| {
                let row = endpoint_ids
                    .clone()
                    .into_iter()
                    .map(|e| (e.to_string(), false))
                    .collect();
                (id.clone(), row)
            })
            .collect();
        Self { rows }
    }

    pub fn record_ids(&self) -> Vec<String> {
        self.rows.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mark `id` as done for `endpoint_id`. Returns false when the cell
    /// does not exist.
    pub fn mark(&mut self, id: &str, endpoint_id: &str) -> bool {
        match self.rows.get_mut(id).and_then(|row| row.get_mut(endpoint_id)) {
            Some(cell) => {
                *cell = true;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str, endpoint_id: &str) -> Option<bool> {
        self.rows.get(id)?.get(endpoint_id).copied()
    }

    /// All endpoints report the record as done. Without endpoints nothing
    /// counts as synthesized.
    pub fn is_synthesized(&self, id: &str) -> bool {
        self.rows
            .get(id)
            .is_some_and(|row| !row.is_empty() && row.values().all(|&done| done))
    }

    pub fn synthesized_ids(&self) -> Vec<String> {
        self.rows
            .keys()
            .filter(|id| self.is_synthesized(id))
            .cloned()
            .collect()
    }

    /// Endpoints that have not finished `id` yet.
    pub fn pending_endpoints(&self, id: &str) -> Vec<&str> {
        self.rows
            .get(id)
            .map(|row| {
                row.iter()
                    .filter(|(_, &done)| !done)
                    .map(|(endpoint, _)| endpoint.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, bool>)> {
        self.rows.iter().map(|(id, row)| (id.as_str(), row))
    }
}
