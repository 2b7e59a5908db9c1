//! Dedupe configuration (`[dedupe]` in settings.toml)

use std::collections::BTreeSet;

use revline_core::RecordState;
use serde::{Deserialize, Serialize};

/// Which records are offered for duplicate resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupeScope {
    /// `md_prepared` only.
    #[default]
    Prepared,
    /// Everything not yet at or past `md_processed` (the force mode).
    NotProcessed,
    /// An explicit list of states.
    Custom(Vec<RecordState>),
}

impl DedupeScope {
    pub fn states(&self) -> BTreeSet<RecordState> {
        match self {
            Self::Prepared => BTreeSet::from([RecordState::MdPrepared]),
            Self::NotProcessed => {
                let processed = RecordState::get_post_x_states(RecordState::MdProcessed);
                RecordState::ALL
                    .into_iter()
                    .filter(|s| !processed.contains(s) && *s != RecordState::MdDuplicatesRemoved)
                    .collect()
            }
            Self::Custom(states) => states.iter().copied().collect(),
        }
    }

    pub fn contains(&self, state: RecordState) -> bool {
        self.states().contains(&state)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupeSettings {
    pub scope: DedupeScope,
    /// Candidates shown per record.
    pub max_candidates: usize,
    /// Candidates above this similarity are highlighted.
    pub highlight_threshold: f64,
    /// Search source file names, most trusted first. Breaks survivor ties.
    pub preferred_sources: Vec<String>,
}

impl Default for DedupeSettings {
    fn default() -> Self {
        Self {
            scope: DedupeScope::Prepared,
            max_candidates: 20,
            highlight_threshold: 0.8,
            preferred_sources: Vec::new(),
        }
    }
}
