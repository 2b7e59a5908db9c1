//! Record status state machine
//!
//! States are declared in pipeline order; the derived `Ord` is the total
//! order used for ranking records (e.g. choosing a merge survivor).
//! Sibling states (alternatives at the same step) share a [`RecordState::level`],
//! and every legal transition goes to an equal or higher level.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReviewError;

/// Processing status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    MdRetrieved,
    MdImported,
    MdNeedsManualPreparation,
    MdPrepared,
    MdProcessed,
    /// Absorbed into another record by a merge.
    MdDuplicatesRemoved,
    RevPrescreenExcluded,
    RevPrescreenIncluded,
    PdfNeedsManualRetrieval,
    PdfImported,
    PdfNotAvailable,
    PdfNeedsManualPreparation,
    PdfPrepared,
    RevExcluded,
    RevIncluded,
    RevSynthesized,
}

impl RecordState {
    pub const ALL: [RecordState; 16] = [
        Self::MdRetrieved,
        Self::MdImported,
        Self::MdNeedsManualPreparation,
        Self::MdPrepared,
        Self::MdProcessed,
        Self::MdDuplicatesRemoved,
        Self::RevPrescreenExcluded,
        Self::RevPrescreenIncluded,
        Self::PdfNeedsManualRetrieval,
        Self::PdfImported,
        Self::PdfNotAvailable,
        Self::PdfNeedsManualPreparation,
        Self::PdfPrepared,
        Self::RevExcluded,
        Self::RevIncluded,
        Self::RevSynthesized,
    ];

    /// States whose records still await metadata curation (the unresolved
    /// side of a dedupe run).
    pub const PRE_CURATION: [RecordState; 3] = [
        Self::MdImported,
        Self::MdNeedsManualPreparation,
        Self::MdPrepared,
    ];

    /// Snake-case name, as persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MdRetrieved => "md_retrieved",
            Self::MdImported => "md_imported",
            Self::MdNeedsManualPreparation => "md_needs_manual_preparation",
            Self::MdPrepared => "md_prepared",
            Self::MdProcessed => "md_processed",
            Self::MdDuplicatesRemoved => "md_duplicates_removed",
            Self::RevPrescreenExcluded => "rev_prescreen_excluded",
            Self::RevPrescreenIncluded => "rev_prescreen_included",
            Self::PdfNeedsManualRetrieval => "pdf_needs_manual_retrieval",
            Self::PdfImported => "pdf_imported",
            Self::PdfNotAvailable => "pdf_not_available",
            Self::PdfNeedsManualPreparation => "pdf_needs_manual_preparation",
            Self::PdfPrepared => "pdf_prepared",
            Self::RevExcluded => "rev_excluded",
            Self::RevIncluded => "rev_included",
            Self::RevSynthesized => "rev_synthesized",
        }
    }

    /// Pipeline step this state belongs to. Alternatives share a level.
    pub fn level(self) -> u8 {
        match self {
            Self::MdRetrieved => 0,
            Self::MdImported => 1,
            Self::MdNeedsManualPreparation | Self::MdPrepared => 2,
            Self::MdProcessed | Self::MdDuplicatesRemoved => 3,
            Self::RevPrescreenExcluded | Self::RevPrescreenIncluded => 4,
            Self::PdfNeedsManualRetrieval | Self::PdfImported | Self::PdfNotAvailable => 5,
            Self::PdfNeedsManualPreparation | Self::PdfPrepared => 6,
            Self::RevExcluded | Self::RevIncluded => 7,
            Self::RevSynthesized => 8,
        }
    }

    /// Legal single-step targets from this state.
    pub fn successors(self) -> &'static [RecordState] {
        use RecordState::*;
        match self {
            MdRetrieved => &[MdImported],
            MdImported => &[MdNeedsManualPreparation, MdPrepared, MdDuplicatesRemoved],
            MdNeedsManualPreparation => &[MdPrepared, MdDuplicatesRemoved],
            MdPrepared => &[MdNeedsManualPreparation, MdProcessed, MdDuplicatesRemoved],
            MdProcessed => &[RevPrescreenExcluded, RevPrescreenIncluded],
            MdDuplicatesRemoved => &[],
            RevPrescreenExcluded => &[RevPrescreenIncluded],
            RevPrescreenIncluded => &[
                RevPrescreenExcluded,
                PdfNeedsManualRetrieval,
                PdfImported,
                PdfNotAvailable,
            ],
            PdfNeedsManualRetrieval => &[PdfImported, PdfNotAvailable],
            PdfNotAvailable => &[PdfImported, RevExcluded, RevIncluded],
            PdfImported => &[PdfNeedsManualPreparation, PdfPrepared],
            PdfNeedsManualPreparation => &[PdfPrepared],
            PdfPrepared => &[PdfNeedsManualPreparation, RevExcluded, RevIncluded],
            RevExcluded => &[RevIncluded],
            RevIncluded => &[RevExcluded, RevSynthesized],
            RevSynthesized => &[],
        }
    }

    pub fn can_transition_to(self, target: RecordState) -> bool {
        self.successors().contains(&target)
    }

    /// No further transitions are possible.
    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    /// The state itself plus every state reachable through strictly
    /// level-increasing transitions, i.e. "at or past stage `state`".
    ///
    /// Lateral moves between siblings are not followed, so
    /// `post_x(rev_prescreen_included)` does not contain
    /// `rev_prescreen_excluded`.
    pub fn get_post_x_states(state: RecordState) -> BTreeSet<RecordState> {
        let mut seen = BTreeSet::from([state]);
        let mut stack = vec![state];
        while let Some(current) = stack.pop() {
            for &next in current.successors() {
                if next.level() > current.level() && seen.insert(next) {
                    stack.push(next);
                }
            }
        }
        seen
    }

    /// Whether this state is at or past `stage`.
    pub fn is_post(self, stage: RecordState) -> bool {
        Self::get_post_x_states(stage).contains(&self)
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordState {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ReviewError::UnknownState(s.to_string()))
    }
}
