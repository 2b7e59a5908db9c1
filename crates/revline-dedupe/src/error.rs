use revline_core::ReviewError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DedupeError {
    /// Candidate index outside `1..=available`; the same request is asked again.
    #[error("invalid selection {selected}: choose a candidate between 1 and {available}")]
    InvalidSelection { selected: usize, available: usize },

    #[error("dedupe session already finished")]
    SessionFinished,

    #[error(transparent)]
    Review(#[from] ReviewError),
}
