use std::time::Duration;

use thiserror::Error;

/// Any failure surfaced by the conversion engine.
///
/// "Nothing left to optimize" and "not equivalent" are ordinary return
/// values, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("syntax error at offset {pos}: {reason}")]
    Syntax { pos: usize, reason: String },
    #[error("invalid automaton: {0}")]
    Validation(String),
    #[error("construction exceeded the configured limit of {limit} states")]
    StateLimit { limit: usize },
    #[error("operation exceeded its {budget:?} time budget")]
    Timeout { budget: Duration },
    #[error("automata are not comparable: {0}")]
    Equivalence(String),
    #[error("cached entry has the wrong kind for this operation")]
    Cache,
}

impl Error {
    #[inline]
    pub(crate) fn syntax(pos: usize, reason: impl Into<String>) -> Self {
        Self::Syntax {
            pos,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
