//! Operations for model-based testing.
//!
//! Operations are generated randomly by proptest (or decoded from fuzz input
//! via `arbitrary`) and applied to both the model and the real session.

use arbitrary::Arbitrary;

/// Participant index in the model (`p{index}` in the real roster).
pub type ModelId = u8;

/// Operations that can be applied to a session.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// A participant draws. Indices past the roster exercise the unknown
    /// participant path.
    Pick {
        /// Participant drawing.
        picker: ModelId,
    },

    /// Discard all progress.
    Reset,

    /// Query progress. Never changes state.
    Status,
}

/// Predicted result of applying an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded with nothing further to check.
    Ok,

    /// A pick succeeds; the recipient must be one of `candidates`.
    Picked {
        /// Legal recipients, ascending.
        candidates: Vec<ModelId>,
        /// Whether the draw has to override a restriction.
        forced: bool,
    },

    /// Operation fails.
    Error(OperationError),
}

/// Expected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Participant is not in the roster.
    UnknownParticipant,

    /// Participant already drew.
    AlreadyPicked,

    /// No recipient is left.
    Infeasible,

    /// Session is infeasible and needs a reset.
    NotOpen,
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        !self.is_err()
    }

    /// Check if operation failed.
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
