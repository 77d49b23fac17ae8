//! Registry and session error types.

use thiserror::Error;

use crate::{participant::ParticipantId, session::SessionStatus};

/// Errors from roster mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A participant with this id is already registered.
    #[error("duplicate participant id: {id}")]
    DuplicateId {
        /// The id that is already taken.
        id: ParticipantId,
    },

    /// A participant was asked to forbid themselves.
    #[error("participant {id} cannot restrict themselves")]
    SelfRestriction {
        /// The offending participant.
        id: ParticipantId,
    },

    /// A referenced participant is not registered.
    #[error("unknown participant: {id}")]
    UnknownParticipant {
        /// The id that was not found.
        id: ParticipantId,
    },
}

/// Errors from session operations.
///
/// Every error leaves the session exactly as it was, except `Infeasible`,
/// which moves the session into [`SessionStatus::Infeasible`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The picker is not part of the session's roster.
    #[error("unknown participant: {id}")]
    UnknownParticipant {
        /// The id that was not found.
        id: ParticipantId,
    },

    /// The picker already drew a recipient in this session.
    #[error("{picker} has already picked")]
    AlreadyPicked {
        /// The participant that tried to pick twice.
        picker: ParticipantId,
    },

    /// No recipient remains for the picker, even ignoring restrictions.
    #[error("no recipient left for {picker}")]
    Infeasible {
        /// The participant left without a candidate.
        picker: ParticipantId,
    },

    /// The session no longer accepts picks until it is reset.
    #[error("session is {status}, reset required")]
    NotOpen {
        /// Current session state.
        status: SessionStatus,
    },
}

impl SessionError {
    /// Returns true if this error ended the session.
    ///
    /// Terminal errors require a `reset()` before any further pick. All other
    /// errors are local to the call that raised them.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Infeasible { .. } | Self::NotOpen { .. } => true,

            Self::UnknownParticipant { .. } | Self::AlreadyPicked { .. } => false,
        }
    }
}
