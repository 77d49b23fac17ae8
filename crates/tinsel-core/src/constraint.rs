//! Eligible recipients for a picker.
//!
//! Computes both candidate pools in one pass so the selection engine can decide
//! whether relaxation is needed without recomputing anything.

use crate::{
    error::SessionError,
    participant::{ParticipantId, Roster},
    state::AssignmentState,
};

/// Candidate recipients for one picker, in roster order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibilitySet {
    /// Unclaimed, not the picker, not forbidden by the picker.
    pub strict: Vec<ParticipantId>,
    /// Unclaimed, not the picker. Always a superset of `strict`.
    pub relaxed: Vec<ParticipantId>,
}

impl EligibilitySet {
    /// Whether no recipient remains at all.
    pub fn is_exhausted(&self) -> bool {
        self.relaxed.is_empty()
    }
}

/// Compute the eligible recipients for `picker`.
///
/// Pure with respect to its inputs: the same roster, state and picker always
/// give the same sets in the same order.
///
/// # Errors
///
/// Returns `SessionError::UnknownParticipant` if `picker` is not in the roster.
pub fn eligibility(
    roster: &Roster,
    state: &AssignmentState,
    picker: &ParticipantId,
) -> Result<EligibilitySet, SessionError> {
    let picker_entry =
        roster.get(picker).ok_or_else(|| SessionError::UnknownParticipant { id: picker.clone() })?;

    let mut set = EligibilitySet::default();
    for (index, candidate) in roster.participants().iter().enumerate() {
        if &candidate.id == picker {
            continue;
        }
        if state.slot(index).is_some_and(|slot| slot.has_been_picked()) {
            continue;
        }

        set.relaxed.push(candidate.id.clone());
        if !picker_entry.forbids(&candidate.id) {
            set.strict.push(candidate.id.clone());
        }
    }

    Ok(set)
}
