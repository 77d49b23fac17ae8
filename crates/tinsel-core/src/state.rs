//! Per-participant assignment progress.
//!
//! # Invariants
//!
//! - `has_picked` and `picked_by` only ever move from unset to set; the only
//!   way back is [`AssignmentState::clear`], used by a session reset
//! - A participant is claimed by at most one picker

use crate::participant::{ParticipantId, Roster};

/// Progress of a single participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotState {
    /// Whether this participant has drawn a recipient.
    pub has_picked: bool,
    /// Who drew this participant, if anyone.
    pub picked_by: Option<ParticipantId>,
}

impl SlotState {
    /// Whether this participant has been drawn.
    pub fn has_been_picked(&self) -> bool {
        self.picked_by.is_some()
    }
}

/// Progress of every participant, aligned with the session's [`Roster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentState {
    slots: Vec<SlotState>,
}

impl AssignmentState {
    /// Fresh state with nobody picked.
    pub fn new(roster: &Roster) -> Self {
        Self { slots: vec![SlotState::default(); roster.len()] }
    }

    /// Slot at roster position `index`.
    pub fn slot(&self, index: usize) -> Option<&SlotState> {
        self.slots.get(index)
    }

    /// Slot for `id`, resolved through the roster.
    pub fn slot_of(&self, roster: &Roster, id: &ParticipantId) -> Option<&SlotState> {
        roster.index_of(id).and_then(|i| self.slots.get(i))
    }

    /// Number of participants that have drawn.
    pub fn picked_count(&self) -> usize {
        self.slots.iter().filter(|s| s.has_picked).count()
    }

    /// Number of participants that have been drawn.
    pub fn claimed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.has_been_picked()).count()
    }

    /// Whether every participant has drawn.
    pub fn all_picked(&self) -> bool {
        self.slots.iter().all(|s| s.has_picked)
    }

    /// Record that `picker` drew `recipient`.
    ///
    /// Both indices must be valid and the slots must still be unset. Callers
    /// check this before committing.
    pub(crate) fn commit(&mut self, picker: usize, recipient: usize, picker_id: &ParticipantId) {
        debug_assert!(!self.slots[picker].has_picked, "picker committed twice");
        debug_assert!(!self.slots[recipient].has_been_picked(), "recipient claimed twice");

        self.slots[picker].has_picked = true;
        self.slots[recipient].picked_by = Some(picker_id.clone());
    }

    /// Forget all progress.
    pub(crate) fn clear(&mut self) {
        self.slots.fill(SlotState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::{Participant, ParticipantRegistry};

    fn roster() -> Roster {
        ParticipantRegistry::build([Participant::new("ann", "Ann"), Participant::new("bob", "Bob")])
            .unwrap()
            .snapshot()
    }

    #[test]
    fn commit_sets_both_sides() {
        let roster = roster();
        let mut state = AssignmentState::new(&roster);

        state.commit(0, 1, &"ann".into());

        let ann = state.slot_of(&roster, &"ann".into()).unwrap();
        let bob = state.slot_of(&roster, &"bob".into()).unwrap();
        assert!(ann.has_picked);
        assert!(!ann.has_been_picked());
        assert!(!bob.has_picked);
        assert_eq!(bob.picked_by, Some("ann".into()));
        assert_eq!(state.picked_count(), 1);
        assert_eq!(state.claimed_count(), 1);
    }

    #[test]
    fn clear_resets_every_slot() {
        let roster = roster();
        let mut state = AssignmentState::new(&roster);
        state.commit(0, 1, &"ann".into());
        state.commit(1, 0, &"bob".into());
        assert!(state.all_picked());

        state.clear();
        assert_eq!(state, AssignmentState::new(&roster));
    }
}
