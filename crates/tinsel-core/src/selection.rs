//! Single random pick with restriction relaxation.
//!
//! ## Policy
//!
//! 1. Reject pickers that already drew
//! 2. Draw uniformly from the strict pool (restrictions respected)
//! 3. If the strict pool is empty, draw uniformly from the relaxed pool and
//!    mark the record as forced
//! 4. If both pools are empty, the pick is infeasible
//!
//! State and ledger are only touched once a recipient has been chosen, so a
//! failed pick has no observable effect.
//!
//! ## Known limitation
//!
//! Picks are greedy and sequential. An unlucky order can drain the strict pool
//! early and force a relaxed pick later even though a fully valid assignment
//! existed. There is no backtracking; `was_forced` lets callers tell
//! participants when a restriction was overridden, and
//! [`crate::feasibility`] can be consulted before each pick.

use crate::{
    constraint::eligibility,
    env::Environment,
    error::SessionError,
    ledger::{AssignmentRecord, Ledger, ParticipantRef},
    participant::{ParticipantId, Roster},
    state::AssignmentState,
};

/// Performs one pick against a roster, state and ledger.
#[derive(Debug, Clone)]
pub struct SelectionEngine<E>
where
    E: Environment,
{
    env: E,
}

impl<E> SelectionEngine<E>
where
    E: Environment,
{
    /// Create an engine drawing randomness from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// The engine's environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Draw a recipient for `picker`, then commit it to `state` and `ledger`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownParticipant` if `picker` is not in the
    /// roster, `SessionError::AlreadyPicked` if they already drew and
    /// `SessionError::Infeasible` if no recipient remains.
    pub fn pick(
        &self,
        roster: &Roster,
        state: &mut AssignmentState,
        ledger: &mut Ledger,
        picker: &ParticipantId,
    ) -> Result<AssignmentRecord, SessionError> {
        let picker_index = roster
            .index_of(picker)
            .ok_or_else(|| SessionError::UnknownParticipant { id: picker.clone() })?;

        if state.slot(picker_index).is_some_and(|slot| slot.has_picked) {
            return Err(SessionError::AlreadyPicked { picker: picker.clone() });
        }

        let pools = eligibility(roster, state, picker)?;

        let (pool, was_forced) = if !pools.strict.is_empty() {
            (&pools.strict, false)
        } else if !pools.relaxed.is_empty() {
            (&pools.relaxed, true)
        } else {
            return Err(SessionError::Infeasible { picker: picker.clone() });
        };

        let chosen = &pool[self.env.random_index(pool.len())];

        // Both lookups succeed: the picker was resolved above and pools only
        // hold roster ids.
        let (Some(recipient_index), Some(picker_entry), Some(recipient_entry)) =
            (roster.index_of(chosen), roster.get(picker), roster.get(chosen))
        else {
            return Err(SessionError::UnknownParticipant { id: chosen.clone() });
        };

        state.commit(picker_index, recipient_index, picker);
        let record = AssignmentRecord::new(
            ParticipantRef::from(picker_entry),
            ParticipantRef::from(recipient_entry),
            was_forced,
        );
        ledger.append(record.clone());

        if was_forced {
            tracing::warn!(
                %picker,
                recipient = %chosen,
                "no unrestricted recipient left, restriction overridden"
            );
        } else {
            tracing::debug!(%picker, recipient = %chosen, candidates = pool.len(), "pick committed");
        }

        Ok(record)
    }
}
