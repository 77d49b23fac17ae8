//! Assignment session state machine.
//!
//! ## States
//!
//! ```text
//!            pick (not last)
//!              ┌──────┐
//!              ▼      │
//! open() ──► Open ────┴──► Completed      (every participant has picked)
//!              │
//!              └─────────► Infeasible     (a pick found no recipient)
//!
//! reset() from any state ──► Open (fresh)
//! ```
//!
//! There is no transition out of `Completed` or `Infeasible` other than
//! `reset()`.
//!
//! ## Ownership
//!
//! The session owns its [`Roster`] snapshot, its [`AssignmentState`] and its
//! [`Ledger`]. Nothing outside the session can mutate any of them. Concurrent
//! callers share a session through [`SharedSession`], which serializes every
//! operation behind one lock.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    constraint::{EligibilitySet, eligibility},
    env::Environment,
    error::SessionError,
    feasibility::{self, Feasibility},
    ledger::{AssignmentRecord, InterchangeDocument, Ledger},
    participant::{ParticipantId, Roster},
    selection::SelectionEngine,
    state::AssignmentState,
};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Picks are accepted.
    Open,
    /// Every participant has picked.
    Completed,
    /// A pick found no recipient; only `reset()` is accepted.
    Infeasible,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Completed => "completed",
            Self::Infeasible => "infeasible",
        };
        f.write_str(name)
    }
}

/// Progress report for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Current state.
    pub status: SessionStatus,
    /// Participants that have picked.
    pub picked: usize,
    /// Participants still to pick.
    pub remaining: usize,
    /// Picks that overrode a restriction.
    pub forced: usize,
}

/// One exchange run over a frozen roster.
#[derive(Debug, Clone)]
pub struct AssignmentSession<E>
where
    E: Environment,
{
    roster: Roster,
    state: AssignmentState,
    ledger: Ledger,
    engine: SelectionEngine<E>,
    status: SessionStatus,
}

impl<E> AssignmentSession<E>
where
    E: Environment,
{
    /// Open a session over `roster`.
    ///
    /// An empty roster has nothing to do and opens as `Completed`.
    pub fn open(roster: Roster, env: E) -> Self {
        let state = AssignmentState::new(&roster);
        let status = initial_status(&roster);
        tracing::debug!(participants = roster.len(), %status, "session opened");

        Self { roster, state, ledger: Ledger::new(), engine: SelectionEngine::new(env), status }
    }

    /// Draw a recipient for `picker`.
    ///
    /// Either succeeds with exactly one ledger append and one state update, or
    /// fails with no observable change (apart from the `Open -> Infeasible`
    /// transition on `SessionError::Infeasible`).
    ///
    /// # Errors
    ///
    /// - `SessionError::UnknownParticipant`: `picker` is not in the roster
    /// - `SessionError::AlreadyPicked`: `picker` already drew
    /// - `SessionError::NotOpen`: the session is `Infeasible`
    /// - `SessionError::Infeasible`: no recipient remains for `picker`
    pub fn pick(&mut self, picker: &ParticipantId) -> Result<AssignmentRecord, SessionError> {
        let slot = self
            .state
            .slot_of(&self.roster, picker)
            .ok_or_else(|| SessionError::UnknownParticipant { id: picker.clone() })?;

        if slot.has_picked {
            return Err(SessionError::AlreadyPicked { picker: picker.clone() });
        }

        if self.status != SessionStatus::Open {
            return Err(SessionError::NotOpen { status: self.status });
        }

        match self.engine.pick(&self.roster, &mut self.state, &mut self.ledger, picker) {
            Ok(record) => {
                if self.state.all_picked() {
                    self.status = SessionStatus::Completed;
                    tracing::info!(
                        picks = self.ledger.len(),
                        forced = self.ledger.forced_count(),
                        "exchange completed"
                    );
                }
                Ok(record)
            },
            Err(err) => {
                if matches!(err, SessionError::Infeasible { .. }) {
                    self.status = SessionStatus::Infeasible;
                    tracing::info!(%picker, picked = self.state.picked_count(), "session infeasible");
                }
                Err(err)
            },
        }
    }

    /// Discard all progress and return to a fresh `Open` session.
    ///
    /// Idempotent.
    pub fn reset(&mut self) {
        self.state.clear();
        self.ledger.clear();
        self.status = initial_status(&self.roster);
        tracing::info!("session reset");
    }

    /// Whether every participant has picked.
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Current state and counts.
    pub fn status(&self) -> Progress {
        let picked = self.state.picked_count();
        Progress {
            status: self.status,
            picked,
            remaining: self.roster.len() - picked,
            forced: self.ledger.forced_count(),
        }
    }

    /// Participants that have not yet picked, in roster order.
    pub fn remaining_pickers(&self) -> Vec<ParticipantId> {
        self.roster
            .participants()
            .iter()
            .enumerate()
            .filter(|(i, _)| self.state.slot(*i).is_some_and(|s| !s.has_picked))
            .map(|(_, p)| p.id.clone())
            .collect()
    }

    /// Candidate pools `picker` would draw from right now.
    pub fn eligibility(&self, picker: &ParticipantId) -> Result<EligibilitySet, SessionError> {
        eligibility(&self.roster, &self.state, picker)
    }

    /// Whether the remaining pickers can still all be served without
    /// overriding a restriction. Advisory only.
    pub fn preflight(&self) -> Feasibility {
        feasibility::check_from(&self.roster, &self.state)
    }

    /// The frozen roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Read-only view of assignment progress.
    pub fn state(&self) -> &AssignmentState {
        &self.state
    }

    /// Picks so far, in pick order.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The session's environment.
    pub fn env(&self) -> &E {
        self.engine.env()
    }

    /// Interchange document stamped with the environment's clock.
    pub fn to_interchange(&self, event: &str) -> InterchangeDocument {
        self.ledger.to_interchange(event, self.now())
    }

    /// Numbered plain-text list of picks.
    pub fn to_plain_text(&self, event: &str) -> String {
        self.ledger.to_plain_text(event)
    }

    /// One line per pick.
    pub fn to_simple_summary(&self) -> String {
        self.ledger.to_simple_summary()
    }

    fn now(&self) -> DateTime<Utc> {
        self.engine.env().now()
    }
}

fn initial_status(roster: &Roster) -> SessionStatus {
    if roster.is_empty() { SessionStatus::Completed } else { SessionStatus::Open }
}

/// A session shared between concurrent callers.
///
/// Every call takes the same lock, so eligibility, the random draw and the
/// commit of one pick can never interleave with another pick. Two pickers can
/// therefore never claim the same recipient.
#[derive(Debug)]
pub struct SharedSession<E>
where
    E: Environment,
{
    inner: Arc<Mutex<AssignmentSession<E>>>,
}

impl<E> Clone for SharedSession<E>
where
    E: Environment,
{
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E> SharedSession<E>
where
    E: Environment,
{
    /// Wrap a session for shared use.
    pub fn new(session: AssignmentSession<E>) -> Self {
        Self { inner: Arc::new(Mutex::new(session)) }
    }

    /// Serialized [`AssignmentSession::pick`].
    pub fn pick(&self, picker: &ParticipantId) -> Result<AssignmentRecord, SessionError> {
        self.lock().pick(picker)
    }

    /// Serialized [`AssignmentSession::reset`].
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Serialized [`AssignmentSession::status`].
    pub fn status(&self) -> Progress {
        self.lock().status()
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut AssignmentSession<E>) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, AssignmentSession<E>> {
        // A pick mutates nothing until it has fully succeeded, so a panic
        // while holding the lock cannot leave a half-applied pick behind.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::participant::{Participant, ParticipantRegistry};

    /// Counter-based environment; good enough for state machine tests.
    #[derive(Clone, Default)]
    struct CountingEnv(Arc<AtomicU64>);

    impl Environment for CountingEnv {
        fn now(&self) -> DateTime<Utc> {
            DateTime::<Utc>::default()
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let n = self.0.fetch_add(0x9e37_79b9_7f4a_7c15, Ordering::SeqCst);
            for (i, b) in buffer.iter_mut().enumerate() {
                *b = n.to_be_bytes()[i % 8];
            }
        }
    }

    fn id(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    fn open(participants: Vec<Participant>) -> AssignmentSession<CountingEnv> {
        let registry = ParticipantRegistry::build(participants).unwrap();
        AssignmentSession::open(registry.snapshot(), CountingEnv::default())
    }

    fn trio() -> AssignmentSession<CountingEnv> {
        open(vec![Participant::new("a", "A"), Participant::new("b", "B"), Participant::new("c", "C")])
    }

    #[test]
    fn new_session_is_open() {
        let session = trio();
        assert_eq!(
            session.status(),
            Progress { status: SessionStatus::Open, picked: 0, remaining: 3, forced: 0 }
        );
        assert!(!session.is_complete());
        assert_eq!(session.remaining_pickers(), vec![id("a"), id("b"), id("c")]);
    }

    #[test]
    fn empty_roster_opens_completed() {
        let session = open(Vec::new());
        assert!(session.is_complete());
        assert_eq!(session.status().remaining, 0);
    }

    #[test]
    fn single_participant_is_infeasible() {
        let mut session = open(vec![Participant::new("solo", "Solo")]);

        let result = session.pick(&id("solo"));
        assert_eq!(result, Err(SessionError::Infeasible { picker: id("solo") }));
        assert_eq!(session.status().status, SessionStatus::Infeasible);
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn two_participants_always_complete() {
        let mut session = open(vec![Participant::new("a", "A"), Participant::new("b", "B")]);

        let first = session.pick(&id("a")).unwrap();
        assert_eq!(first.recipient().id, id("b"));
        assert_eq!(session.status().status, SessionStatus::Open);

        let second = session.pick(&id("b")).unwrap();
        assert_eq!(second.recipient().id, id("a"));
        assert!(session.is_complete());
        assert_eq!(
            session.status(),
            Progress { status: SessionStatus::Completed, picked: 2, remaining: 0, forced: 0 }
        );
    }

    #[test]
    fn completed_session_rejects_further_picks_as_already_picked() {
        let mut session = open(vec![Participant::new("a", "A"), Participant::new("b", "B")]);
        session.pick(&id("a")).unwrap();
        session.pick(&id("b")).unwrap();

        assert_eq!(session.pick(&id("a")), Err(SessionError::AlreadyPicked { picker: id("a") }));
        assert!(session.is_complete());
    }

    #[test]
    fn infeasible_session_only_accepts_reset() {
        // a -> b and b -> a leave nothing for c
        let mut session = open(vec![
            Participant::new("a", "A").forbid("c"),
            Participant::new("b", "B").forbid("c"),
            Participant::new("c", "C"),
        ]);
        session.pick(&id("a")).unwrap();
        session.pick(&id("b")).unwrap();

        assert_eq!(session.pick(&id("c")), Err(SessionError::Infeasible { picker: id("c") }));
        assert_eq!(session.status().status, SessionStatus::Infeasible);
        // Prior progress is kept for display
        assert_eq!(session.ledger().len(), 2);

        let err = session.pick(&id("c")).unwrap_err();
        assert_eq!(err, SessionError::NotOpen { status: SessionStatus::Infeasible });
        assert!(err.is_terminal());

        session.reset();
        assert_eq!(session.status().status, SessionStatus::Open);
        assert!(session.ledger().is_empty());
        assert_eq!(session.remaining_pickers().len(), 3);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut session = trio();
        session.pick(&id("a")).unwrap();

        session.reset();
        let once = (session.status(), session.state().clone(), session.ledger().clone());
        session.reset();
        let twice = (session.status(), session.state().clone(), session.ledger().clone());

        assert_eq!(once, twice);
        assert_eq!(once.0.picked, 0);
    }

    #[test]
    fn unknown_picker_leaves_state_untouched() {
        let mut session = trio();
        let before = session.status();

        assert_eq!(session.pick(&id("zed")), Err(SessionError::UnknownParticipant { id: id("zed") }));
        assert_eq!(session.status(), before);
    }

    #[test]
    fn roster_edits_after_open_do_not_reach_session() {
        let mut registry = ParticipantRegistry::build([
            Participant::new("a", "A"),
            Participant::new("b", "B"),
        ])
        .unwrap();
        let mut session = AssignmentSession::open(registry.snapshot(), CountingEnv::default());

        registry.add(Participant::new("c", "C")).unwrap();
        registry.set_restriction(&id("a"), &id("b"), true).unwrap();

        assert_eq!(session.pick(&id("c")), Err(SessionError::UnknownParticipant { id: id("c") }));
        let record = session.pick(&id("a")).unwrap();
        assert!(!record.was_forced());
    }

    #[test]
    fn exports_follow_ledger() {
        let mut session = open(vec![Participant::new("a", "Ann"), Participant::new("b", "Bob")]);
        session.pick(&id("a")).unwrap();
        session.pick(&id("b")).unwrap();

        assert_eq!(session.to_simple_summary(), "Ann got Bob\nBob got Ann");
        assert_eq!(session.to_plain_text("Party"), "Party\n1. Ann → Bob\n2. Bob → Ann");

        let document = session.to_interchange("Party");
        assert_eq!(Ledger::from_interchange(&document).unwrap(), *session.ledger());
    }

    #[test]
    fn shared_session_serializes_picks() {
        let shared = SharedSession::new(trio());
        let other = shared.clone();

        shared.pick(&id("a")).unwrap();
        assert_eq!(other.status().picked, 1);
        assert_eq!(other.pick(&id("a")), Err(SessionError::AlreadyPicked { picker: id("a") }));

        other.reset();
        assert_eq!(shared.with(|s| s.ledger().len()), 0);
    }
}
