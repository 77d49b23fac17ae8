//! Fuzz target for [`AssignmentSession`] pick sequences
//!
//! # Strategy
//!
//! - Roster shapes: 0 to 15 participants with arbitrary restriction edges
//! - Operation sequences: picks (including unknown ids), resets, status
//!   probes
//! - Seeds: arbitrary RNG seed for the simulated environment
//!
//! # Invariants
//!
//! - NEVER panic on any operation sequence
//! - Nobody draws themselves
//! - No recipient is claimed twice
//! - A pick succeeds at most once per participant between resets
//! - `Completed` implies every participant picked
//! - Once `Infeasible`, only a reset reopens the session

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tinsel_core::{AssignmentSession, ParticipantId, ParticipantRegistry, SessionStatus};
use tinsel_harness::{ModelWorld, Operation, SimEnv};

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    seed: u64,
    size: u8,
    restrictions: Vec<(u8, u8)>,
    ops: Vec<Operation>,
}

fuzz_target!(|input: FuzzInput| {
    let size = input.size % 16;
    let model = ModelWorld::new(size, &input.restrictions);
    let Ok(registry) = ParticipantRegistry::build(model.participants()) else {
        panic!("model roster rejected");
    };
    let mut session = AssignmentSession::open(registry.snapshot(), SimEnv::with_seed(input.seed));

    let mut pickers = HashSet::new();
    let mut recipients = HashSet::new();

    for op in &input.ops {
        let before = session.status().status;

        match op {
            Operation::Pick { picker } => {
                let id = ParticipantId::new(format!("p{picker}"));
                if let Ok(record) = session.pick(&id) {
                    assert_ne!(record.picker().id, record.recipient().id, "self-assignment");
                    assert!(pickers.insert(record.picker().id.clone()), "picked twice");
                    assert!(recipients.insert(record.recipient().id.clone()), "claimed twice");
                }
                if before == SessionStatus::Infeasible {
                    assert_eq!(session.status().status, SessionStatus::Infeasible);
                }
            },
            Operation::Reset => {
                session.reset();
                pickers.clear();
                recipients.clear();
            },
            Operation::Status => {},
        }

        let progress = session.status();
        if progress.status == SessionStatus::Completed {
            assert_eq!(progress.picked, usize::from(size));
        }
        assert_eq!(progress.picked, session.ledger().len());
    }
});
