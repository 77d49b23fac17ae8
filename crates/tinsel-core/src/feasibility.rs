//! Pre-flight check for a fully restriction-respecting assignment.
//!
//! Builds the bipartite graph "picker may draw recipient" over the strict
//! rules (no self-draw, no forbidden pair) and finds a maximum matching with
//! augmenting paths. If every remaining picker is matched, the exchange can
//! still finish without overriding a restriction.
//!
//! The check is advisory. The incremental session never consults it and keeps
//! its own greedy, step-by-step contract.

use crate::{
    participant::{ParticipantId, Roster},
    state::AssignmentState,
};

/// Outcome of a feasibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feasibility {
    /// A complete strict assignment exists. `witness` is one such assignment
    /// as `(picker, recipient)` pairs in roster order of pickers.
    Feasible {
        /// Example assignment.
        witness: Vec<(ParticipantId, ParticipantId)>,
    },
    /// Some pickers cannot be served without overriding a restriction.
    Infeasible {
        /// Pickers left unmatched by a maximum matching.
        stranded: Vec<ParticipantId>,
    },
}

impl Feasibility {
    /// Whether a strict completion exists.
    pub fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible { .. })
    }
}

/// Check a fresh exchange over `roster`.
pub fn check(roster: &Roster) -> Feasibility {
    check_from(roster, &AssignmentState::new(roster))
}

/// Check whether the pickers that have not drawn yet can all be served from
/// the recipients not yet drawn.
pub fn check_from(roster: &Roster, state: &AssignmentState) -> Feasibility {
    let participants = roster.participants();
    let is_picker = |i: usize| state.slot(i).is_some_and(|s| !s.has_picked);
    let is_open_recipient = |i: usize| state.slot(i).is_some_and(|s| !s.has_been_picked());

    // adjacency[p] = recipients picker p may draw under strict rules
    let adjacency: Vec<Vec<usize>> = (0..participants.len())
        .map(|p| {
            if !is_picker(p) {
                return Vec::new();
            }
            (0..participants.len())
                .filter(|&r| {
                    r != p
                        && is_open_recipient(r)
                        && !participants[p].forbids(&participants[r].id)
                })
                .collect()
        })
        .collect();

    // matched_to[r] = picker currently holding recipient r
    let mut matched_to: Vec<Option<usize>> = vec![None; participants.len()];
    let mut stranded = Vec::new();

    for picker in (0..participants.len()).filter(|&p| is_picker(p)) {
        let mut visited = vec![false; participants.len()];
        if !augment(picker, &adjacency, &mut matched_to, &mut visited) {
            stranded.push(participants[picker].id.clone());
        }
    }

    if !stranded.is_empty() {
        tracing::debug!(stranded = stranded.len(), "no strict completion");
        return Feasibility::Infeasible { stranded };
    }

    let mut witness: Vec<(usize, usize)> = matched_to
        .iter()
        .enumerate()
        .filter_map(|(recipient, picker)| picker.map(|p| (p, recipient)))
        .collect();
    witness.sort_unstable();

    Feasibility::Feasible {
        witness: witness
            .into_iter()
            .map(|(p, r)| (participants[p].id.clone(), participants[r].id.clone()))
            .collect(),
    }
}

/// Try to find an augmenting path starting at `picker`.
fn augment(
    picker: usize,
    adjacency: &[Vec<usize>],
    matched_to: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &recipient in &adjacency[picker] {
        if visited[recipient] {
            continue;
        }
        visited[recipient] = true;

        let free = match matched_to[recipient] {
            None => true,
            Some(holder) => augment(holder, adjacency, matched_to, visited),
        };
        if free {
            matched_to[recipient] = Some(picker);
            return true;
        }
    }
    false
}
