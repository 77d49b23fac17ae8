//! Model world: the reference session.

use tinsel_core::Participant;

use super::operation::{ModelId, Operation, OperationError, OperationResult};

/// Session state in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    /// Picks accepted.
    Open,
    /// Everyone drew.
    Completed,
    /// A pick found nobody.
    Infeasible,
}

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Per participant: has drawn.
    pub picked: Vec<bool>,
    /// Per participant: who drew them.
    pub claimed_by: Vec<Option<ModelId>>,
    /// Session state.
    pub status: ModelStatus,
    /// Number of forced picks so far.
    pub forced: usize,
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    /// `forbidden[a]` lists who `a` may not draw.
    forbidden: Vec<Vec<ModelId>>,
    picked: Vec<bool>,
    claimed_by: Vec<Option<ModelId>>,
    status: ModelStatus,
    forced: usize,
}

impl ModelWorld {
    /// Create a model with `size` participants and directional restrictions
    /// `(picker, forbidden)`. Self-restrictions and out-of-range indices are
    /// ignored.
    pub fn new(size: u8, restrictions: &[(ModelId, ModelId)]) -> Self {
        let mut forbidden = vec![Vec::new(); size as usize];
        for &(from, to) in restrictions {
            if from != to && from < size && to < size && !forbidden[from as usize].contains(&to) {
                forbidden[from as usize].push(to);
            }
        }

        let mut world = Self {
            forbidden,
            picked: vec![false; size as usize],
            claimed_by: vec![None; size as usize],
            status: ModelStatus::Open,
            forced: 0,
        };
        world.reset();
        world
    }

    /// Number of participants.
    pub fn size(&self) -> usize {
        self.picked.len()
    }

    /// Real roster equivalent of this model. Participant `i` has id `p{i}`.
    pub fn participants(&self) -> Vec<Participant> {
        self.forbidden
            .iter()
            .enumerate()
            .map(|(i, forbidden)| {
                forbidden.iter().fold(
                    Participant::new(format!("p{i}"), format!("Person {i}")),
                    |p, to| p.forbid(format!("p{to}")),
                )
            })
            .collect()
    }

    /// Predict the result of `op` and apply every effect that does not depend
    /// on the random choice.
    ///
    /// A `Picked` prediction leaves the model unchanged until
    /// [`ModelWorld::record_pick`] reports the recipient actually drawn.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Pick { picker } => self.predict_pick(*picker),
            Operation::Reset => {
                self.reset();
                OperationResult::Ok
            },
            Operation::Status => OperationResult::Ok,
        }
    }

    /// Commit a pick the real session made.
    pub fn record_pick(&mut self, picker: ModelId, recipient: ModelId, forced: bool) {
        self.picked[picker as usize] = true;
        self.claimed_by[recipient as usize] = Some(picker);
        if forced {
            self.forced += 1;
        }
        if self.picked.iter().all(|&p| p) {
            self.status = ModelStatus::Completed;
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            picked: self.picked.clone(),
            claimed_by: self.claimed_by.clone(),
            status: self.status,
            forced: self.forced,
        }
    }

    fn predict_pick(&mut self, picker: ModelId) -> OperationResult {
        let index = picker as usize;
        if index >= self.size() {
            return OperationResult::Error(OperationError::UnknownParticipant);
        }
        if self.picked[index] {
            return OperationResult::Error(OperationError::AlreadyPicked);
        }
        if self.status != ModelStatus::Open {
            return OperationResult::Error(OperationError::NotOpen);
        }

        let unclaimed: Vec<ModelId> = (0..self.size())
            .filter(|&r| r != index && self.claimed_by[r].is_none())
            .filter_map(|r| ModelId::try_from(r).ok())
            .collect();
        let strict: Vec<ModelId> =
            unclaimed.iter().copied().filter(|r| !self.forbidden[index].contains(r)).collect();

        if !strict.is_empty() {
            OperationResult::Picked { candidates: strict, forced: false }
        } else if !unclaimed.is_empty() {
            OperationResult::Picked { candidates: unclaimed, forced: true }
        } else {
            self.status = ModelStatus::Infeasible;
            OperationResult::Error(OperationError::Infeasible)
        }
    }

    fn reset(&mut self) {
        self.picked.fill(false);
        self.claimed_by.fill(None);
        self.forced = 0;
        self.status = if self.picked.is_empty() { ModelStatus::Completed } else { ModelStatus::Open };
    }
}
