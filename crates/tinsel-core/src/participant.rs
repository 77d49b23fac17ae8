//! Participant roster and forbidden-pair relation.
//!
//! The [`ParticipantRegistry`] is owned by the caller and may be edited freely
//! between exchanges. Opening a session takes a [`Roster`], an immutable
//! snapshot of the registry, so edits made while a session runs never reach
//! it.
//!
//! # Invariants
//!
//! - Ids are unique within a registry
//! - `forbidden` never contains the participant's own id
//! - `forbidden` only contains ids of other registered participants (removal
//!   strips the removed id everywhere)
//! - Restrictions are directional: "A may not pick B" says nothing about B

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::RegistryError,
    feasibility::{self, Feasibility},
};

/// Stable participant identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create an id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A member of the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Unique identifier.
    pub id: ParticipantId,
    /// Name shown in exports and messages.
    pub display_name: String,
    /// Where to deliver this participant's assignment (phone number, address).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Participants this one may not draw.
    #[serde(default)]
    pub forbidden: BTreeSet<ParticipantId>,
}

impl Participant {
    /// Create a participant with no contact and no restrictions.
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            contact: None,
            forbidden: BTreeSet::new(),
        }
    }

    /// Set the delivery contact.
    #[must_use]
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// Add a forbidden recipient.
    #[must_use]
    pub fn forbid(mut self, id: impl Into<ParticipantId>) -> Self {
        self.forbidden.insert(id.into());
        self
    }

    /// Whether this participant may not draw `id`.
    pub fn forbids(&self, id: &ParticipantId) -> bool {
        self.forbidden.contains(id)
    }
}

/// Mutable roster owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    /// Participants in insertion order.
    participants: Vec<Participant>,
}

impl ParticipantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from declarations whose restrictions may reference
    /// participants declared later in the list.
    ///
    /// Everyone is registered first, then restrictions are applied, so
    /// symmetric pairs can be declared in any order.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateId` for a repeated id,
    /// `RegistryError::SelfRestriction` if someone forbids themselves and
    /// `RegistryError::UnknownParticipant` if a restriction names nobody.
    pub fn build(
        participants: impl IntoIterator<Item = Participant>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        let mut restrictions = Vec::new();

        for mut participant in participants {
            let forbidden = std::mem::take(&mut participant.forbidden);
            if forbidden.contains(&participant.id) {
                return Err(RegistryError::SelfRestriction { id: participant.id });
            }
            restrictions.push((participant.id.clone(), forbidden));
            registry.add(participant)?;
        }

        for (id, forbidden) in restrictions {
            for target in forbidden {
                registry.set_restriction(&id, &target, true)?;
            }
        }

        Ok(registry)
    }

    /// Register a participant.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateId` if the id is taken,
    /// `RegistryError::SelfRestriction` if `forbidden` contains the
    /// participant's own id and `RegistryError::UnknownParticipant` if
    /// `forbidden` names someone not registered.
    pub fn add(&mut self, participant: Participant) -> Result<(), RegistryError> {
        if self.contains(&participant.id) {
            return Err(RegistryError::DuplicateId { id: participant.id });
        }

        if participant.forbids(&participant.id) {
            return Err(RegistryError::SelfRestriction { id: participant.id });
        }

        if let Some(unknown) = participant.forbidden.iter().find(|id| !self.contains(id)) {
            return Err(RegistryError::UnknownParticipant { id: unknown.clone() });
        }

        tracing::debug!(id = %participant.id, "participant registered");
        self.participants.push(participant);
        Ok(())
    }

    /// Remove a participant and every restriction that names them.
    ///
    /// Returns the removed participant, or `None` if the id was not registered.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        let position = self.participants.iter().position(|p| &p.id == id)?;
        let removed = self.participants.remove(position);

        for participant in &mut self.participants {
            participant.forbidden.remove(id);
        }

        tracing::debug!(%id, "participant removed");
        Some(removed)
    }

    /// Add (`present = true`) or lift (`present = false`) the restriction
    /// "`id` may not pick `target`".
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::SelfRestriction` if `id == target` and
    /// `RegistryError::UnknownParticipant` if either id is not registered.
    pub fn set_restriction(
        &mut self,
        id: &ParticipantId,
        target: &ParticipantId,
        present: bool,
    ) -> Result<(), RegistryError> {
        if !self.contains(target) {
            return Err(RegistryError::UnknownParticipant { id: target.clone() });
        }

        let participant = self
            .participants
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| RegistryError::UnknownParticipant { id: id.clone() })?;

        if id == target {
            return Err(RegistryError::SelfRestriction { id: id.clone() });
        }

        if present {
            participant.forbidden.insert(target.clone());
        } else {
            participant.forbidden.remove(target);
        }

        Ok(())
    }

    /// Drop every restriction held by `id`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownParticipant` if the id is not registered.
    pub fn clear_restrictions(&mut self, id: &ParticipantId) -> Result<(), RegistryError> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| RegistryError::UnknownParticipant { id: id.clone() })?;

        participant.forbidden.clear();
        Ok(())
    }

    /// All participants in insertion order.
    pub fn all(&self) -> &[Participant] {
        &self.participants
    }

    /// Look up a participant.
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.id == id)
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Freeze the current roster for a session.
    pub fn snapshot(&self) -> Roster {
        Roster::new(self.participants.clone())
    }

    /// Whether a complete draw can respect every restriction. Advisory only.
    pub fn preflight(&self) -> Feasibility {
        feasibility::check(&self.snapshot())
    }
}

/// Immutable roster snapshot held by a session for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    participants: Vec<Participant>,
    index: HashMap<ParticipantId, usize>,
}

impl Roster {
    fn new(participants: Vec<Participant>) -> Self {
        let index = participants.iter().enumerate().map(|(i, p)| (p.id.clone(), i)).collect();
        Self { participants, index }
    }

    /// Participants in registry insertion order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Look up a participant.
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.index_of(id).map(|i| &self.participants[i])
    }

    /// Position of `id` in insertion order.
    pub fn index_of(&self, id: &ParticipantId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
