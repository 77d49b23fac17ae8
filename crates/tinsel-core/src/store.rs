//! Exchange history persistence.
//!
//! The engine never persists anything on its own. When a session completes,
//! the exchange driver emits a [`ExchangeSnapshot`] for the caller to hand to
//! an [`ExchangeStore`]. Loading a snapshot back yields a read-only
//! historical view: the roster and the ledger, never a resumable session.
//!
//! Snapshots are stored as CBOR.

use std::{
    collections::BTreeMap,
    fmt,
    str::FromStr,
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ledger::{ExportError, InterchangeDocument, Ledger},
    participant::Participant,
};

/// Identifier of a stored exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(pub u64);

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for ExchangeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(Self)
    }
}

/// Errors from snapshot encoding and stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Snapshot could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// Stored bytes are not a valid snapshot.
    #[error("decode error: {0}")]
    Decode(String),

    /// Backing storage failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything needed to show a past exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSnapshot {
    /// Exchange identifier.
    pub id: ExchangeId,
    /// Event name.
    pub event: String,
    /// When the exchange was opened.
    pub created_at: DateTime<Utc>,
    /// Whether every participant picked.
    pub completed: bool,
    /// Roster the exchange ran over.
    pub participants: Vec<Participant>,
    /// Picks in pick order.
    pub document: InterchangeDocument,
}

impl ExchangeSnapshot {
    /// Encode as CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>, StoreError> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(self, &mut bytes)
            .map_err(|e| StoreError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    /// Decode from CBOR.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, StoreError> {
        ciborium::de::from_reader(bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Rebuild the ledger for display.
    pub fn ledger(&self) -> Result<Ledger, ExportError> {
        Ledger::from_interchange(&self.document)
    }
}

/// External persistence collaborator.
pub trait ExchangeStore {
    /// Insert or replace a snapshot.
    fn save(&self, snapshot: &ExchangeSnapshot) -> Result<(), StoreError>;

    /// Load a snapshot, `None` if unknown.
    fn load(&self, id: ExchangeId) -> Result<Option<ExchangeSnapshot>, StoreError>;

    /// All stored ids in ascending order.
    fn list(&self) -> Result<Vec<ExchangeId>, StoreError>;

    /// Remove a snapshot. Returns whether it existed.
    fn delete(&self, id: ExchangeId) -> Result<bool, StoreError>;
}

/// In-memory store holding encoded snapshots.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: Mutex<BTreeMap<ExchangeId, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshots(&self) -> std::sync::MutexGuard<'_, BTreeMap<ExchangeId, Vec<u8>>> {
        self.snapshots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ExchangeStore for MemoryStore {
    fn save(&self, snapshot: &ExchangeSnapshot) -> Result<(), StoreError> {
        let bytes = snapshot.to_cbor()?;
        self.snapshots().insert(snapshot.id, bytes);
        Ok(())
    }

    fn load(&self, id: ExchangeId) -> Result<Option<ExchangeSnapshot>, StoreError> {
        self.snapshots().get(&id).map(|bytes| ExchangeSnapshot::from_cbor(bytes)).transpose()
    }

    fn list(&self) -> Result<Vec<ExchangeId>, StoreError> {
        Ok(self.snapshots().keys().copied().collect())
    }

    fn delete(&self, id: ExchangeId) -> Result<bool, StoreError> {
        Ok(self.snapshots().remove(&id).is_some())
    }
}
