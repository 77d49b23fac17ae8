//! Assignment ledger and its export formats.
//!
//! The ledger is the append-only history of a session's picks, in pick order.
//! It can be rendered as:
//!
//! - an interchange document (JSON), which [`Ledger::from_interchange`] turns
//!   back into an identical ledger
//! - a numbered plain-text list
//! - a one-line-per-pick summary
//!
//! # Round-trip law
//!
//! `Ledger::from_interchange(&ledger.to_interchange(name, at))` equals
//! `ledger` for every ledger. Only the timestamp is regenerated on export.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::participant::{Participant, ParticipantId};

/// Identity of a participant as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantRef {
    /// Participant id.
    pub id: ParticipantId,
    /// Display name at the time of the pick.
    pub display_name: String,
}

impl From<&Participant> for ParticipantRef {
    fn from(participant: &Participant) -> Self {
        Self { id: participant.id.clone(), display_name: participant.display_name.clone() }
    }
}

/// One completed pick. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssignmentRecord {
    picker: ParticipantRef,
    recipient: ParticipantRef,
    was_forced: bool,
}

impl AssignmentRecord {
    pub(crate) fn new(picker: ParticipantRef, recipient: ParticipantRef, was_forced: bool) -> Self {
        Self { picker, recipient, was_forced }
    }

    /// Who drew.
    pub fn picker(&self) -> &ParticipantRef {
        &self.picker
    }

    /// Who was drawn.
    pub fn recipient(&self) -> &ParticipantRef {
        &self.recipient
    }

    /// Whether a restriction was overridden to make this pick.
    pub fn was_forced(&self) -> bool {
        self.was_forced
    }
}

/// Errors from ledger import.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Document is not valid JSON or does not have the expected shape.
    #[error("malformed interchange document: {0}")]
    Json(#[from] serde_json::Error),

    /// A participant was assigned to themselves.
    #[error("{id} is assigned to themselves")]
    SelfAssignment {
        /// The offending participant.
        id: ParticipantId,
    },

    /// A participant picks more than once.
    #[error("{id} picks more than once")]
    DuplicatePicker {
        /// The repeated picker.
        id: ParticipantId,
    },

    /// A participant is drawn more than once.
    #[error("{id} is drawn more than once")]
    DuplicateRecipient {
        /// The repeated recipient.
        id: ParticipantId,
    },
}

/// Ordered, append-only list of picks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: Vec<AssignmentRecord>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Only the selection engine calls this, in the same step
    /// that updates assignment state.
    pub(crate) fn append(&mut self, record: AssignmentRecord) {
        self.records.push(record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// Records in pick order.
    pub fn records(&self) -> &[AssignmentRecord] {
        &self.records
    }

    /// Number of picks recorded.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no pick has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of picks that overrode a restriction.
    pub fn forced_count(&self) -> usize {
        self.records.iter().filter(|r| r.was_forced).count()
    }

    /// Render the interchange document.
    pub fn to_interchange(
        &self,
        event: impl Into<String>,
        generated_at: DateTime<Utc>,
    ) -> InterchangeDocument {
        let assignments = self
            .records
            .iter()
            .map(|record| InterchangeEntry {
                picker: record.picker.display_name.clone(),
                recipient: record.recipient.display_name.clone(),
                picker_id: Some(record.picker.id.clone()),
                recipient_id: Some(record.recipient.id.clone()),
                forced: record.was_forced,
            })
            .collect();

        InterchangeDocument { event: event.into(), generated_at: Some(generated_at), assignments }
    }

    /// Rebuild a ledger from an interchange document.
    ///
    /// Entries without ids (documents written by older exporters) use the
    /// display name as id.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::SelfAssignment`, `ExportError::DuplicatePicker` or
    /// `ExportError::DuplicateRecipient` if the document does not describe a
    /// valid partial assignment.
    pub fn from_interchange(document: &InterchangeDocument) -> Result<Self, ExportError> {
        let mut pickers = HashSet::new();
        let mut recipients = HashSet::new();
        let mut ledger = Self::new();

        for entry in &document.assignments {
            let picker = ParticipantRef {
                id: entry.picker_id.clone().unwrap_or_else(|| entry.picker.clone().into()),
                display_name: entry.picker.clone(),
            };
            let recipient = ParticipantRef {
                id: entry.recipient_id.clone().unwrap_or_else(|| entry.recipient.clone().into()),
                display_name: entry.recipient.clone(),
            };

            if picker.id == recipient.id {
                return Err(ExportError::SelfAssignment { id: picker.id });
            }
            if !pickers.insert(picker.id.clone()) {
                return Err(ExportError::DuplicatePicker { id: picker.id });
            }
            if !recipients.insert(recipient.id.clone()) {
                return Err(ExportError::DuplicateRecipient { id: recipient.id });
            }

            ledger.append(AssignmentRecord::new(picker, recipient, entry.forced));
        }

        Ok(ledger)
    }

    /// Numbered plain-text list: the event name, then one line per pick.
    pub fn to_plain_text(&self, event: &str) -> String {
        let lines = self.records.iter().enumerate().map(|(n, record)| {
            format!("{}. {} → {}", n + 1, record.picker.display_name, record.recipient.display_name)
        });

        std::iter::once(event.to_string()).chain(lines).collect::<Vec<_>>().join("\n")
    }

    /// One `"<picker> got <recipient>"` line per pick.
    pub fn to_simple_summary(&self) -> String {
        self.records
            .iter()
            .map(|r| format!("{} got {}", r.picker.display_name, r.recipient.display_name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Portable description of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterchangeDocument {
    /// Event the exchange belongs to.
    pub event: String,
    /// When the document was produced.
    #[serde(default, alias = "date", skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// Picks in pick order.
    #[serde(alias = "results")]
    pub assignments: Vec<InterchangeEntry>,
}

impl InterchangeDocument {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A single pick in an interchange document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterchangeEntry {
    /// Picker display name.
    pub picker: String,
    /// Recipient display name.
    #[serde(alias = "picked")]
    pub recipient: String,
    /// Picker id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picker_id: Option<ParticipantId>,
    /// Recipient id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<ParticipantId>,
    /// Whether a restriction was overridden.
    #[serde(default)]
    pub forced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, name: &str) -> ParticipantRef {
        ParticipantRef { id: id.into(), display_name: name.to_string() }
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.append(AssignmentRecord::new(person("a", "Ann"), person("b", "Bob"), false));
        ledger.append(AssignmentRecord::new(person("b", "Bob"), person("c", "Cat"), true));
        ledger.append(AssignmentRecord::new(person("c", "Cat"), person("a", "Ann"), false));
        ledger
    }

    fn at() -> DateTime<Utc> {
        DateTime::<Utc>::default()
    }

    #[test]
    fn interchange_round_trip_is_exact() {
        let ledger = sample_ledger();
        let document = ledger.to_interchange("Party", at());

        let rebuilt = Ledger::from_interchange(&document).unwrap();
        assert_eq!(rebuilt, ledger);
    }

    #[test]
    fn interchange_round_trip_through_json() {
        let ledger = sample_ledger();
        let json = ledger.to_interchange("Party", at()).to_json_pretty().unwrap();

        let document = InterchangeDocument::from_json(&json).unwrap();
        assert_eq!(document.event, "Party");
        assert_eq!(Ledger::from_interchange(&document).unwrap(), ledger);
    }

    #[test]
    fn interchange_uses_display_names_in_order() {
        let document = sample_ledger().to_interchange("Party", at());
        let pairs: Vec<_> =
            document.assignments.iter().map(|e| (e.picker.as_str(), e.recipient.as_str())).collect();
        assert_eq!(pairs, [("Ann", "Bob"), ("Bob", "Cat"), ("Cat", "Ann")]);
    }

    #[test]
    fn legacy_document_is_accepted() {
        let json = r#"{
            "event": "Family",
            "date": "2024-12-01T10:00:00Z",
            "results": [
                { "picker": "Ann", "picked": "Bob" },
                { "picker": "Bob", "picked": "Ann" }
            ]
        }"#;

        let document = InterchangeDocument::from_json(json).unwrap();
        let ledger = Ledger::from_interchange(&document).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.records()[0].picker().id, ParticipantId::from("Ann"));
        assert_eq!(ledger.records()[0].recipient().display_name, "Bob");
        assert!(!ledger.records()[1].was_forced());
    }

    #[test]
    fn import_rejects_duplicate_recipient() {
        let json = r#"{ "event": "E", "assignments": [
            { "picker": "Ann", "recipient": "Cat" },
            { "picker": "Bob", "recipient": "Cat" }
        ] }"#;

        let document = InterchangeDocument::from_json(json).unwrap();
        let result = Ledger::from_interchange(&document);
        assert!(matches!(result, Err(ExportError::DuplicateRecipient { id }) if id.as_str() == "Cat"));
    }

    #[test]
    fn import_rejects_self_assignment_and_repeat_picker() {
        let json = r#"{ "event": "E", "assignments": [{ "picker": "Ann", "recipient": "Ann" }] }"#;
        let document = InterchangeDocument::from_json(json).unwrap();
        assert!(matches!(
            Ledger::from_interchange(&document),
            Err(ExportError::SelfAssignment { .. })
        ));

        let json = r#"{ "event": "E", "assignments": [
            { "picker": "Ann", "recipient": "Bob" },
            { "picker": "Ann", "recipient": "Cat" }
        ] }"#;
        let document = InterchangeDocument::from_json(json).unwrap();
        assert!(matches!(
            Ledger::from_interchange(&document),
            Err(ExportError::DuplicatePicker { .. })
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(InterchangeDocument::from_json("{"), Err(ExportError::Json(_))));
    }

    #[test]
    fn plain_text_format() {
        insta::assert_snapshot!(sample_ledger().to_plain_text("Party"), @r"
        Party
        1. Ann → Bob
        2. Bob → Cat
        3. Cat → Ann
        ");
    }

    #[test]
    fn plain_text_of_empty_ledger_is_header_only() {
        assert_eq!(Ledger::new().to_plain_text("Party"), "Party");
    }

    #[test]
    fn simple_summary_format() {
        assert_eq!(sample_ledger().to_simple_summary(), "Ann got Bob\nBob got Cat\nCat got Ann");
        assert_eq!(Ledger::new().to_simple_summary(), "");
    }

    #[test]
    fn forced_count_counts_overrides() {
        assert_eq!(sample_ledger().forced_count(), 1);
    }
}
