//! Roster file loading.
//!
//! A roster file is TOML:
//!
//! ```toml
//! event = "Family 2026"
//! date = "December 24"      # optional, defaults to the day of the draw
//! template = "formal"       # optional: fun, formal, emoji or simple
//! message = "{picker}, you have {picked}!"  # optional, overrides template
//!
//! [[participants]]
//! id = "alice"
//! name = "Alice"
//! contact = "+1 555 0100"   # optional
//! forbidden = ["bob"]       # optional
//! ```
//!
//! Restrictions may point forward to participants declared later in the file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tinsel_core::{
    ExchangeConfig, MessageTemplate, Participant, ParticipantRegistry, RegistryError,
    UnknownTemplate,
};

/// Errors from loading a roster file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid roster TOML.
    #[error("invalid roster file: {0}")]
    Parse(#[from] toml::de::Error),

    /// `template` names no known preset.
    #[error(transparent)]
    Template(#[from] UnknownTemplate),

    /// Participants or restrictions are inconsistent.
    #[error("invalid roster: {0}")]
    Registry(#[from] RegistryError),
}

/// Parsed roster file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterFile {
    /// Event name.
    pub event: String,
    /// Date shown in messages.
    #[serde(default)]
    pub date: Option<String>,
    /// Preset template name.
    #[serde(default)]
    pub template: Option<String>,
    /// Custom template text, takes precedence over `template`.
    #[serde(default)]
    pub message: Option<String>,
    /// Everyone taking part.
    #[serde(default)]
    pub participants: Vec<ParticipantEntry>,
}

/// One `[[participants]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticipantEntry {
    /// Unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Where to deliver the assignment.
    #[serde(default)]
    pub contact: Option<String>,
    /// Ids this participant must not draw.
    #[serde(default)]
    pub forbidden: Vec<String>,
}

impl RosterFile {
    /// Read and parse a roster file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&text)
    }

    /// Parse roster TOML.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Build the registry, validating ids and restrictions.
    pub fn registry(&self) -> Result<ParticipantRegistry, ConfigError> {
        let participants = self.participants.iter().map(|entry| {
            let participant = Participant::new(entry.id.as_str(), entry.name.as_str());
            let participant = match &entry.contact {
                Some(contact) => participant.with_contact(contact.as_str()),
                None => participant,
            };
            entry.forbidden.iter().fold(participant, |p, id| p.forbid(id.as_str()))
        });

        Ok(ParticipantRegistry::build(participants)?)
    }

    /// Event details for the exchange driver.
    pub fn exchange_config(&self) -> Result<ExchangeConfig, ConfigError> {
        let template = match (&self.message, &self.template) {
            (Some(text), _) => MessageTemplate::Custom(text.clone()),
            (None, Some(name)) => name.parse()?,
            (None, None) => MessageTemplate::default(),
        };

        Ok(ExchangeConfig { event_name: self.event.clone(), template, event_date: self.date.clone() })
    }
}
