//! Assignment messages and the delivery collaborator.
//!
//! After a successful pick the caller may render a message for the picker and
//! hand it to a [`Notifier`]. Delivery is best-effort: a failed delivery is
//! reported to the caller but never undoes or blocks the pick.
//!
//! Templates are plain string substitution:
//!
//! | Placeholder   | Value                      |
//! |---------------|----------------------------|
//! | `{picker}`    | picker display name        |
//! | `{picked}`    | recipient display name     |
//! | `{recipient}` | alias of `{picked}`        |
//! | `{event}`     | event name                 |
//! | `{date}`      | event date                 |

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    /// Picker display name.
    pub picker: &'a str,
    /// Recipient display name.
    pub recipient: &'a str,
    /// Event name.
    pub event: &'a str,
    /// Event date, already formatted.
    pub date: &'a str,
}

/// Message template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTemplate {
    /// Upbeat announcement.
    #[default]
    Fun,
    /// Letter style, includes the date.
    Formal,
    /// Short, emoji-heavy.
    Emoji,
    /// Bare facts.
    Simple,
    /// Caller-supplied template text.
    Custom(String),
}

impl MessageTemplate {
    /// Template text with placeholders.
    pub fn text(&self) -> &str {
        match self {
            Self::Fun => {
                "🎁 Gift exchange time!\nYou're giving a gift to {picked}!\nGet ready for some fun! 🎉\n\nEvent: {event}"
            },
            Self::Formal => {
                "Gift Exchange Assignment\n\nHi {picker},\n\nYou have been assigned to give a gift to: {picked}.\n\nEvent: {event}\nDate: {date}"
            },
            Self::Emoji => "🎁 You got {picked}! 🎉\nTime for some gift magic! ✨🎄⛄\n\nEvent: {event}",
            Self::Simple => "Gift Exchange Assignment\n\nYou: {picker}\nYour person: {picked}\n\nEvent: {event}",
            Self::Custom(text) => text,
        }
    }

    /// Substitute every placeholder.
    pub fn render(&self, ctx: &MessageContext<'_>) -> String {
        self.text()
            .replace("{picker}", ctx.picker)
            .replace("{picked}", ctx.recipient)
            .replace("{recipient}", ctx.recipient)
            .replace("{event}", ctx.event)
            .replace("{date}", ctx.date)
    }
}

/// Unrecognised preset name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown message template: {0} (expected fun, formal, emoji or simple)")]
pub struct UnknownTemplate(pub String);

impl FromStr for MessageTemplate {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fun" => Ok(Self::Fun),
            "formal" => Ok(Self::Formal),
            "emoji" => Ok(Self::Emoji),
            "simple" => Ok(Self::Simple),
            other => Err(UnknownTemplate(other.to_string())),
        }
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fun => f.write_str("fun"),
            Self::Formal => f.write_str("formal"),
            Self::Emoji => f.write_str("emoji"),
            Self::Simple => f.write_str("simple"),
            Self::Custom(_) => f.write_str("custom"),
        }
    }
}

/// Delivery failure reported by a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The contact could not be used (malformed number, unknown address).
    #[error("invalid contact: {0}")]
    InvalidContact(String),

    /// The delivery channel refused or failed to send.
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// External delivery collaborator (SMS gateway, push service, mailer).
pub trait Notifier {
    /// Send `message` to `contact`.
    fn deliver(&self, contact: &str, message: &str) -> Result<(), DeliveryError>;
}
