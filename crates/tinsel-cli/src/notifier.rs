//! Log-backed delivery.
//!
//! The command line has no SMS gateway or mailer. `LogNotifier` records each
//! message through `tracing` so a draw can be audited with `RUST_LOG=info`,
//! and optionally keeps the messages for printing.

use std::sync::{Mutex, PoisonError};

use tinsel_core::{DeliveryError, Notifier};

/// A message handed to [`LogNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    /// Contact it was addressed to.
    pub contact: String,
    /// Rendered message.
    pub message: String,
}

/// Notifier that logs every delivery.
#[derive(Debug, Default)]
pub struct LogNotifier {
    outbox: Mutex<Vec<Delivered>>,
}

impl LogNotifier {
    /// Create a notifier with an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, in delivery order.
    pub fn outbox(&self) -> Vec<Delivered> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Notifier for LogNotifier {
    fn deliver(&self, contact: &str, message: &str) -> Result<(), DeliveryError> {
        let contact = contact.trim();
        if contact.is_empty() {
            return Err(DeliveryError::InvalidContact("empty contact".to_string()));
        }

        tracing::info!(contact, "delivering assignment");
        tracing::debug!(contact, "{}", message);
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Delivered { contact: contact.to_string(), message: message.to_string() });
        Ok(())
    }
}
