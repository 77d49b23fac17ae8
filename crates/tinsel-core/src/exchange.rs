//! Exchange driver
//!
//! Wraps an [`AssignmentSession`] with the event details and turns every pick
//! into actions for the caller to execute.
//!
//! ## Responsibilities
//!
//! - Pick orchestration: forward picks to the session
//! - Message rendering: produce the picker's notification text
//! - Persistence trigger: emit a snapshot once the exchange completes
//!
//! ## Design
//!
//! - Action-based: the driver performs no I/O. Delivery and storage are
//!   external collaborators driven by [`execute`]
//! - Actions are only produced after a pick has fully succeeded, so
//!   abandoning an exchange never leaves partial external effects

use chrono::{DateTime, Utc};

use crate::{
    env::Environment,
    error::SessionError,
    ledger::AssignmentRecord,
    notify::{MessageContext, MessageTemplate, Notifier},
    participant::{ParticipantId, Roster},
    session::{AssignmentSession, Progress},
    store::{ExchangeId, ExchangeSnapshot, ExchangeStore},
};

/// Event details used for messages and exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Event name.
    pub event_name: String,
    /// Message template for pick notifications.
    pub template: MessageTemplate,
    /// Date shown in messages. Defaults to the day the exchange was opened.
    pub event_date: Option<String>,
}

impl ExchangeConfig {
    /// Config with the default template and no explicit date.
    pub fn new(event_name: impl Into<String>) -> Self {
        Self { event_name: event_name.into(), template: MessageTemplate::default(), event_date: None }
    }
}

/// Severity of a [`ExchangeAction::Log`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Informational.
    Info,
    /// Worth surfacing to participants.
    Warn,
}

/// Actions returned by [`Exchange::pick`] for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeAction {
    /// Deliver the picker's assignment.
    Notify {
        /// Picker the message is for.
        picker: ParticipantId,
        /// Where to deliver it.
        contact: String,
        /// Rendered message.
        message: String,
    },

    /// Store the finished exchange.
    Persist {
        /// Snapshot to store.
        snapshot: Box<ExchangeSnapshot>,
    },

    /// Log a notable event.
    Log {
        /// Severity.
        level: LogLevel,
        /// Message.
        message: String,
    },
}

/// A running exchange.
#[derive(Debug)]
pub struct Exchange<E>
where
    E: Environment,
{
    id: ExchangeId,
    config: ExchangeConfig,
    created_at: DateTime<Utc>,
    session: AssignmentSession<E>,
}

impl<E> Exchange<E>
where
    E: Environment,
{
    /// Open an exchange over `roster`.
    pub fn open(roster: Roster, config: ExchangeConfig, env: E) -> Self {
        let id = ExchangeId(env.random_u64());
        let created_at = env.now();
        tracing::info!(%id, event = %config.event_name, participants = roster.len(), "exchange opened");

        Self { id, config, created_at, session: AssignmentSession::open(roster, env) }
    }

    /// Exchange identifier.
    pub fn id(&self) -> ExchangeId {
        self.id
    }

    /// Event details.
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Underlying session.
    pub fn session(&self) -> &AssignmentSession<E> {
        &self.session
    }

    /// Current progress.
    pub fn status(&self) -> Progress {
        self.session.status()
    }

    /// Draw for `picker` and return the record plus follow-up actions.
    ///
    /// # Errors
    ///
    /// Propagates every [`SessionError`] from the session unchanged.
    pub fn pick(
        &mut self,
        picker: &ParticipantId,
    ) -> Result<(AssignmentRecord, Vec<ExchangeAction>), SessionError> {
        let record = self.session.pick(picker)?;
        let mut actions = Vec::new();

        if record.was_forced() {
            actions.push(ExchangeAction::Log {
                level: LogLevel::Warn,
                message: format!(
                    "{} had to draw {} despite a restriction",
                    record.picker().display_name,
                    record.recipient().display_name
                ),
            });
        }

        let contact = self.session.roster().get(picker).and_then(|p| p.contact.clone());
        if let Some(contact) = contact {
            actions.push(ExchangeAction::Notify {
                picker: picker.clone(),
                contact,
                message: self.render_message(&record),
            });
        }

        if self.session.is_complete() {
            let ledger = self.session.ledger();
            actions.push(ExchangeAction::Log {
                level: LogLevel::Info,
                message: format!(
                    "{} complete: {} picks, {} forced",
                    self.config.event_name,
                    ledger.len(),
                    ledger.forced_count()
                ),
            });
            actions.push(ExchangeAction::Persist { snapshot: Box::new(self.snapshot()) });
        }

        Ok((record, actions))
    }

    /// Discard all picks.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Message for the picker of `record`.
    pub fn render_message(&self, record: &AssignmentRecord) -> String {
        let date = self
            .config
            .event_date
            .clone()
            .unwrap_or_else(|| self.created_at.format("%Y-%m-%d").to_string());

        self.config.template.render(&MessageContext {
            picker: &record.picker().display_name,
            recipient: &record.recipient().display_name,
            event: &self.config.event_name,
            date: &date,
        })
    }

    /// Current state as a storable snapshot.
    pub fn snapshot(&self) -> ExchangeSnapshot {
        ExchangeSnapshot {
            id: self.id,
            event: self.config.event_name.clone(),
            created_at: self.created_at,
            completed: self.session.is_complete(),
            participants: self.session.roster().participants().to_vec(),
            document: self.session.to_interchange(&self.config.event_name),
        }
    }
}

/// What happened when executing actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Messages delivered.
    pub delivered: usize,
    /// Pickers whose message could not be delivered.
    pub undelivered: Vec<ParticipantId>,
    /// Snapshots stored.
    pub persisted: usize,
    /// Snapshots that failed to store.
    pub persist_failures: usize,
}

/// Execute actions best-effort.
///
/// Failures are logged and counted, never returned: the pick they follow has
/// already been committed.
pub fn execute(
    actions: Vec<ExchangeAction>,
    notifier: &(impl Notifier + ?Sized),
    store: &(impl ExchangeStore + ?Sized),
) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    for action in actions {
        match action {
            ExchangeAction::Notify { picker, contact, message } => {
                match notifier.deliver(&contact, &message) {
                    Ok(()) => report.delivered += 1,
                    Err(e) => {
                        tracing::warn!(%picker, "notification not delivered: {}", e);
                        report.undelivered.push(picker);
                    },
                }
            },

            ExchangeAction::Persist { snapshot } => match store.save(&snapshot) {
                Ok(()) => report.persisted += 1,
                Err(e) => {
                    tracing::error!(id = %snapshot.id, "failed to persist exchange: {}", e);
                    report.persist_failures += 1;
                },
            },

            ExchangeAction::Log { level, message } => match level {
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
            },
        }
    }

    report
}
