//! Subcommand implementations.
//!
//! Each command returns its output as a string; `main` only parses arguments,
//! sets up logging and writes the result to stdout.

use std::fmt::Write as _;

use clap::ValueEnum;
use thiserror::Error;
use tinsel_core::{
    Environment, Exchange, ExchangeAction, ExchangeId, ExchangeStore, ExportError, Feasibility,
    InterchangeDocument, Ledger, ParticipantId, ParticipantRegistry, SessionError, StoreError,
    execute,
};

use crate::{
    config::{ConfigError, RosterFile},
    notifier::LogNotifier,
};

/// Errors surfaced by the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// Roster file problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A pick was rejected.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Export or import failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// History storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No stored exchange with this id.
    #[error("no exchange {0} in history")]
    NotFound(ExchangeId),

    /// Every attempt ran into a dead end.
    #[error("no complete draw after {attempts} attempts, try another order or seed")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
    },
}

/// How to print a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Interchange JSON document.
    Json,
    /// Event name and numbered list.
    #[default]
    Text,
    /// One "<picker> got <recipient>" line per pick.
    Simple,
}

/// Options for [`draw`].
#[derive(Debug, Clone)]
pub struct DrawOptions {
    /// Pickers to go first, in order. Everyone else follows in roster order.
    pub order: Vec<String>,
    /// Output format.
    pub format: OutputFormat,
    /// Full redraws allowed after a dead end.
    pub attempts: u32,
    /// Append the rendered messages to the output.
    pub show_messages: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self { order: Vec::new(), format: OutputFormat::Text, attempts: 10, show_messages: false }
    }
}

/// Render a ledger in `format`.
pub fn render(
    ledger: &Ledger,
    document: &InterchangeDocument,
    format: OutputFormat,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => document.to_json_pretty()?,
        OutputFormat::Text => ledger.to_plain_text(&document.event),
        OutputFormat::Simple => ledger.to_simple_summary(),
    })
}

/// `tinsel check`: validate a roster and report whether every restriction can
/// be honoured.
pub fn check(roster: &RosterFile) -> Result<String, CliError> {
    let registry = roster.registry()?;
    roster.exchange_config()?;

    let mut out = format!("{}: {} participants\n", roster.event, registry.len());
    for participant in registry.all() {
        if participant.forbidden.is_empty() {
            continue;
        }
        let names: Vec<_> =
            participant.forbidden.iter().map(|id| display_name(&registry, id)).collect();
        let _ = writeln!(out, "  {} avoids {}", participant.display_name, names.join(", "));
    }

    match registry.preflight() {
        Feasibility::Feasible { .. } => {
            out.push_str("feasible: every restriction can be honoured");
        },
        Feasibility::Infeasible { stranded } => {
            let names: Vec<_> = stranded.iter().map(|id| display_name(&registry, id)).collect();
            let _ = write!(
                out,
                "infeasible: some picks will override a restriction (stranded: {})",
                names.join(", ")
            );
        },
    }

    Ok(out)
}

/// `tinsel draw`: run a complete exchange.
///
/// Picks are made in the requested order. A dead end resets the exchange and
/// starts over, up to `options.attempts` times. Notifications and persistence
/// run only once a draw completes, so abandoned attempts leave no trace.
pub fn draw<E>(
    roster: &RosterFile,
    options: &DrawOptions,
    env: E,
    store: &dyn ExchangeStore,
) -> Result<String, CliError>
where
    E: Environment,
{
    let registry = roster.registry()?;
    let config = roster.exchange_config()?;

    if let Feasibility::Infeasible { stranded } = registry.preflight() {
        tracing::warn!(
            stranded = stranded.len(),
            "no draw can honour every restriction, some picks will be forced"
        );
    }

    let order = pick_order(&registry, &options.order);
    let mut exchange = Exchange::open(registry.snapshot(), config, env);
    let actions = complete(&mut exchange, &order, options.attempts.max(1))?;

    let notifier = LogNotifier::new();
    let report = execute(actions, &notifier, store);
    tracing::info!(
        id = %exchange.id(),
        delivered = report.delivered,
        undelivered = report.undelivered.len(),
        persisted = report.persisted,
        "draw finished"
    );

    let session = exchange.session();
    let document = session.to_interchange(&exchange.config().event_name);
    let mut out = render(session.ledger(), &document, options.format)?;

    if options.show_messages {
        for delivered in notifier.outbox() {
            let _ = write!(out, "\n\n--- {} ---\n{}", delivered.contact, delivered.message);
        }
    }

    Ok(out)
}

/// Pick for everyone in `order`, retrying from scratch after a dead end.
fn complete<E>(
    exchange: &mut Exchange<E>,
    order: &[ParticipantId],
    attempts: u32,
) -> Result<Vec<ExchangeAction>, CliError>
where
    E: Environment,
{
    'attempt: for attempt in 1..=attempts {
        let mut actions = Vec::new();
        for picker in order {
            match exchange.pick(picker) {
                Ok((_, pick_actions)) => actions.extend(pick_actions),
                Err(SessionError::Infeasible { picker }) => {
                    tracing::warn!(attempt, %picker, "dead end, redrawing");
                    exchange.reset();
                    continue 'attempt;
                },
                Err(e) => return Err(e.into()),
            }
        }
        return Ok(actions);
    }

    Err(CliError::Exhausted { attempts })
}

/// Requested pickers first, then everyone else in roster order.
fn pick_order(registry: &ParticipantRegistry, requested: &[String]) -> Vec<ParticipantId> {
    let mut order: Vec<ParticipantId> = Vec::new();
    let requested = requested.iter().map(|id| ParticipantId::from(id.trim()));
    for id in requested.chain(registry.all().iter().map(|p| p.id.clone())) {
        if !order.contains(&id) {
            order.push(id);
        }
    }
    order
}

fn display_name(registry: &ParticipantRegistry, id: &ParticipantId) -> String {
    registry.get(id).map_or_else(|| id.to_string(), |p| p.display_name.clone())
}

/// `tinsel show`: re-render an interchange document.
pub fn show(json: &str, format: OutputFormat) -> Result<String, CliError> {
    let document = InterchangeDocument::from_json(json)?;
    let ledger = Ledger::from_interchange(&document)?;
    render(&ledger, &document, format)
}

/// `tinsel history list`.
pub fn history_list(store: &dyn ExchangeStore) -> Result<String, CliError> {
    let mut lines = Vec::new();
    for id in store.list()? {
        let snapshot = match store.load(id) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(%id, "unreadable snapshot: {}", e);
                lines.push(format!("{id}  (unreadable)"));
                continue;
            },
        };
        let status = if snapshot.completed { "" } else { " (incomplete)" };
        lines.push(format!(
            "{}  {}  {}  {} picks{}",
            id,
            snapshot.created_at.format("%Y-%m-%d %H:%M"),
            snapshot.event,
            snapshot.document.assignments.len(),
            status
        ));
    }

    if lines.is_empty() {
        return Ok("no saved exchanges".to_string());
    }
    Ok(lines.join("\n"))
}

/// `tinsel history show`.
pub fn history_show(
    store: &dyn ExchangeStore,
    id: ExchangeId,
    format: OutputFormat,
) -> Result<String, CliError> {
    let snapshot = store.load(id)?.ok_or(CliError::NotFound(id))?;
    render(&snapshot.ledger()?, &snapshot.document, format)
}

/// `tinsel history delete`.
pub fn history_delete(store: &dyn ExchangeStore, id: ExchangeId) -> Result<String, CliError> {
    if store.delete(id)? {
        Ok(format!("deleted {id}"))
    } else {
        Err(CliError::NotFound(id))
    }
}
