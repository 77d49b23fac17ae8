//! Tinsel binary.
//!
//! # Usage
//!
//! ```bash
//! # Validate a roster and check that every restriction can be honoured
//! tinsel check family.toml
//!
//! # Draw, keeping the result in ./history
//! tinsel draw family.toml --history ./history
//!
//! # Reproducible draw with a fixed pick order
//! tinsel draw family.toml --seed 42 --order alice,bob --format json
//!
//! # Re-render an exported document
//! tinsel show family-2026.json --format simple
//!
//! # Browse history
//! tinsel history --dir ./history list
//! ```

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use tinsel_cli::{DrawOptions, FileStore, OutputFormat, RosterFile, SeededEnv, SystemEnv, commands};
use tinsel_core::{ExchangeId, ExchangeStore, MemoryStore};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Gift exchange draws with restrictions
#[derive(Parser, Debug)]
#[command(name = "tinsel")]
#[command(about = "Constrained random gift exchange draws")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a roster file
    Check {
        /// Roster file (TOML)
        roster: PathBuf,
    },

    /// Run a complete draw
    Draw {
        /// Roster file (TOML)
        roster: PathBuf,

        /// Comma-separated ids to pick first
        #[arg(long, value_delimiter = ',')]
        order: Vec<String>,

        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Directory to save the finished exchange in
        #[arg(long)]
        history: Option<PathBuf>,

        /// Redraws allowed after a dead end
        #[arg(long, default_value_t = 10)]
        attempts: u32,

        /// Print the message for each participant with a contact
        #[arg(long)]
        messages: bool,
    },

    /// Re-render an exported document
    Show {
        /// Interchange JSON file
        export: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Inspect saved exchanges
    History {
        /// History directory
        #[arg(long, default_value = ".tinsel")]
        dir: PathBuf,

        #[command(subcommand)]
        action: HistoryCommand,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List saved exchanges
    List,

    /// Print a saved exchange
    Show {
        /// Exchange id
        id: ExchangeId,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Delete a saved exchange
    Delete {
        /// Exchange id
        id: ExchangeId,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let output = match args.command {
        Command::Check { roster } => commands::check(&RosterFile::load(&roster)?)?,

        Command::Draw { roster, order, seed, format, history, attempts, messages } => {
            let roster = RosterFile::load(&roster)?;
            let options = DrawOptions { order, format, attempts, show_messages: messages };
            let store: Box<dyn ExchangeStore> = match history {
                Some(dir) => Box::new(FileStore::open(dir)?),
                None => Box::new(MemoryStore::new()),
            };

            match seed {
                Some(seed) => {
                    commands::draw(&roster, &options, SeededEnv::new(seed), store.as_ref())?
                },
                None => commands::draw(&roster, &options, SystemEnv::new(), store.as_ref())?,
            }
        },

        Command::Show { export, format } => commands::show(&fs::read_to_string(export)?, format)?,

        Command::History { dir, action } => {
            let store = FileStore::open(dir)?;
            match action {
                HistoryCommand::List => commands::history_list(&store)?,
                HistoryCommand::Show { id, format } => commands::history_show(&store, id, format)?,
                HistoryCommand::Delete { id } => commands::history_delete(&store, id)?,
            }
        },
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;

    Ok(())
}
