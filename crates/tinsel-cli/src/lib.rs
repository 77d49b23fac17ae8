//! Tinsel command line.
//!
//! ## Architecture
//!
//! ```text
//! tinsel-cli
//!   ├─ RosterFile     (TOML roster + event details)
//!   ├─ SystemEnv      (production Environment impl)
//!   ├─ SeededEnv      (reproducible draws for --seed)
//!   ├─ FileStore      (exchange history, one CBOR file per exchange)
//!   ├─ LogNotifier    (delivery through tracing)
//!   └─ commands       (check, draw, show, history)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
pub mod config;
mod file_store;
mod notifier;
mod system_env;

pub use commands::{CliError, DrawOptions, OutputFormat};
pub use config::{ConfigError, ParticipantEntry, RosterFile};
pub use file_store::FileStore;
pub use notifier::{Delivered, LogNotifier};
pub use system_env::{SeededEnv, SystemEnv};
