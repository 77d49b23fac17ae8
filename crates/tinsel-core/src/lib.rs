//! Tinsel core: constrained random assignment for gift exchanges.
//!
//! Every participant draws exactly one recipient from the same group. Nobody
//! draws themselves, nobody is drawn twice, and declared forbidden pairs (for
//! example partners) are respected whenever the remaining pool allows it.
//!
//! Picks happen one at a time, in whatever order the caller chooses, rather
//! than as one global matching.
//!
//! # Architecture
//!
//! ```text
//! tinsel-core
//!   ├─ ParticipantRegistry  (caller-owned roster + forbidden pairs)
//!   ├─ Roster               (frozen snapshot owned by a session)
//!   ├─ eligibility          (strict / relaxed candidate pools)
//!   ├─ SelectionEngine      (one random pick, relaxation policy)
//!   ├─ AssignmentSession    (Open -> Completed | Infeasible, reset)
//!   ├─ Ledger               (pick history + export formats)
//!   ├─ feasibility          (advisory pre-flight matching)
//!   └─ Exchange             (action-based driver: notify, persist)
//! ```
//!
//! Time and randomness come from an [`Environment`], so a seeded environment
//! replays the exact same draw.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod constraint;
pub mod env;
mod error;
pub mod exchange;
pub mod feasibility;
pub mod ledger;
pub mod notify;
pub mod participant;
pub mod selection;
pub mod session;
pub mod state;
pub mod store;

pub use constraint::{EligibilitySet, eligibility};
pub use env::Environment;
pub use error::{RegistryError, SessionError};
pub use exchange::{Exchange, ExchangeAction, ExchangeConfig, ExecutionReport, LogLevel, execute};
pub use feasibility::Feasibility;
pub use ledger::{
    AssignmentRecord, ExportError, InterchangeDocument, InterchangeEntry, Ledger, ParticipantRef,
};
pub use notify::{DeliveryError, MessageContext, MessageTemplate, Notifier, UnknownTemplate};
pub use participant::{Participant, ParticipantId, ParticipantRegistry, Roster};
pub use selection::SelectionEngine;
pub use session::{AssignmentSession, Progress, SessionStatus, SharedSession};
pub use state::{AssignmentState, SlotState};
pub use store::{ExchangeId, ExchangeSnapshot, ExchangeStore, MemoryStore, StoreError};
