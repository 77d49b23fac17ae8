//! Reference model for model-based testing.
//!
//! The model is a deliberately naive restatement of the session rules using
//! plain vectors and indices. It serves as the oracle against which
//! [`tinsel_core::AssignmentSession`] is checked.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Rules not mechanics: Captures which outcomes are legal, not how the
//!   random choice is made
//! - Deterministic: Same inputs produce same predictions

pub mod operation;
mod world;

pub use operation::{ModelId, Operation, OperationError, OperationResult};
pub use world::{ModelStatus, ModelWorld, ObservableState};
