//! Deterministic simulation harness for the tinsel assignment engine.
//!
//! Provides a seeded [`Environment`](tinsel_core::Environment) implementation
//! so that every draw in a test can be replayed from its seed.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and the real session,
//! and their observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;

pub use model::{
    ModelId, ModelStatus, ModelWorld, ObservableState, Operation, OperationError, OperationResult,
};
pub use sim_env::SimEnv;
