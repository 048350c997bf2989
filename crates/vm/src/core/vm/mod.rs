//! Virtual Machine implementation for EVM execution.
//!
//! The [`Machine`] holds the entire interpreter state and is serializable, so execution can be
//! suspended after any step and resumed later from a checkpoint.

mod core;
mod execution;

/// Opcode handlers organized by category.
pub mod handlers;

pub use self::core::{Context, Machine};
pub use execution::{ExecutionResult, ExitStatus, HaltReason};
