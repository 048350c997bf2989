//! Shuttle EVM Virtual Machine implementation
//!
//! This crate provides a resumable Ethereum Virtual Machine (EVM) interpreter. A [`Machine`]
//! executes a bounded number of steps per call against a [`Host`], and its entire state can be
//! serialized between calls, so one transaction may be spread across many ledger transactions.
//!
//! [`Machine`]: core::vm::Machine
//! [`Host`]: core::host::Host

/// Core VM implementation, including memory, stack, storage, and opcodes
pub mod core;

/// Errors surfaced by the host the VM runs against
pub mod error;
