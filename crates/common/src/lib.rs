//! Common utilities, constants, and resources used across the shuttle codebase.
//!
//! This crate provides shared functionality for the shuttle workspace, including
//! signed-transaction decoding and general utility functions.

/// Constants used throughout the shuttle codebase.
pub mod constants;

/// Error types for the common module.
pub mod error;

/// Utilities for working with Ethereum transactions.
pub mod ether;

/// General utility functions and types for common tasks.
pub mod utils;
