//! The shuttle EVM program.
//!
//! One Ethereum transaction may need far more compute than a single ledger transaction allows.
//! This crate splits it across many: the transaction is bound to a storage account, executed a
//! bounded number of steps per call against shadow accounts it has locked, and finalized when it
//! completes or is cancelled. Fees go to round-robin treasury pools, and a read-only
//! [`emulate`](emulate::emulate) query estimates gas and discovers the accounts to list.
//!
//! The [`ledger`] module is an in-memory account ledger providing the primitives the program runs
//! on; [`processor::Processor`] is the program itself.

/// Account layouts owned by the program
pub mod account;

/// Instruction builders for operators
pub mod client;

/// The read-only emulate query
pub mod emulate;

/// Error types for the program
pub mod error;

/// Transaction validation, gas accounting and settlement
pub mod executor;

/// Instruction tags and handlers
pub mod instruction;

/// The in-memory account ledger
pub mod ledger;

/// Shadow account locking
pub mod lock;

/// The program entrypoint
pub mod processor;
