use std::collections::BTreeMap;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use super::super::log::Log;

/// Exit code recorded for a transaction that stopped.
pub const EXIT_STOP: u8 = 0x11;
/// Exit code recorded for a transaction that returned data.
pub const EXIT_RETURN: u8 = 0x12;
/// Exit code recorded for a transaction that reverted or halted.
pub const EXIT_REVERT: u8 = 0xd0;

/// Why the machine halted exceptionally.
///
/// Interpreter faults are raised as `eyre` reports wrapping a [`HaltReason`], and turned into an
/// [`ExitStatus::Halt`] by [`Machine::run`](super::Machine::run).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum HaltReason {
    /// The gas limit was reached.
    #[error("out of gas")]
    OutOfGas,
    /// An undefined opcode, or `INVALID`.
    #[error("invalid opcode {0:#04x}")]
    InvalidOpcode(u8),
    /// A jump to something other than a `JUMPDEST`.
    #[error("invalid jump destination {0}")]
    InvalidJump(U256),
    /// Too few items on the stack.
    #[error("stack underflow")]
    StackUnderflow,
    /// More than 1024 items on the stack.
    #[error("stack overflow")]
    StackOverflow,
    /// `RETURNDATACOPY` read past the end of the return data buffer.
    #[error("return data out of bounds")]
    ReturnDataOutOfBounds,
    /// A nested call, contract creation or self destruct.
    #[error("unsupported call opcode {0:#04x}")]
    UnsupportedCall(u8),
    /// Any other interpreter fault.
    #[error("{0}")]
    Internal(String),
}

/// How execution ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitStatus {
    /// `STOP`, or execution ran off the end of the code.
    Stop,
    /// `RETURN` with its output.
    Return(Vec<u8>),
    /// `REVERT` with its output.
    Revert(Vec<u8>),
    /// An exceptional halt. All gas is consumed.
    Halt(HaltReason),
}

impl ExitStatus {
    /// The exit code recorded in the ledger for this status.
    ///
    /// ```
    /// use shuttle_vm::core::vm::ExitStatus;
    ///
    /// assert_eq!(ExitStatus::Stop.code(), 0x11);
    /// assert_eq!(ExitStatus::Return(vec![]).code(), 0x12);
    /// assert_eq!(ExitStatus::Revert(vec![]).code(), 0xd0);
    /// ```
    pub fn code(&self) -> u8 {
        match self {
            ExitStatus::Stop => EXIT_STOP,
            ExitStatus::Return(_) => EXIT_RETURN,
            ExitStatus::Revert(_) | ExitStatus::Halt(_) => EXIT_REVERT,
        }
    }

    /// Returns `true` if the state changes of the execution should be committed.
    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Stop | ExitStatus::Return(_))
    }

    /// The data returned by `RETURN` or `REVERT`, empty otherwise.
    pub fn returndata(&self) -> &[u8] {
        match self {
            ExitStatus::Return(data) | ExitStatus::Revert(data) => data,
            ExitStatus::Stop | ExitStatus::Halt(_) => &[],
        }
    }
}

/// [`ExecutionResult`] is the result of a finished execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    /// How execution ended.
    pub exit_status: ExitStatus,

    /// The amount of gas consumed, including intrinsic gas.
    pub gas_used: u64,

    /// The amount of gas left after execution completes.
    pub gas_remaining: u64,

    /// The events (logs) emitted during execution.
    pub events: Vec<Log>,

    /// Storage writes to commit, empty unless execution succeeded.
    pub storage: BTreeMap<U256, U256>,

    /// The number of steps executed.
    pub steps: u64,
}
