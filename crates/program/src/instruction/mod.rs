//! Program instructions. The first byte of the instruction data is the tag; integers in the
//! payload are little-endian.

use std::fmt;

use crate::{
    error::{Error, Result},
    ledger::{AccountInfo, InvokeContext},
};

pub mod account_create;
pub mod account_holder_create;
pub mod account_holder_delete;
pub mod account_holder_write;
pub mod collect_treasury;
pub mod transaction_cancel;
pub mod transaction_execute;
pub mod transaction_execute_from_account;
pub mod transaction_execute_from_instruction;
pub mod transaction_step;
pub mod transaction_step_from_account;
pub mod transaction_step_from_instruction;

/// Instruction tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EvmInstruction {
    /// Sweep a treasury pool into the main treasury.
    ///
    /// Accounts: `main_treasury (w)`, `treasury (w)`. Payload: `index u32`.
    CollectTreasury = 0x1e,
    /// Allocate a holder at `create_with_seed(operator, seed, program)`.
    ///
    /// Accounts: `holder (w)`, `operator (s, w)`. Payload: `size u64`, `seed utf8`.
    HolderCreate = 0x24,
    /// Close a holder and refund its rent to the owner.
    ///
    /// Accounts: `holder (w)`, `operator (s, w)`.
    HolderDelete = 0x25,
    /// Write a chunk of a signed transaction into a holder.
    ///
    /// Accounts: `holder (w)`, `operator (s)`.
    /// Payload: `hash [32]`, `offset u64`, `len u64`, `data [len]`.
    HolderWrite = 0x26,
    /// Create the shadow account of an Ethereum address.
    ///
    /// Accounts: `operator (s, w)`, `shadow (w)`. Payload: `address [20]`.
    CreateAccount = 0x28,
    /// Run a transaction to completion in one instruction.
    ///
    /// Accounts: `operator (s, w)`, `treasury (w)`, `operator_balance (w)`, `listed (w)...`.
    /// Payload: `treasury index u32`, `transaction`.
    ExecuteFromInstruction = 0x32,
    /// Run a transaction buffered in a holder to completion in one instruction.
    ///
    /// Accounts: `holder`, `operator (s, w)`, `treasury (w)`, `operator_balance (w)`,
    /// `listed (w)...`. Payload: `treasury index u32`.
    ExecuteFromAccount = 0x33,
    /// Bind or continue an iterative transaction passed inline.
    ///
    /// Accounts: `storage (w)`, `operator (s, w)`, `treasury (w)`, `operator_balance (w)`,
    /// `listed (w)...`. Payload: `treasury index u32`, `step count u32`, `transaction`.
    StepFromInstruction = 0x34,
    /// Bind or continue an iterative transaction buffered in the storage holder.
    ///
    /// Accounts: as [`EvmInstruction::StepFromInstruction`]. Payload: `treasury index u32`,
    /// `step count u32`.
    StepFromAccount = 0x35,
    /// [`EvmInstruction::StepFromAccount`] that also accepts pre-EIP-155 transactions.
    StepFromAccountNoChainId = 0x36,
    /// Abort an in-flight iterative transaction.
    ///
    /// Accounts: `storage (w)`, `operator (s, w)`, `operator_balance (w)`, `listed (w)...`.
    /// Payload: `transaction hash [32]`.
    Cancel = 0x37,
}

impl EvmInstruction {
    /// The human-readable instruction name.
    pub fn name(self) -> &'static str {
        match self {
            EvmInstruction::CollectTreasury => "Collect Treasury",
            EvmInstruction::HolderCreate => "Create Holder Account",
            EvmInstruction::HolderDelete => "Delete Holder Account",
            EvmInstruction::HolderWrite => "Write To Holder",
            EvmInstruction::CreateAccount => "Create Account",
            EvmInstruction::ExecuteFromInstruction => "Execute Transaction from Instruction",
            EvmInstruction::ExecuteFromAccount => "Execute Transaction from Account",
            EvmInstruction::StepFromInstruction => "Begin or Continue Transaction from Instruction",
            EvmInstruction::StepFromAccount => "Begin or Continue Transaction from Account",
            EvmInstruction::StepFromAccountNoChainId => {
                "Begin or Continue Transaction from Account Without ChainId"
            }
            EvmInstruction::Cancel => "Cancel Transaction",
        }
    }
}

impl TryFrom<u8> for EvmInstruction {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        Ok(match tag {
            0x1e => EvmInstruction::CollectTreasury,
            0x24 => EvmInstruction::HolderCreate,
            0x25 => EvmInstruction::HolderDelete,
            0x26 => EvmInstruction::HolderWrite,
            0x28 => EvmInstruction::CreateAccount,
            0x32 => EvmInstruction::ExecuteFromInstruction,
            0x33 => EvmInstruction::ExecuteFromAccount,
            0x34 => EvmInstruction::StepFromInstruction,
            0x35 => EvmInstruction::StepFromAccount,
            0x36 => EvmInstruction::StepFromAccountNoChainId,
            0x37 => EvmInstruction::Cancel,
            other => return Err(Error::InvalidInstruction(format!("unknown tag {other:#04x}"))),
        })
    }
}

impl fmt::Display for EvmInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A cursor over an instruction payload.
#[derive(Debug)]
pub(crate) struct Payload<'a> {
    data: &'a [u8],
}

impl<'a> Payload<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.data.len() < len {
            return Err(Error::InvalidInstruction(format!(
                "payload too short: {len} bytes needed, {} left",
                self.data.len()
            )));
        }
        let (head, tail) = self.data.split_at(len);
        self.data = tail;
        Ok(head)
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.bytes(N)?);
        Ok(array)
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_le_bytes)
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        self.array().map(u64::from_le_bytes)
    }

    pub(crate) fn rest(self) -> &'a [u8] {
        self.data
    }
}

/// The account at `index`, or [`Error::NotEnoughAccounts`].
pub(crate) fn account_at(accounts: &[AccountInfo], index: usize) -> Result<&AccountInfo> {
    accounts.get(index).ok_or(Error::NotEnoughAccounts(index + 1, accounts.len()))
}

/// Records the exit code of a finished transaction.
pub(crate) fn log_return_value(ctx: &mut InvokeContext, code: u8) {
    ctx.log_msg(format!("exit_status={code:#04X}"));
    ctx.log_data(&[b"RETURN", &[code]]);
}

/// Records the gas used by this call and in total.
pub(crate) fn log_gas(ctx: &mut InvokeContext, used: u64, total: u64) {
    ctx.log_data(&[b"GAS", &used.to_le_bytes(), &total.to_le_bytes()]);
}
