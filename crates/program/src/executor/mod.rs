//! Running a transaction against shadow accounts: validation, gas escrow, the interpreter and
//! settlement.
//!
//! Gas is bought up front: `gas_limit × gas_price` leaves the sender when the transaction starts,
//! the part actually used is paid to operators as execution progresses, and the rest is
//! refunded when the transaction is settled.

use alloy::primitives::{Address, U256};
use shuttle_common::ether::transaction::RawTransaction;
use shuttle_config::Configuration;
use shuttle_vm::core::vm::{Context, ExitStatus, Machine};
use tracing::debug;

use crate::{
    account::{EtherAccount, TransactionInfo},
    error::{Error, Result},
};

pub mod accounts;
pub mod host;

pub use accounts::AccountsDb;
pub use host::{AccountSource, ExecutorHost};

/// Checks `tx` against the configuration and the sender's record before anything runs.
///
/// `allow_no_chain_id` admits pre-EIP-155 transactions.
pub fn validate(
    config: &Configuration,
    tx: &RawTransaction,
    sender: Option<&EtherAccount>,
    allow_no_chain_id: bool,
) -> Result<()> {
    match tx.chain_id {
        Some(chain_id) if chain_id == config.chain_id => {}
        None if allow_no_chain_id => {}
        other => return Err(Error::InvalidChainId(other)),
    }

    let nonce = sender.map_or(0, |account| account.nonce);
    if nonce != tx.nonce {
        return Err(Error::InvalidNonce { sender: tx.sender, expected: nonce, actual: tx.nonce });
    }

    let balance = sender.map_or(U256::ZERO, |account| account.balance);
    let required = tx.required_balance()?;
    if balance < required {
        return Err(Error::InsufficientFunds { sender: tx.sender, balance, required });
    }

    let intrinsic = tx.intrinsic_gas();
    if tx.gas_limit < intrinsic {
        return Err(Error::OutOfGas { gas_limit: tx.gas_limit, intrinsic });
    }
    Ok(())
}

/// A fresh interpreter for `tx`. Calls run the target's code; creations run the input.
pub fn new_machine<S: AccountSource + ?Sized>(tx: &RawTransaction, source: &S) -> Result<Machine> {
    let info = TransactionInfo::from(tx);
    let target = info.target();

    let (code, calldata) = if tx.is_create() {
        (tx.input.to_vec(), Vec::new())
    } else {
        (source.code(target)?.to_vec(), tx.input.to_vec())
    };

    Ok(Machine::new(
        Context {
            origin: tx.sender,
            caller: tx.sender,
            address: target,
            value: tx.value,
            gas_price: U256::from(tx.gas_price),
            gas_limit: tx.gas_limit,
            calldata,
        },
        &code,
        tx.intrinsic_gas(),
    ))
}

/// Takes `gas_limit × gas_price` from the sender.
pub fn buy_gas(accounts: &mut AccountsDb<'_>, tx: &TransactionInfo) -> Result<()> {
    let amount = tx.gas_in_tokens(tx.gas_limit)?;
    if amount.is_zero() {
        return Ok(());
    }

    let sender = accounts.get_mut(tx.caller)?;
    sender.balance = sender.balance.checked_sub(amount).ok_or(Error::InsufficientFunds {
        sender: tx.caller,
        balance: sender.balance,
        required: amount,
    })?;
    Ok(())
}

/// Pays `gas` worth of tokens from the bought gas to `operator_balance`.
pub fn pay_gas(
    accounts: &mut AccountsDb<'_>,
    tx: &TransactionInfo,
    operator_balance: Address,
    gas: u64,
) -> Result<()> {
    let amount = tx.gas_in_tokens(gas)?;
    if amount.is_zero() {
        return Ok(());
    }

    let account = accounts.get_mut(operator_balance)?;
    account.balance = account.balance.checked_add(amount).ok_or(Error::IntegerOverflow)?;
    Ok(())
}

/// Settles a finished transaction.
///
/// A successful `execution` moves the value, commits storage writes and deploys returned code.
/// Whatever the outcome, gas beyond `gas_used` is refunded and the sender's nonce is consumed.
pub fn settle(
    accounts: &mut AccountsDb<'_>,
    tx: &TransactionInfo,
    gas_used: u64,
    execution: Option<(&ExitStatus, &Machine)>,
) -> Result<()> {
    if let Some((status, machine)) = execution.filter(|(status, _)| status.is_success()) {
        let sender = accounts.get_mut(tx.caller)?;
        sender.balance = sender.balance.checked_sub(tx.value).ok_or(Error::InsufficientFunds {
            sender: tx.caller,
            balance: sender.balance,
            required: tx.value,
        })?;

        let target = accounts.get_mut(tx.target())?;
        target.balance = target.balance.checked_add(tx.value).ok_or(Error::IntegerOverflow)?;
        for (key, value) in &machine.storage.storage {
            target.set_storage(*key, *value);
        }
        if tx.to.is_none() {
            target.code = status.returndata().to_vec();
            target.nonce = 1;
            debug!("deployed {} bytes to {}", target.code.len(), target.address);
        }
    }

    let unused = tx.gas_in_tokens(tx.gas_limit.saturating_sub(gas_used))?;
    let sender = accounts.get_mut(tx.caller)?;
    sender.balance = sender.balance.checked_add(unused).ok_or(Error::IntegerOverflow)?;
    sender.nonce = sender.nonce.checked_add(1).ok_or(Error::IntegerOverflow)?;
    Ok(())
}
