//! The read-only emulate query: runs a transaction against a ledger snapshot to estimate its
//! gas and steps and to discover the accounts it touches. Nothing is locked or persisted.

use std::{cell::RefCell, collections::BTreeSet};

use alloy::primitives::{Address, Bytes, U256};
use derive_builder::Builder;
use shuttle_common::ether::transaction::RawTransaction;
use shuttle_config::Configuration;
use shuttle_vm::{core::vm::ExitStatus, error::HostError};
use tracing::debug;

use crate::{
    account::{EtherAccount, TransactionInfo},
    error::Result,
    executor::{self, AccountSource, ExecutorHost},
    ledger::{Ledger, Pubkey},
};

/// Arguments of [`emulate`].
#[derive(Debug, Clone, Builder)]
pub struct EmulateArgs {
    /// The signed transaction.
    pub transaction: Vec<u8>,

    /// Whether pre-EIP-155 transactions are accepted.
    pub allow_no_chain_id: bool,

    /// Steps to run at most, the single-shot budget if unset.
    pub step_limit: Option<u64>,
}

impl EmulateArgsBuilder {
    /// A builder with every optional argument at its default.
    pub fn new() -> Self {
        Self { transaction: Some(Vec::new()), allow_no_chain_id: Some(false), step_limit: Some(None) }
    }
}

/// An account the emulated transaction touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchedAccount {
    /// The Ethereum address.
    pub address: Address,
    /// The ledger key of its shadow account.
    pub key: Pubkey,
    /// Whether the transaction writes it.
    pub is_writable: bool,
}

/// The outcome of [`emulate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulateResult {
    /// How execution ended, `None` if it ran out of steps.
    pub exit_status: Option<ExitStatus>,
    /// Data returned by `RETURN` or `REVERT`.
    pub result: Vec<u8>,
    /// Gas used, intrinsic gas included.
    pub gas_used: u64,
    /// Steps executed.
    pub steps: u64,
    /// The accounts to list when submitting the transaction, in the order to pass them.
    pub accounts: Vec<TouchedAccount>,
}

#[derive(Debug)]
struct LedgerSnapshot<'a> {
    ledger: &'a Ledger,
    program_id: Pubkey,
    touched: RefCell<BTreeSet<Address>>,
}

impl LedgerSnapshot<'_> {
    fn account(&self, address: Address) -> std::result::Result<Option<EtherAccount>, HostError> {
        self.touched.borrow_mut().insert(address);

        let (key, _) = EtherAccount::key(&self.program_id, address);
        self.ledger
            .account(&key)
            .filter(|account| !account.is_empty_system())
            .map(|account| EtherAccount::from_ledger_account(&self.program_id, &key, account))
            .transpose()
            .map_err(|e| HostError::State(e.to_string()))
    }
}

impl AccountSource for LedgerSnapshot<'_> {
    fn balance(&self, address: Address) -> std::result::Result<U256, HostError> {
        Ok(self.account(address)?.map_or(U256::ZERO, |account| account.balance))
    }

    fn code(&self, address: Address) -> std::result::Result<Bytes, HostError> {
        Ok(self.account(address)?.map_or_else(Bytes::new, |account| Bytes::from(account.code)))
    }

    fn storage(&self, address: Address, key: U256) -> std::result::Result<U256, HostError> {
        Ok(self
            .account(address)?
            .and_then(|account| account.storage.get(&key).copied())
            .unwrap_or_default())
    }
}

/// Validates and runs `args.transaction` against the current state of `ledger`.
///
/// Any address can be read, so the result lists every account a real submission must pass.
pub fn emulate(
    ledger: &Ledger,
    program_id: &Pubkey,
    config: &Configuration,
    args: EmulateArgs,
) -> Result<EmulateResult> {
    let tx = RawTransaction::decode(&args.transaction)?;
    let info = TransactionInfo::from(&tx);
    let snapshot =
        LedgerSnapshot { ledger, program_id: *program_id, touched: RefCell::new(BTreeSet::new()) };

    let sender = snapshot.account(tx.sender)?;
    executor::validate(config, &tx, sender.as_ref(), args.allow_no_chain_id)?;

    let mut machine = executor::new_machine(&tx, &snapshot)?;
    let host = ExecutorHost::new(
        &snapshot,
        info.caller,
        tx.required_balance()?,
        info.target(),
        info.value,
        config.chain_id,
        ledger.clock(),
    );
    let steps = machine.run(args.step_limit.unwrap_or(config.single_shot_step_limit), &host)?;
    debug!("emulated {} in {steps} steps, {} gas", info.hash, machine.gas_used);

    let writable = [info.caller, info.target()];
    let mut touched = snapshot.touched.into_inner();
    touched.extend(machine.address_access_set.iter().copied());
    touched.extend(writable);

    // writable accounts first, then the rest by address
    let mut accounts: Vec<TouchedAccount> = touched
        .into_iter()
        .map(|address| TouchedAccount {
            address,
            key: EtherAccount::key(program_id, address).0,
            is_writable: writable.contains(&address),
        })
        .collect();
    accounts.sort_by_key(|account| (!account.is_writable, account.address));

    let exit_status = machine.exit_status().cloned();
    Ok(EmulateResult {
        result: exit_status.as_ref().map(|status| status.returndata().to_vec()).unwrap_or_default(),
        exit_status,
        gas_used: machine.gas_used,
        steps,
        accounts,
    })
}
