//! Binding and continuing iterative transactions. Every step entry point funnels into
//! [`do_begin`] or [`do_continue`].

use alloy::primitives::Address;
use shuttle_common::ether::transaction::RawTransaction;
use shuttle_config::Configuration;
use tracing::{debug, info};

use crate::{
    account::{Finalized, Lock, Operator, StateAccount, TransactionInfo, Treasury},
    error::{Error, Result},
    executor::{self, AccountsDb, ExecutorHost},
    instruction::{account_at, log_gas, log_return_value},
    ledger::{AccountInfo, InvokeContext, Pubkey},
    lock,
};

/// The accounts shared by the step instructions:
/// `storage, operator, treasury, operator_balance, listed...`.
#[derive(Debug)]
pub(crate) struct StepAccounts<'a> {
    pub(crate) storage: &'a AccountInfo,
    pub(crate) operator: Operator<'a>,
    pub(crate) treasury: Treasury<'a>,
    pub(crate) operator_balance: &'a AccountInfo,
    pub(crate) listed: &'a [AccountInfo],
}

impl<'a> StepAccounts<'a> {
    pub(crate) fn from_accounts(
        program_id: &Pubkey,
        config: &Configuration,
        treasury_index: u32,
        accounts: &'a [AccountInfo],
    ) -> Result<Self> {
        let storage = account_at(accounts, 0)?;
        if !storage.is_writable {
            return Err(Error::AccountNotWritable(storage.key));
        }

        Ok(Self {
            storage,
            operator: Operator::from_account(account_at(accounts, 1)?)?,
            treasury: Treasury::from_account(
                program_id,
                config,
                treasury_index,
                account_at(accounts, 2)?,
            )?,
            operator_balance: account_at(accounts, 3)?,
            listed: &accounts[4..],
        })
    }
}

/// Resolves the address gas is paid to. The account must exist and, unless the transaction
/// lists it, must not be locked by another transaction.
pub(crate) fn operator_balance_address(
    accounts: &AccountsDb<'_>,
    info: &AccountInfo,
) -> Result<Address> {
    let account = accounts.get_by_key(&info.key).ok_or(Error::InvalidAccountOwner(info.key))?;
    if !accounts.is_listed(&info.key) && account.lock != Lock::Free {
        return Err(Error::LockedAccount(info.key));
    }
    Ok(account.address)
}

/// Fails unless `operator` may work on `state`. The bound operator always may; anyone else
/// takes the transaction over once the bound operator has been idle for the priority window.
pub(crate) fn authorize_operator(
    config: &Configuration,
    state: &mut StateAccount,
    operator: &Pubkey,
    slot: u64,
) -> Result<()> {
    if *operator != state.operator {
        if slot.saturating_sub(state.slot) <= config.operator_priority_slots {
            return Err(Error::NotAuthorizedOperator { operator: *operator, bound: state.operator });
        }
        debug!("operator {operator} takes over from {} at slot {slot}", state.operator);
        state.operator = *operator;
    }
    state.slot = slot;
    Ok(())
}

fn check_step_count(config: &Configuration, tx: &TransactionInfo, step_count: u64) -> Result<()> {
    if tx.gas_price > 0 && step_count < config.evm_steps_min {
        return Err(Error::StepLimitBelowMinimum(step_count, config.evm_steps_min));
    }
    Ok(())
}

/// The shadow keys a transaction writes: its sender and its target.
pub(crate) fn writable_keys(accounts: &AccountsDb<'_>, tx: &TransactionInfo) -> Vec<Pubkey> {
    vec![accounts.key(tx.caller), accounts.key(tx.target())]
}

pub(crate) fn log_header(ctx: &mut InvokeContext, tx: &TransactionInfo, miner: Address) {
    ctx.log_data(&[b"HASH", tx.hash.as_slice()]);
    ctx.log_data(&[b"MINER", miner.as_slice()]);
}

/// Binds `tx` to the storage account: validates it, locks the listed accounts, buys the gas,
/// escrows the deposit and persists a fresh checkpoint. No step runs yet.
pub(crate) fn do_begin(
    ctx: &mut InvokeContext,
    config: &Configuration,
    accounts: StepAccounts<'_>,
    owner: Pubkey,
    tx: RawTransaction,
    step_count: u64,
    allow_no_chain_id: bool,
) -> Result<()> {
    let info = TransactionInfo::from(&tx);
    check_step_count(config, &info, step_count)?;

    let mut db =
        AccountsDb::new(ctx.program_id(), accounts.listed, Some(accounts.operator_balance))?;
    let miner = operator_balance_address(&db, accounts.operator_balance)?;

    executor::validate(config, &tx, db.get(tx.sender)?, allow_no_chain_id)?;
    db.get(info.target())?;

    let writable = writable_keys(&db, &info);
    let listed = lock::acquire(&mut db, &writable)?;
    executor::buy_gas(&mut db, &info)?;
    let machine = executor::new_machine(&tx, &db)?;

    log_header(ctx, &info, miner);
    accounts.treasury.pay(ctx, accounts.operator.info(), config.payment_to_treasury)?;
    ctx.transfer(accounts.operator.info(), accounts.storage, config.payment_to_deposit)?;

    let state = StateAccount {
        owner,
        transaction: info,
        gas_used: 0,
        deposit: config.payment_to_deposit,
        operator: accounts.operator.key,
        slot: ctx.clock().slot,
        accounts: listed,
        machine,
    };

    db.flush(ctx, accounts.operator.info())?;
    state.save(ctx, accounts.storage, accounts.operator.info())?;
    debug!(
        "bound transaction {} to {} with {} listed accounts",
        state.transaction.hash,
        accounts.storage.key,
        state.accounts.len()
    );
    Ok(())
}

/// Runs up to `step_count` steps of a bound transaction and either checkpoints it or, if it
/// finished, settles and finalizes it.
pub(crate) fn do_continue(
    ctx: &mut InvokeContext,
    config: &Configuration,
    accounts: StepAccounts<'_>,
    mut state: StateAccount,
    step_count: u64,
) -> Result<()> {
    check_step_count(config, &state.transaction, step_count)?;
    authorize_operator(config, &mut state, &accounts.operator.key, ctx.clock().slot)?;

    let mut db =
        AccountsDb::new(ctx.program_id(), accounts.listed, Some(accounts.operator_balance))?;
    let miner = operator_balance_address(&db, accounts.operator_balance)?;
    lock::verify(&db, &state.accounts)?;

    let tx = &state.transaction;
    let host = ExecutorHost::new(
        &db,
        tx.caller,
        tx.value,
        tx.target(),
        tx.value,
        config.chain_id,
        ctx.clock(),
    );
    let steps = state.machine.run(step_count, &host)?;
    debug!("transaction {} ran {steps} steps ({} total)", tx.hash, state.machine.steps);

    log_header(ctx, &state.transaction, miner);
    if steps > 0 {
        accounts.treasury.pay(ctx, accounts.operator.info(), config.payment_to_treasury)?;
    }

    let increment = state.machine.gas_used.saturating_sub(state.gas_used);
    executor::pay_gas(&mut db, &state.transaction, miner, increment)?;
    state.gas_used = state.machine.gas_used;
    log_gas(ctx, increment, state.gas_used);

    let Some(status) = state.machine.exit_status().cloned() else {
        db.flush(ctx, accounts.operator.info())?;
        return state.save(ctx, accounts.storage, accounts.operator.info());
    };

    executor::settle(
        &mut db,
        &state.transaction,
        state.gas_used,
        Some((&status, &state.machine)),
    )?;
    lock::release(&mut db, &state.accounts)?;
    db.flush(ctx, accounts.operator.info())?;
    finalize_storage(ctx, accounts.storage, accounts.operator.info(), &state)?;

    log_return_value(ctx, status.code());
    info!(
        "transaction {} finished: exit_status={:#04X}, gas_used={}",
        state.transaction.hash,
        status.code(),
        state.gas_used
    );
    Ok(())
}

/// Returns the deposit to `operator` and marks the storage account finalized.
pub(crate) fn finalize_storage(
    ctx: &InvokeContext,
    storage: &AccountInfo,
    operator: &AccountInfo,
    state: &StateAccount,
) -> Result<()> {
    storage.transfer_lamports(operator, state.deposit)?;
    Finalized::write(
        ctx.program_id(),
        storage,
        Finalized { owner: state.owner, transaction_hash: state.transaction.hash },
    )
}
