//! Single-shot execution: the whole transaction runs inside one instruction and nothing is
//! checkpointed, so locks are checked but never taken.

use shuttle_common::ether::transaction::RawTransaction;
use shuttle_config::Configuration;
use tracing::info;

use crate::{
    account::{Operator, TransactionInfo, Treasury},
    error::{Error, Result},
    executor::{self, AccountsDb, ExecutorHost},
    instruction::{
        account_at, log_gas, log_return_value,
        transaction_step::{log_header, operator_balance_address, writable_keys},
    },
    ledger::{AccountInfo, InvokeContext, Pubkey},
    lock,
};

/// The accounts of the single-shot instructions: `operator, treasury, operator_balance,
/// listed...`.
#[derive(Debug)]
pub(crate) struct ExecuteAccounts<'a> {
    pub(crate) operator: Operator<'a>,
    pub(crate) treasury: Treasury<'a>,
    pub(crate) operator_balance: &'a AccountInfo,
    pub(crate) listed: &'a [AccountInfo],
}

impl<'a> ExecuteAccounts<'a> {
    pub(crate) fn from_accounts(
        program_id: &Pubkey,
        config: &Configuration,
        treasury_index: u32,
        accounts: &'a [AccountInfo],
    ) -> Result<Self> {
        Ok(Self {
            operator: Operator::from_account(account_at(accounts, 0)?)?,
            treasury: Treasury::from_account(
                program_id,
                config,
                treasury_index,
                account_at(accounts, 1)?,
            )?,
            operator_balance: account_at(accounts, 2)?,
            listed: &accounts[3..],
        })
    }
}

/// Validates `tx`, runs it to completion and settles it.
///
/// Fails with [`Error::StepLimitExceeded`] if it doesn't finish within the single-shot step
/// budget.
pub(crate) fn execute(
    ctx: &mut InvokeContext,
    config: &Configuration,
    accounts: ExecuteAccounts<'_>,
    tx: RawTransaction,
) -> Result<()> {
    let info = TransactionInfo::from(&tx);

    let mut db =
        AccountsDb::new(ctx.program_id(), accounts.listed, Some(accounts.operator_balance))?;
    let miner = operator_balance_address(&db, accounts.operator_balance)?;

    executor::validate(config, &tx, db.get(tx.sender)?, false)?;
    db.get(info.target())?;
    lock::check(&db, &writable_keys(&db, &info))?;

    executor::buy_gas(&mut db, &info)?;
    let mut machine = executor::new_machine(&tx, &db)?;
    let host = ExecutorHost::new(
        &db,
        info.caller,
        info.value,
        info.target(),
        info.value,
        config.chain_id,
        ctx.clock(),
    );
    machine.run(config.single_shot_step_limit, &host)?;
    let Some(status) = machine.exit_status().cloned() else {
        return Err(Error::StepLimitExceeded(config.single_shot_step_limit));
    };

    log_header(ctx, &info, miner);
    accounts.treasury.pay(ctx, accounts.operator.info(), config.payment_to_treasury)?;
    executor::pay_gas(&mut db, &info, miner, machine.gas_used)?;
    log_gas(ctx, machine.gas_used, machine.gas_used);

    executor::settle(&mut db, &info, machine.gas_used, Some((&status, &machine)))?;
    db.flush(ctx, accounts.operator.info())?;

    log_return_value(ctx, status.code());
    info!(
        "transaction {} executed in {} steps: exit_status={:#04X}, gas_used={}",
        info.hash,
        machine.steps,
        status.code(),
        machine.gas_used
    );
    Ok(())
}
