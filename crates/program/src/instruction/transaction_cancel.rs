use alloy::primitives::B256;
use shuttle_config::Configuration;
use tracing::info;

use crate::{
    account::{tag, Finalized, Operator, StateAccount, TAG_FINALIZED, TAG_STATE},
    error::{Error, Result},
    executor::{self, AccountsDb},
    instruction::{
        account_at, log_gas,
        transaction_step::{authorize_operator, finalize_storage, log_header, operator_balance_address},
        Payload,
    },
    ledger::{AccountInfo, InvokeContext},
    lock,
};

/// Aborts a bound transaction: the gas used so far is paid, the rest refunded, the sender's
/// nonce consumed, the locks released and the deposit returned. Execution results are dropped.
pub fn process(
    ctx: &mut InvokeContext,
    config: &Configuration,
    accounts: &[AccountInfo],
    data: &[u8],
) -> Result<()> {
    let transaction_hash = B256::from(Payload::new(data).array::<32>()?);

    let storage = account_at(accounts, 0)?;
    let operator = Operator::from_account(account_at(accounts, 1)?)?;
    let operator_balance = account_at(accounts, 2)?;
    let listed = &accounts[3..];

    let mut state = match tag(ctx.program_id(), storage)? {
        TAG_STATE => StateAccount::from_account(ctx.program_id(), storage)?,
        TAG_FINALIZED => {
            let finalized = Finalized::from_account(ctx.program_id(), storage)?;
            return Err(Error::AlreadyFinalized(finalized.transaction_hash));
        }
        other => return Err(Error::InvalidTag(storage.key, other)),
    };
    state.validate_hash(&transaction_hash)?;
    authorize_operator(config, &mut state, &operator.key, ctx.clock().slot)?;

    let mut db = AccountsDb::new(ctx.program_id(), listed, Some(operator_balance))?;
    let miner = operator_balance_address(&db, operator_balance)?;
    lock::verify_for_release(&db, &state.accounts)?;

    log_header(ctx, &state.transaction, miner);
    let increment = state.machine.gas_used.saturating_sub(state.gas_used);
    executor::pay_gas(&mut db, &state.transaction, miner, increment)?;
    state.gas_used = state.machine.gas_used;
    log_gas(ctx, increment, state.gas_used);

    executor::settle(&mut db, &state.transaction, state.gas_used, None)?;
    lock::release(&mut db, &state.accounts)?;
    db.flush(ctx, operator.info())?;
    finalize_storage(ctx, storage, operator.info(), &state)?;

    info!("transaction {} cancelled after {} steps", transaction_hash, state.machine.steps);
    Ok(())
}
