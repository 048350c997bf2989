use shuttle_common::ether::transaction::RawTransaction;
use shuttle_config::Configuration;

use crate::{
    account::Holder,
    error::Result,
    instruction::{
        account_at,
        transaction_execute::{execute, ExecuteAccounts},
        Payload,
    },
    ledger::{AccountInfo, InvokeContext},
};

/// Runs the transaction buffered in a holder of the operator to completion. The holder is left
/// untouched.
pub fn process(
    ctx: &mut InvokeContext,
    config: &Configuration,
    accounts: &[AccountInfo],
    data: &[u8],
) -> Result<()> {
    let treasury_index = Payload::new(data).u32()?;

    let program_id = *ctx.program_id();
    let holder = Holder::from_account(&program_id, account_at(accounts, 0)?)?;
    let accounts =
        ExecuteAccounts::from_accounts(&program_id, config, treasury_index, &accounts[1..])?;
    holder.validate_owner(&accounts.operator.key)?;

    let tx = RawTransaction::decode(&holder.validate_transaction()?)?;
    execute(ctx, config, accounts, tx)
}
