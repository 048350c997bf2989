use shuttle_common::ether::transaction::RawTransaction;
use shuttle_config::Configuration;

use crate::{
    error::Result,
    instruction::{
        transaction_execute::{execute, ExecuteAccounts},
        Payload,
    },
    ledger::{AccountInfo, InvokeContext},
};

/// Runs a transaction carried in the instruction to completion.
pub fn process(
    ctx: &mut InvokeContext,
    config: &Configuration,
    accounts: &[AccountInfo],
    data: &[u8],
) -> Result<()> {
    let mut payload = Payload::new(data);
    let treasury_index = payload.u32()?;
    let tx = RawTransaction::decode(payload.rest())?;

    let program_id = *ctx.program_id();
    let accounts = ExecuteAccounts::from_accounts(&program_id, config, treasury_index, accounts)?;
    execute(ctx, config, accounts, tx)
}
