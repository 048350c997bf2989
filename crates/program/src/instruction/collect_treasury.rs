use shuttle_config::Configuration;
use tracing::debug;

use crate::{
    account::{MainTreasury, Treasury},
    error::Result,
    instruction::{account_at, Payload},
    ledger::{AccountInfo, InvokeContext},
};

/// Sweeps a treasury pool into the main treasury, keeping the pool rent-exempt.
pub fn process(
    ctx: &mut InvokeContext,
    config: &Configuration,
    accounts: &[AccountInfo],
    data: &[u8],
) -> Result<()> {
    let index = Payload::new(data).u32()?;

    let program_id = *ctx.program_id();
    let main = MainTreasury::from_account(&program_id, config, account_at(accounts, 0)?)?;
    let pool = Treasury::from_account(&program_id, config, index, account_at(accounts, 1)?)?;

    let amount = pool.sweep(ctx, config, &main)?;
    ctx.log_msg(format!("collected {amount} lamports from pool {}", pool.info().key));
    debug!("collected {amount} lamports from treasury pool {index}");
    Ok(())
}
