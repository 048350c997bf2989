use shuttle_config::Configuration;
use tracing::debug;

use crate::{
    account::{Holder, Operator},
    error::{Error, Result},
    instruction::{account_at, Payload},
    ledger::{AccountInfo, InvokeContext},
};

/// Allocates a holder of `size` bytes at `create_with_seed(operator, seed, program)`.
pub fn process(
    ctx: &mut InvokeContext,
    _config: &Configuration,
    accounts: &[AccountInfo],
    data: &[u8],
) -> Result<()> {
    let mut payload = Payload::new(data);
    let size = usize::try_from(payload.u64()?).map_err(|_| Error::IntegerOverflow)?;
    let seed = std::str::from_utf8(payload.rest())
        .map_err(|e| Error::InvalidInstruction(format!("holder seed is not utf-8: {e}")))?;

    let holder = account_at(accounts, 0)?;
    let operator = Operator::from_account(account_at(accounts, 1)?)?;

    ctx.create_account_with_seed(operator.info(), holder, operator.info(), seed, size)?;
    Holder::init(holder, operator.key)?;

    debug!("created holder {} of {size} bytes for {}", holder.key, operator.key);
    Ok(())
}
