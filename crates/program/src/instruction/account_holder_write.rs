use alloy::primitives::B256;
use shuttle_config::Configuration;
use tracing::trace;

use crate::{
    account::Holder,
    error::{Error, Result},
    instruction::{account_at, Payload},
    ledger::{AccountInfo, InvokeContext},
};

/// Writes a chunk of a signed transaction into a holder.
///
/// A chunk under a different hash than the buffered one starts a new transaction, so a
/// finalized holder is reused simply by writing to it.
pub fn process(
    ctx: &mut InvokeContext,
    _config: &Configuration,
    accounts: &[AccountInfo],
    data: &[u8],
) -> Result<()> {
    let mut payload = Payload::new(data);
    let transaction_hash = B256::from(payload.array::<32>()?);
    let offset = payload.u64()?;
    let len = usize::try_from(payload.u64()?).map_err(|_| Error::IntegerOverflow)?;
    let bytes = payload.bytes(len)?;

    let info = account_at(accounts, 0)?;
    let operator = account_at(accounts, 1)?;
    if !operator.is_signer {
        return Err(Error::AccountNotSigner(operator.key));
    }

    let mut holder = Holder::from_account_for_write(ctx.program_id(), info)?;
    holder.validate_owner(&operator.key)?;
    holder.update_hash(transaction_hash)?;
    holder.write(offset, bytes)?;

    trace!("wrote {len} bytes at {offset} into holder {}", info.key);
    Ok(())
}
