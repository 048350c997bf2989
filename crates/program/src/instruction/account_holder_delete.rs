use shuttle_config::Configuration;
use tracing::debug;

use crate::{
    account::{tag, Finalized, Holder, Operator, TAG_FINALIZED, TAG_HOLDER},
    error::{Error, Result},
    instruction::account_at,
    ledger::{AccountInfo, InvokeContext},
};

/// Closes a holder that is not bound to a transaction. Its rent goes back to the owner and the
/// emptied account is purged.
pub fn process(
    ctx: &mut InvokeContext,
    _config: &Configuration,
    accounts: &[AccountInfo],
    _data: &[u8],
) -> Result<()> {
    let info = account_at(accounts, 0)?;
    let operator = Operator::from_account(account_at(accounts, 1)?)?;

    match tag(ctx.program_id(), info)? {
        TAG_HOLDER => Holder::from_account(ctx.program_id(), info)?.validate_owner(&operator.key)?,
        TAG_FINALIZED => {
            let finalized = Finalized::from_account(ctx.program_id(), info)?;
            if finalized.owner != operator.key {
                return Err(Error::HolderInvalidOwner {
                    holder: info.key,
                    owner: finalized.owner,
                    signer: operator.key,
                });
            }
        }
        other => return Err(Error::InvalidTag(info.key, other)),
    }

    let lamports = info.lamports();
    info.transfer_lamports(operator.info(), lamports)?;
    info.realloc(0)?;

    debug!("deleted holder {}, refunded {lamports} lamports", info.key);
    Ok(())
}
