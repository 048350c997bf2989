use shuttle_common::ether::transaction::RawTransaction;
use shuttle_config::Configuration;

use crate::{
    account::{tag, Finalized, Holder, StateAccount, TAG_FINALIZED, TAG_HOLDER, TAG_STATE},
    error::{Error, Result},
    instruction::{
        transaction_step::{do_begin, do_continue, StepAccounts},
        Payload,
    },
    ledger::{AccountInfo, InvokeContext},
};

/// Binds or continues a transaction carried in the instruction.
///
/// The storage account is a holder of the operator. A finalized storage account whose last
/// transaction differs from this one is bound again.
pub fn process(
    ctx: &mut InvokeContext,
    config: &Configuration,
    accounts: &[AccountInfo],
    data: &[u8],
) -> Result<()> {
    let mut payload = Payload::new(data);
    let treasury_index = payload.u32()?;
    let step_count = u64::from(payload.u32()?);
    let tx = RawTransaction::decode(payload.rest())?;

    let program_id = *ctx.program_id();
    let accounts = StepAccounts::from_accounts(&program_id, config, treasury_index, accounts)?;

    match tag(&program_id, accounts.storage)? {
        TAG_HOLDER => {
            let holder = Holder::from_account(&program_id, accounts.storage)?;
            holder.validate_owner(&accounts.operator.key)?;
            let owner = holder.owner;
            do_begin(ctx, config, accounts, owner, tx, step_count, false)
        }
        TAG_STATE => {
            let state = StateAccount::from_account(&program_id, accounts.storage)?;
            state.validate_hash(&tx.hash)?;
            do_continue(ctx, config, accounts, state, step_count)
        }
        TAG_FINALIZED => {
            let finalized = Finalized::from_account(&program_id, accounts.storage)?;
            if finalized.transaction_hash == tx.hash {
                return Err(Error::AlreadyFinalized(tx.hash));
            }
            let holder = Holder::from_account_for_write(&program_id, accounts.storage)?;
            holder.validate_owner(&accounts.operator.key)?;
            let owner = holder.owner;
            do_begin(ctx, config, accounts, owner, tx, step_count, false)
        }
        other => Err(Error::InvalidTag(accounts.storage.key, other)),
    }
}
