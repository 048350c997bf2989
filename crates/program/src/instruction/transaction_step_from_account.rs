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

/// Binds the transaction buffered in the storage holder, or continues it once bound.
///
/// The buffer is checked against its hash once, when the transaction is bound.
pub fn process(
    ctx: &mut InvokeContext,
    config: &Configuration,
    accounts: &[AccountInfo],
    data: &[u8],
    allow_no_chain_id: bool,
) -> Result<()> {
    let mut payload = Payload::new(data);
    let treasury_index = payload.u32()?;
    let step_count = u64::from(payload.u32()?);

    let program_id = *ctx.program_id();
    let accounts = StepAccounts::from_accounts(&program_id, config, treasury_index, accounts)?;

    match tag(&program_id, accounts.storage)? {
        TAG_HOLDER => {
            let holder = Holder::from_account(&program_id, accounts.storage)?;
            holder.validate_owner(&accounts.operator.key)?;
            let tx = RawTransaction::decode(&holder.validate_transaction()?)?;
            let owner = holder.owner;
            do_begin(ctx, config, accounts, owner, tx, step_count, allow_no_chain_id)
        }
        TAG_STATE => {
            let state = StateAccount::from_account(&program_id, accounts.storage)?;
            do_continue(ctx, config, accounts, state, step_count)
        }
        TAG_FINALIZED => {
            let finalized = Finalized::from_account(&program_id, accounts.storage)?;
            Err(Error::AlreadyFinalized(finalized.transaction_hash))
        }
        other => Err(Error::InvalidTag(accounts.storage.key, other)),
    }
}
