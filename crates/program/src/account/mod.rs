//! Account layouts owned by the program.
//!
//! Every program account starts with a one byte tag naming its layout:
//! - [`TAG_HOLDER`]: a buffer for an oversized signed transaction, see [`holder`]
//! - [`TAG_STATE`]: a transaction bound for iterative execution, see [`state`]
//! - [`TAG_FINALIZED`]: a holder whose transaction completed or was cancelled
//! - [`TAG_ETHER`]: the shadow record of an Ethereum address, see [`ether`]

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::{Error, Result},
    ledger::{AccountInfo, InvokeContext, Pubkey},
};

pub mod ether;
pub mod holder;
pub mod operator;
pub mod state;
pub mod treasury;

pub use ether::{EtherAccount, Lock};
pub use holder::{Finalized, Holder};
pub use operator::Operator;
pub use state::{ListedAccount, StateAccount, TransactionInfo};
pub use treasury::{MainTreasury, Treasury};

/// An account without program data.
pub const TAG_EMPTY: u8 = 0;
/// A holder buffer.
pub const TAG_HOLDER: u8 = 1;
/// A bound, in-flight transaction.
pub const TAG_STATE: u8 = 2;
/// A holder whose transaction is finished.
pub const TAG_FINALIZED: u8 = 3;
/// A shadow Ethereum account.
pub const TAG_ETHER: u8 = 4;

/// The tag of a program account, [`TAG_EMPTY`] if it holds no data.
pub fn tag(program_id: &Pubkey, info: &AccountInfo) -> Result<u8> {
    validate_owner(program_id, info)?;
    Ok(info.try_borrow_data()?.first().copied().unwrap_or(TAG_EMPTY))
}

/// Fails unless `program_id` owns `info`.
pub(crate) fn validate_owner(program_id: &Pubkey, info: &AccountInfo) -> Result<()> {
    if info.owner() != *program_id {
        return Err(Error::InvalidAccountOwner(info.key));
    }
    Ok(())
}

/// Decodes the serde record stored after the tag byte.
pub(crate) fn read_record<T: DeserializeOwned>(
    program_id: &Pubkey,
    info: &AccountInfo,
    expected: u8,
) -> Result<T> {
    validate_owner(program_id, info)?;
    let data = info.try_borrow_data()?;
    match data.first() {
        Some(tag) if *tag == expected => Ok(bincode::deserialize(&data[1..])?),
        Some(tag) => Err(Error::InvalidTag(info.key, *tag)),
        None => Err(Error::InvalidTag(info.key, TAG_EMPTY)),
    }
}

/// Encodes `record` after `tag`, growing the account if it doesn't fit and zeroing whatever
/// stale bytes follow it.
///
/// Growth is paid by `payer` so that the account keeps its rent-exempt minimum plus `reserved`
/// lamports.
pub(crate) fn write_record<T: Serialize>(
    ctx: &mut InvokeContext,
    info: &AccountInfo,
    payer: &AccountInfo,
    tag: u8,
    record: &T,
    reserved: u64,
) -> Result<()> {
    let bytes = bincode::serialize(record)?;
    let required_len = bytes.len() + 1;

    if required_len > info.data_len() {
        info.realloc(required_len)?;
    }
    fund_rent(ctx, info, payer, reserved)?;

    let mut data = info.try_borrow_mut_data()?;
    data[0] = tag;
    data[1..required_len].copy_from_slice(&bytes);
    data[required_len..].fill(0);
    Ok(())
}

/// Tops `info` up from `payer` to its rent-exempt minimum plus `reserved`.
pub(crate) fn fund_rent(
    ctx: &mut InvokeContext,
    info: &AccountInfo,
    payer: &AccountInfo,
    reserved: u64,
) -> Result<()> {
    let required = ctx.rent().minimum_balance(info.data_len()).saturating_add(reserved);
    let missing = required.saturating_sub(info.lamports());
    if missing > 0 {
        ctx.transfer(payer, info, missing)?;
    }
    Ok(())
}

/// The serialized length of a record, tag included.
pub(crate) fn record_len<T: Serialize>(record: &T) -> Result<usize> {
    Ok(bincode::serialized_size(record)? as usize + 1)
}
