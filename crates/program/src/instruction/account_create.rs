use alloy::primitives::Address;
use shuttle_config::Configuration;
use tracing::debug;

use crate::{
    account::{EtherAccount, Operator},
    error::Result,
    instruction::{account_at, Payload},
    ledger::{AccountInfo, InvokeContext},
};

/// Creates the empty shadow account of an Ethereum address, with rent paid by the operator.
pub fn process(
    ctx: &mut InvokeContext,
    _config: &Configuration,
    accounts: &[AccountInfo],
    data: &[u8],
) -> Result<()> {
    let address = Address::from(Payload::new(data).array::<20>()?);

    let operator = Operator::from_account(account_at(accounts, 0)?)?;
    let shadow = account_at(accounts, 1)?;

    EtherAccount::new(address).create(ctx, shadow, operator.info())?;
    debug!("created shadow account {} for {address}", shadow.key);
    Ok(())
}
