use alloy::primitives::U256;
use eyre::Result;

use crate::core::host::Host;

use super::super::core::Machine;

/// BLOCKHASH - Get the hash of one of the recent blocks. Always zero here.
pub fn blockhash(vm: &mut Machine) -> Result<()> {
    vm.stack.pop()?;
    vm.stack.push(U256::ZERO)
}

/// NUMBER - Get the block number
pub fn number<H: Host + ?Sized>(vm: &mut Machine, host: &H) -> Result<()> {
    vm.stack.push(U256::from(host.block_number()))
}

/// TIMESTAMP - Get the block's timestamp
pub fn timestamp<H: Host + ?Sized>(vm: &mut Machine, host: &H) -> Result<()> {
    vm.stack.push(U256::from(host.block_timestamp()))
}

/// GASLIMIT - Get the gas limit. Reports the transaction's own limit.
pub fn gaslimit(vm: &mut Machine) -> Result<()> {
    vm.stack.push(U256::from(vm.gas_limit))
}

/// CHAINID - Get the chain ID
pub fn chainid<H: Host + ?Sized>(vm: &mut Machine, host: &H) -> Result<()> {
    vm.stack.push(U256::from(host.chain_id()))
}

/// SELFBALANCE - Get balance of currently executing account
pub fn selfbalance<H: Host + ?Sized>(vm: &mut Machine, host: &H) -> Result<()> {
    let balance = host.balance(vm.address)?;
    vm.stack.push(balance)
}

/// BLOBHASH - Get a versioned blob hash. There are no blobs, so always zero.
pub fn blobhash(vm: &mut Machine) -> Result<()> {
    vm.stack.pop()?;
    vm.stack.push(U256::ZERO)
}

/// COINBASE, PREVRANDAO, BASEFEE, BLOBBASEFEE - Block information with no ledger counterpart
pub fn block_info_stub(vm: &mut Machine) -> Result<()> {
    vm.stack.push(U256::ZERO)
}
