use alloy::primitives::{Address, Bytes, U256};

use crate::error::HostError;

/// Read access to the world state the machine executes against.
///
/// The machine never writes through the host. Storage writes, logs and the exit status stay in
/// the [`Machine`](super::vm::Machine) until its owner commits them.
pub trait Host {
    /// The balance of `address`, zero for an empty account.
    fn balance(&self, address: Address) -> Result<U256, HostError>;

    /// The deployed code of `address`, empty for an externally owned account.
    fn code(&self, address: Address) -> Result<Bytes, HostError>;

    /// The committed value of `key` in the storage of `address`.
    fn storage(&self, address: Address, key: U256) -> Result<U256, HostError>;

    /// The chain id reported by `CHAINID`.
    fn chain_id(&self) -> u64;

    /// The block number reported by `NUMBER`.
    fn block_number(&self) -> u64;

    /// The unix timestamp reported by `TIMESTAMP`.
    fn block_timestamp(&self) -> u64;
}
