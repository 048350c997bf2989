use alloy::primitives::{Address, Bytes, U256};
use shuttle_vm::{core::host::Host, error::HostError};

use crate::ledger::Clock;

/// Read access to shadow account records.
pub trait AccountSource {
    /// The committed balance of `address`.
    fn balance(&self, address: Address) -> Result<U256, HostError>;

    /// The deployed code of `address`.
    fn code(&self, address: Address) -> Result<Bytes, HostError>;

    /// The committed storage value of `key` in `address`.
    fn storage(&self, address: Address, key: U256) -> Result<U256, HostError>;
}

/// The world a transaction executes against: committed records, with the transaction's own
/// up-front debits and its value transfer applied.
#[derive(Debug)]
pub struct ExecutorHost<'a, S: AccountSource + ?Sized> {
    source: &'a S,
    sender: Address,
    sender_debit: U256,
    target: Address,
    value: U256,
    chain_id: u64,
    clock: Clock,
}

impl<'a, S: AccountSource + ?Sized> ExecutorHost<'a, S> {
    /// A host for a transaction from `sender` that moves `value` to `target`.
    ///
    /// `sender_debit` is what the sender pays up front and is not yet reflected in `source`.
    pub fn new(
        source: &'a S,
        sender: Address,
        sender_debit: U256,
        target: Address,
        value: U256,
        chain_id: u64,
        clock: Clock,
    ) -> Self {
        Self { source, sender, sender_debit, target, value, chain_id, clock }
    }
}

impl<S: AccountSource + ?Sized> Host for ExecutorHost<'_, S> {
    fn balance(&self, address: Address) -> Result<U256, HostError> {
        let mut balance = self.source.balance(address)?;
        if address == self.sender {
            balance = balance.saturating_sub(self.sender_debit);
        }
        if address == self.target {
            balance = balance.saturating_add(self.value);
        }
        Ok(balance)
    }

    fn code(&self, address: Address) -> Result<Bytes, HostError> {
        self.source.code(address)
    }

    fn storage(&self, address: Address, key: U256) -> Result<U256, HostError> {
        self.source.storage(address, key)
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn block_number(&self) -> u64 {
        self.clock.slot
    }

    fn block_timestamp(&self) -> u64 {
        self.clock.unix_timestamp
    }
}
