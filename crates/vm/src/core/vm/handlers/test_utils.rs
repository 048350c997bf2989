use std::collections::HashMap;

use alloy::primitives::{Address, Bytes, U256};

use crate::{
    core::{
        host::Host,
        vm::{Context, Machine},
    },
    error::HostError,
};

/// The address every test machine executes at.
pub(crate) const CONTRACT: Address = Address::repeat_byte(0xcc);
/// The origin of every test machine.
pub(crate) const ORIGIN: Address = Address::repeat_byte(0x0a);

/// A host backed by in-memory maps. Addresses outside `known` fail to resolve.
#[derive(Debug, Default)]
pub(crate) struct MockHost {
    pub(crate) balances: HashMap<Address, U256>,
    pub(crate) codes: HashMap<Address, Bytes>,
    pub(crate) storage: HashMap<(Address, U256), U256>,
    pub(crate) strict: bool,
}

impl MockHost {
    fn resolve(&self, address: Address) -> Result<(), HostError> {
        let known = address == CONTRACT ||
            address == ORIGIN ||
            self.balances.contains_key(&address) ||
            self.codes.contains_key(&address);
        if self.strict && !known {
            return Err(HostError::AddressMustBePresent(address));
        }
        Ok(())
    }
}

impl Host for MockHost {
    fn balance(&self, address: Address) -> Result<U256, HostError> {
        self.resolve(address)?;
        Ok(self.balances.get(&address).copied().unwrap_or_default())
    }

    fn code(&self, address: Address) -> Result<Bytes, HostError> {
        self.resolve(address)?;
        Ok(self.codes.get(&address).cloned().unwrap_or_default())
    }

    fn storage(&self, address: Address, key: U256) -> Result<U256, HostError> {
        self.resolve(address)?;
        Ok(self.storage.get(&(address, key)).copied().unwrap_or_default())
    }

    fn chain_id(&self) -> u64 {
        111
    }

    fn block_number(&self) -> u64 {
        42
    }

    fn block_timestamp(&self) -> u64 {
        1_700_000_000
    }
}

/// A fresh machine running `code` with calldata `input`, a 1,000,000 gas limit and 21000
/// intrinsic gas.
pub(crate) fn machine(code: &[u8], input: &[u8]) -> Machine {
    Machine::new(
        Context {
            origin: ORIGIN,
            caller: ORIGIN,
            address: CONTRACT,
            value: U256::from(5),
            gas_price: U256::from(2),
            gas_limit: 1_000_000,
            calldata: input.to_vec(),
        },
        code,
        21_000,
    )
}

/// Runs `code` to completion against an empty, permissive host.
pub(crate) fn run_code(code: &[u8]) -> Machine {
    run_with_host(code, &MockHost::default())
}

/// Runs `code` to completion against `host`.
pub(crate) fn run_with_host(code: &[u8], host: &MockHost) -> Machine {
    let mut vm = machine(code, &[]);
    vm.run(u64::MAX, host).expect("host error");
    vm
}
