use alloy::primitives::{keccak256, U256};
use eyre::Result;

use super::super::core::Machine;

/// SHA3 - Compute Keccak-256 hash
pub fn sha3(vm: &mut Machine) -> Result<()> {
    let offset = Machine::as_usize(vm.stack.pop()?);
    let size = Machine::as_usize(vm.stack.pop()?);

    // consume dynamic gas
    let minimum_word_size = (size as u128).div_ceil(32);
    let gas_cost = 6 * minimum_word_size + vm.memory.expansion_cost(offset, size);
    if !vm.consume_gas(gas_cost) {
        return Ok(());
    }

    vm.memory.extend(offset, size);
    let data = vm.memory.read(offset, size);
    vm.stack.push(U256::from_be_bytes(keccak256(data).0))
}
