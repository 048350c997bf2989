use alloy::primitives::U256;
use eyre::Result;

use super::super::core::Machine;

/// MLOAD - Load word from memory
pub fn mload(vm: &mut Machine) -> Result<()> {
    let offset = Machine::as_usize(vm.stack.pop()?);

    // consume dynamic gas
    if !vm.consume_gas(vm.memory.expansion_cost(offset, 32)) {
        return Ok(());
    }

    vm.memory.extend(offset, 32);
    vm.stack.push(U256::from_be_slice(&vm.memory.read(offset, 32)))
}

/// MSTORE - Save word to memory
pub fn mstore(vm: &mut Machine) -> Result<()> {
    let offset = Machine::as_usize(vm.stack.pop()?);
    let value = vm.stack.pop()?;

    // consume dynamic gas
    if !vm.consume_gas(vm.memory.expansion_cost(offset, 32)) {
        return Ok(());
    }

    vm.memory.store(offset, 32, &value.to_be_bytes::<32>());
    Ok(())
}

/// MSTORE8 - Save byte to memory
pub fn mstore8(vm: &mut Machine) -> Result<()> {
    let offset = Machine::as_usize(vm.stack.pop()?);
    let value = vm.stack.pop()?;

    // consume dynamic gas
    if !vm.consume_gas(vm.memory.expansion_cost(offset, 1)) {
        return Ok(());
    }

    vm.memory.store(offset, 1, &[value.byte(0)]);
    Ok(())
}

/// MSIZE - Get the size of active memory in bytes
pub fn msize(vm: &mut Machine) -> Result<()> {
    vm.stack.push(U256::from(vm.memory.size()))
}

/// MCOPY - Copy memory areas
pub fn mcopy(vm: &mut Machine) -> Result<()> {
    let dest_offset = Machine::as_usize(vm.stack.pop()?);
    let offset = Machine::as_usize(vm.stack.pop()?);
    let size = Machine::as_usize(vm.stack.pop()?);

    // consume dynamic gas
    let minimum_word_size = (size as u128).div_ceil(32);
    let expansion_cost = vm
        .memory
        .expansion_cost(offset, size)
        .max(vm.memory.expansion_cost(dest_offset, size));
    if !vm.consume_gas(3 * minimum_word_size + expansion_cost) {
        return Ok(());
    }

    let value = vm.memory.read(offset, size);
    vm.memory.extend(offset, size);
    vm.memory.store(dest_offset, size, &value);
    Ok(())
}
