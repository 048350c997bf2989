use alloy::primitives::{keccak256, U256};
use eyre::Result;

use crate::core::host::Host;

use super::super::{core::Machine, execution::HaltReason};

/// Charges `3 * words + expansion` for a copy of `size` bytes to `dest_offset`.
fn charge_copy(vm: &mut Machine, dest_offset: usize, size: usize) -> bool {
    let minimum_word_size = (size as u128).div_ceil(32);
    let gas_cost = 3 * minimum_word_size + vm.memory.expansion_cost(dest_offset, size);
    vm.consume_gas(gas_cost)
}

/// ADDRESS - Get address of currently executing account
pub fn address(vm: &mut Machine) -> Result<()> {
    let address = Machine::address_to_u256(&vm.address);
    vm.stack.push(address)
}

/// BALANCE - Get balance of the given account
pub fn balance<H: Host + ?Sized>(vm: &mut Machine, host: &H) -> Result<()> {
    let address = Machine::u256_to_address(vm.stack.pop()?);

    // consume dynamic gas
    let gas_cost = vm.access_address(address);
    if !vm.consume_gas(gas_cost) {
        return Ok(());
    }

    let balance = host.balance(address)?;
    vm.stack.push(balance)
}

/// ORIGIN - Get execution origination address
pub fn origin(vm: &mut Machine) -> Result<()> {
    let origin = Machine::address_to_u256(&vm.origin);
    vm.stack.push(origin)
}

/// CALLER - Get caller address
pub fn caller(vm: &mut Machine) -> Result<()> {
    let caller = Machine::address_to_u256(&vm.caller);
    vm.stack.push(caller)
}

/// CALLVALUE - Get deposited value by the instruction/transaction responsible for this execution
pub fn callvalue(vm: &mut Machine) -> Result<()> {
    vm.stack.push(vm.value)
}

/// CALLDATALOAD - Get input data of current environment
pub fn calldataload(vm: &mut Machine) -> Result<()> {
    let offset = Machine::as_usize(vm.stack.pop()?);
    let word = Machine::safe_copy_data(&vm.calldata, offset, 32);
    vm.stack.push(U256::from_be_slice(&word))
}

/// CALLDATASIZE - Get size of input data in current environment
pub fn calldatasize(vm: &mut Machine) -> Result<()> {
    vm.stack.push(U256::from(vm.calldata.len()))
}

/// CALLDATACOPY - Copy input data in current environment to memory
pub fn calldatacopy(vm: &mut Machine) -> Result<()> {
    let dest_offset = Machine::as_usize(vm.stack.pop()?);
    let offset = Machine::as_usize(vm.stack.pop()?);
    let size = Machine::as_usize(vm.stack.pop()?);

    if !charge_copy(vm, dest_offset, size) {
        return Ok(());
    }

    let value = Machine::safe_copy_data(&vm.calldata, offset, size);
    vm.memory.store(dest_offset, size, &value);
    Ok(())
}

/// CODESIZE - Get size of code running in current environment
pub fn codesize(vm: &mut Machine) -> Result<()> {
    vm.stack.push(U256::from(vm.bytecode.len()))
}

/// CODECOPY - Copy code running in current environment to memory
pub fn codecopy(vm: &mut Machine) -> Result<()> {
    let dest_offset = Machine::as_usize(vm.stack.pop()?);
    let offset = Machine::as_usize(vm.stack.pop()?);
    let size = Machine::as_usize(vm.stack.pop()?);

    if !charge_copy(vm, dest_offset, size) {
        return Ok(());
    }

    let value = Machine::safe_copy_data(&vm.bytecode, offset, size);
    vm.memory.store(dest_offset, size, &value);
    Ok(())
}

/// GASPRICE - Get price of gas in current environment
pub fn gasprice(vm: &mut Machine) -> Result<()> {
    vm.stack.push(vm.gas_price)
}

/// EXTCODESIZE - Get size of an account's code
pub fn extcodesize<H: Host + ?Sized>(vm: &mut Machine, host: &H) -> Result<()> {
    let address = Machine::u256_to_address(vm.stack.pop()?);

    // consume dynamic gas
    let gas_cost = vm.access_address(address);
    if !vm.consume_gas(gas_cost) {
        return Ok(());
    }

    let code = host.code(address)?;
    vm.stack.push(U256::from(code.len()))
}

/// EXTCODECOPY - Copy an account's code to memory
pub fn extcodecopy<H: Host + ?Sized>(vm: &mut Machine, host: &H) -> Result<()> {
    let address = Machine::u256_to_address(vm.stack.pop()?);
    let dest_offset = Machine::as_usize(vm.stack.pop()?);
    let offset = Machine::as_usize(vm.stack.pop()?);
    let size = Machine::as_usize(vm.stack.pop()?);

    // consume dynamic gas
    let access_cost = vm.access_address(address);
    if !vm.consume_gas(access_cost) || !charge_copy(vm, dest_offset, size) {
        return Ok(());
    }

    let code = host.code(address)?;
    let value = Machine::safe_copy_data(&code, offset, size);
    vm.memory.store(dest_offset, size, &value);
    Ok(())
}

/// RETURNDATASIZE - Get size of output data from the previous call
pub fn returndatasize(vm: &mut Machine) -> Result<()> {
    vm.stack.push(U256::from(vm.returndata.len()))
}

/// RETURNDATACOPY - Copy output data from the previous call to memory
pub fn returndatacopy(vm: &mut Machine) -> Result<()> {
    let dest_offset = Machine::as_usize(vm.stack.pop()?);
    let offset = Machine::as_usize(vm.stack.pop()?);
    let size = Machine::as_usize(vm.stack.pop()?);

    if offset.checked_add(size).is_none_or(|end| end > vm.returndata.len()) {
        return Err(HaltReason::ReturnDataOutOfBounds.into());
    }
    if !charge_copy(vm, dest_offset, size) {
        return Ok(());
    }

    let value = Machine::safe_copy_data(&vm.returndata, offset, size);
    vm.memory.store(dest_offset, size, &value);
    Ok(())
}

/// EXTCODEHASH - Get hash of an account's code
pub fn extcodehash<H: Host + ?Sized>(vm: &mut Machine, host: &H) -> Result<()> {
    let address = Machine::u256_to_address(vm.stack.pop()?);

    // consume dynamic gas
    let gas_cost = vm.access_address(address);
    if !vm.consume_gas(gas_cost) {
        return Ok(());
    }

    let code = host.code(address)?;
    let hash = if code.is_empty() && host.balance(address)?.is_zero() {
        U256::ZERO
    } else {
        U256::from_be_bytes(keccak256(&code).0)
    };
    vm.stack.push(hash)
}
