use eyre::Result;

use crate::core::host::Host;

use super::super::core::Machine;

/// SLOAD - Load word from storage, falling back to the committed value in the host
pub fn sload<H: Host + ?Sized>(vm: &mut Machine, host: &H) -> Result<()> {
    let key = vm.stack.pop()?;

    // consume dynamic gas
    let gas_cost = vm.storage.access_cost(key);
    if !vm.consume_gas(gas_cost.into()) {
        return Ok(());
    }

    let value = match vm.storage.get(key) {
        Some(value) => value,
        None => host.storage(vm.address, key)?,
    };
    vm.stack.push(value)
}

/// SSTORE - Save word to storage
pub fn sstore(vm: &mut Machine) -> Result<()> {
    let key = vm.stack.pop()?;
    let value = vm.stack.pop()?;

    // consume dynamic gas
    let gas_cost = vm.storage.storage_cost(key, value);
    if !vm.consume_gas(gas_cost.into()) {
        return Ok(());
    }

    vm.storage.store(key, value);
    Ok(())
}

/// TLOAD - Load word from transient storage
pub fn tload(vm: &mut Machine) -> Result<()> {
    let key = vm.stack.pop()?;
    let value = vm.storage.tload(key);
    vm.stack.push(value)
}

/// TSTORE - Save word to transient storage
pub fn tstore(vm: &mut Machine) -> Result<()> {
    let key = vm.stack.pop()?;
    let value = vm.stack.pop()?;
    vm.storage.tstore(key, value);
    Ok(())
}
