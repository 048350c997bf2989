use alloy::primitives::U256;
use eyre::Result;

use crate::core::opcodes::is_valid_jumpdest;

use super::super::{core::Machine, execution::HaltReason};

fn jump_to(vm: &mut Machine, destination: U256) -> Result<()> {
    let target = Machine::as_usize(destination);
    if !is_valid_jumpdest(&vm.bytecode, target) {
        return Err(HaltReason::InvalidJump(destination).into());
    }

    vm.instruction = target + 1;
    Ok(())
}

/// JUMP - Alter the program counter
pub fn jump(vm: &mut Machine) -> Result<()> {
    let destination = vm.stack.pop()?;
    jump_to(vm, destination)
}

/// JUMPI - Conditionally alter the program counter
pub fn jumpi(vm: &mut Machine) -> Result<()> {
    let destination = vm.stack.pop()?;
    let condition = vm.stack.pop()?;

    if !condition.is_zero() {
        jump_to(vm, destination)?;
    }
    Ok(())
}

/// PC - Get the program counter of this instruction
pub fn pc(vm: &mut Machine) -> Result<()> {
    vm.stack.push(U256::from(vm.instruction - 2))
}

/// GAS - Get the amount of available gas
pub fn gas(vm: &mut Machine) -> Result<()> {
    vm.stack.push(U256::from(vm.gas_remaining))
}
