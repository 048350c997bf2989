use alloy::primitives::{I256, U256};
use eyre::Result;
use shuttle_common::utils::strings::sign_uint;

use super::super::core::Machine;

/// AND - Bitwise AND operation
pub fn and(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.stack.push(a & b)
}

/// OR - Bitwise OR operation
pub fn or(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.stack.push(a | b)
}

/// XOR - Bitwise XOR operation
pub fn xor(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.stack.push(a ^ b)
}

/// NOT - Bitwise NOT operation
pub fn not(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    vm.stack.push(!a)
}

/// BYTE - Retrieve single byte from word
pub fn byte(vm: &mut Machine) -> Result<()> {
    let index = vm.stack.pop()?;
    let word = vm.stack.pop()?;

    let result = if index < U256::from(32u8) {
        U256::from(word.byte(31 - Machine::as_usize(index)))
    } else {
        U256::ZERO
    };
    vm.stack.push(result)
}

/// SHL - Shift left operation
pub fn shl(vm: &mut Machine) -> Result<()> {
    let shift = vm.stack.pop()?;
    let value = vm.stack.pop()?;

    let result =
        if shift < U256::from(256u16) { value << Machine::as_usize(shift) } else { U256::ZERO };
    vm.stack.push(result)
}

/// SHR - Logical shift right operation
pub fn shr(vm: &mut Machine) -> Result<()> {
    let shift = vm.stack.pop()?;
    let value = vm.stack.pop()?;

    let result =
        if shift < U256::from(256u16) { value >> Machine::as_usize(shift) } else { U256::ZERO };
    vm.stack.push(result)
}

/// SAR - Arithmetic shift right operation
pub fn sar(vm: &mut Machine) -> Result<()> {
    let shift = vm.stack.pop()?;
    let value = sign_uint(vm.stack.pop()?);

    let result = if shift < U256::from(256u16) {
        value.asr(Machine::as_usize(shift))
    } else if value.is_negative() {
        I256::MINUS_ONE
    } else {
        I256::ZERO
    };
    vm.stack.push(result.into_raw())
}
