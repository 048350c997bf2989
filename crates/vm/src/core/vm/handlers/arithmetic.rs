use std::ops::{Div, Rem};

use alloy::primitives::{I256, U256};
use eyre::Result;
use shuttle_common::utils::strings::sign_uint;

use super::super::core::Machine;

/// ADD - Addition operation
pub fn add(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.stack.push(a.overflowing_add(b).0)
}

/// MUL - Multiplication operation
pub fn mul(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.stack.push(a.overflowing_mul(b).0)
}

/// SUB - Subtraction operation
pub fn sub(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    vm.stack.push(a.overflowing_sub(b).0)
}

/// DIV - Integer division operation
pub fn div(vm: &mut Machine) -> Result<()> {
    let numerator = vm.stack.pop()?;
    let denominator = vm.stack.pop()?;
    let result = if !denominator.is_zero() { numerator.div(denominator) } else { U256::ZERO };
    vm.stack.push(result)
}

/// SDIV - Signed integer division operation
pub fn sdiv(vm: &mut Machine) -> Result<()> {
    let numerator = vm.stack.pop()?;
    let denominator = vm.stack.pop()?;
    let result = if !denominator.is_zero() {
        sign_uint(numerator).wrapping_div(sign_uint(denominator))
    } else {
        I256::ZERO
    };
    vm.stack.push(result.into_raw())
}

/// MOD - Modulo operation
pub fn modulo(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let modulus = vm.stack.pop()?;
    let result = if !modulus.is_zero() { a.rem(modulus) } else { U256::ZERO };
    vm.stack.push(result)
}

/// SMOD - Signed modulo operation
pub fn smod(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let modulus = vm.stack.pop()?;
    let result = if !modulus.is_zero() {
        sign_uint(a).wrapping_rem(sign_uint(modulus))
    } else {
        I256::ZERO
    };
    vm.stack.push(result.into_raw())
}

/// ADDMOD - Addition modulo operation
pub fn addmod(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    let modulus = vm.stack.pop()?;
    vm.stack.push(a.add_mod(b, modulus))
}

/// MULMOD - Multiplication modulo operation
pub fn mulmod(vm: &mut Machine) -> Result<()> {
    let a = vm.stack.pop()?;
    let b = vm.stack.pop()?;
    let modulus = vm.stack.pop()?;
    vm.stack.push(a.mul_mod(b, modulus))
}

/// EXP - Exponential operation
pub fn exp(vm: &mut Machine) -> Result<()> {
    let base = vm.stack.pop()?;
    let exponent = vm.stack.pop()?;

    // consume dynamic gas
    let exponent_bytes = exponent.bit_len().div_ceil(8) as u128;
    if !vm.consume_gas(50 * exponent_bytes) {
        return Ok(());
    }

    vm.stack.push(base.overflowing_pow(exponent).0)
}

/// SIGNEXTEND - Sign extension operation
pub fn signextend(vm: &mut Machine) -> Result<()> {
    let byte_index = vm.stack.pop()?;
    let value = vm.stack.pop()?;

    let result = if byte_index < U256::from(31u8) {
        let sign_bit = Machine::as_usize(byte_index) * 8 + 7;
        let mask = (U256::from(1u8) << sign_bit) - U256::from(1u8);
        if value.bit(sign_bit) {
            value | !mask
        } else {
            value & mask
        }
    } else {
        value
    };
    vm.stack.push(result)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{I256, U256};

    use crate::core::vm::handlers::test_utils::run_code;

    #[test]
    fn test_sub_and_div_operand_order() {
        // PUSH1 3, PUSH1 10, SUB -> 10 - 3
        let machine = run_code(&[0x60, 0x03, 0x60, 0x0a, 0x03, 0x00]);
        assert_eq!(machine.stack.peek(0), U256::from(7));

        // PUSH1 3, PUSH1 10, DIV -> 10 / 3
        let machine = run_code(&[0x60, 0x03, 0x60, 0x0a, 0x04, 0x00]);
        assert_eq!(machine.stack.peek(0), U256::from(3));
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        // PUSH1 0, PUSH1 10, DIV / MOD / SDIV / SMOD
        for opcode in [0x04, 0x06, 0x05, 0x07] {
            let machine = run_code(&[0x60, 0x00, 0x60, 0x0a, opcode, 0x00]);
            assert_eq!(machine.stack.peek(0), U256::ZERO);
        }
    }

    #[test]
    fn test_sdiv_negative() {
        // PUSH1 2, PUSH32 -10, SDIV -> -5
        let mut code = vec![0x60, 0x02, 0x7f];
        code.extend_from_slice(&I256::try_from(-10i64).expect("fits").into_raw().to_be_bytes::<32>());
        code.extend_from_slice(&[0x05, 0x00]);

        let machine = run_code(&code);
        assert_eq!(machine.stack.peek(0), I256::try_from(-5i64).expect("fits").into_raw());
    }

    #[test]
    fn test_exp_charges_per_exponent_byte() {
        // PUSH2 0x0100, PUSH1 2, EXP -> 2^256 wraps to 0
        let machine = run_code(&[0x61, 0x01, 0x00, 0x60, 0x02, 0x0a, 0x00]);
        assert_eq!(machine.stack.peek(0), U256::ZERO);
        // 3 + 3 + 10 + 50 * 2
        assert_eq!(machine.gas_used, 21_000 + 116);
    }

    #[test]
    fn test_signextend() {
        // PUSH1 0xff, PUSH1 0, SIGNEXTEND -> -1
        let machine = run_code(&[0x60, 0xff, 0x60, 0x00, 0x0b, 0x00]);
        assert_eq!(machine.stack.peek(0), U256::MAX);

        // PUSH1 0x7f, PUSH1 0, SIGNEXTEND -> 0x7f
        let machine = run_code(&[0x60, 0x7f, 0x60, 0x00, 0x0b, 0x00]);
        assert_eq!(machine.stack.peek(0), U256::from(0x7f));
    }

    #[test]
    fn test_addmod_mulmod() {
        // PUSH1 5, PUSH1 4, PUSH1 3, ADDMOD -> (3 + 4) % 5
        let machine = run_code(&[0x60, 0x05, 0x60, 0x04, 0x60, 0x03, 0x08, 0x00]);
        assert_eq!(machine.stack.peek(0), U256::from(2));

        // PUSH1 5, PUSH1 4, PUSH1 3, MULMOD -> (3 * 4) % 5
        let machine = run_code(&[0x60, 0x05, 0x60, 0x04, 0x60, 0x03, 0x09, 0x00]);
        assert_eq!(machine.stack.peek(0), U256::from(2));
    }
}
