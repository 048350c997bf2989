use alloy::primitives::U256;
use eyre::Result;

use crate::core::opcodes::{DUP1, PUSH0, SWAP1};

use super::super::core::Machine;

/// POP - Remove item from stack
pub fn pop(vm: &mut Machine) -> Result<()> {
    vm.stack.pop()?;
    Ok(())
}

/// PUSH0 - Place 0 on stack
pub fn push0(vm: &mut Machine) -> Result<()> {
    vm.stack.push(U256::ZERO)
}

/// PUSH1-PUSH32 - Place n byte item on stack. Immediates running past the end of the code read
/// as zero.
pub fn push_n(vm: &mut Machine, opcode: u8) -> Result<()> {
    let num_bytes = (opcode - PUSH0) as usize;
    let start = vm.instruction - 1;
    let bytes = Machine::safe_copy_data(&vm.bytecode, start, num_bytes);

    vm.instruction += num_bytes;
    vm.stack.push(U256::from_be_slice(&bytes))
}

/// DUP1-DUP16 - Duplicate nth stack item
pub fn dup_n(vm: &mut Machine, opcode: u8) -> Result<()> {
    let index = (opcode - DUP1) as usize + 1;
    vm.stack.dup(index)
}

/// SWAP1-SWAP16 - Exchange 1st and (n+1)th stack items
pub fn swap_n(vm: &mut Machine, opcode: u8) -> Result<()> {
    let index = (opcode - SWAP1) as usize + 1;
    vm.stack.swap(index)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use crate::core::vm::{handlers::test_utils::run_code, ExitStatus, HaltReason};

    #[test]
    fn test_push_dup_swap() {
        // PUSH1 1, PUSH2 0x0203, DUP2, SWAP2
        let machine = run_code(&[0x60, 0x01, 0x61, 0x02, 0x03, 0x81, 0x91, 0x00]);
        assert_eq!(machine.stack.size(), 3);
        assert_eq!(machine.stack.peek(0), U256::from(1));
        assert_eq!(machine.stack.peek(1), U256::from(0x0203));
        assert_eq!(machine.stack.peek(2), U256::from(1));
    }

    #[test]
    fn test_truncated_push_pads_right() {
        // PUSH2 0xff <end of code>
        let machine = run_code(&[0x61, 0xff]);
        assert_eq!(machine.stack.peek(0), U256::from(0xff00));
        assert_eq!(machine.exit_status(), Some(&ExitStatus::Stop));
    }

    #[test]
    fn test_pop_empty_stack_halts() {
        let machine = run_code(&[0x50]);
        assert_eq!(
            machine.exit_status(),
            Some(&ExitStatus::Halt(HaltReason::StackUnderflow))
        );
    }
}
