use eyre::Result;

use crate::core::{host::Host, opcodes::SELFDESTRUCT};

use super::super::{
    core::Machine,
    execution::{ExitStatus, HaltReason},
};

/// Pops `offset` and `size`, charges memory expansion and reads the output region.
fn output(vm: &mut Machine) -> Result<Option<Vec<u8>>> {
    let offset = Machine::as_usize(vm.stack.pop()?);
    let size = Machine::as_usize(vm.stack.pop()?);

    // consume dynamic gas
    if !vm.consume_gas(vm.memory.expansion_cost(offset, size)) {
        return Ok(None);
    }

    vm.memory.extend(offset, size);
    Ok(Some(vm.memory.read(offset, size)))
}

/// RETURN - Halt execution returning output data
pub fn op_return(vm: &mut Machine) -> Result<()> {
    if let Some(data) = output(vm)? {
        vm.exit(ExitStatus::Return(data));
    }
    Ok(())
}

/// REVERT - Halt execution reverting state changes
pub fn revert(vm: &mut Machine) -> Result<()> {
    if let Some(data) = output(vm)? {
        vm.exit(ExitStatus::Revert(data));
    }
    Ok(())
}

/// CALL, CALLCODE, DELEGATECALL, STATICCALL - Message calls are not supported.
///
/// The target is still resolved through the host first, so an unresolvable target surfaces as a
/// host error rather than a halt.
pub fn call<H: Host + ?Sized>(
    vm: &mut Machine,
    host: &H,
    opcode: u8,
    input_count: usize,
) -> Result<()> {
    let inputs = vm.stack.pop_n(input_count)?;
    let address = Machine::u256_to_address(inputs[1]);

    vm.access_address(address);
    host.code(address)?;

    Err(HaltReason::UnsupportedCall(opcode).into())
}

/// CREATE, CREATE2 - Contract creation from inside a contract is not supported.
pub fn create(_vm: &mut Machine, opcode: u8) -> Result<()> {
    Err(HaltReason::UnsupportedCall(opcode).into())
}

/// SELFDESTRUCT - Not supported. The beneficiary is resolved through the host first.
pub fn selfdestruct<H: Host + ?Sized>(vm: &mut Machine, host: &H) -> Result<()> {
    let beneficiary = Machine::u256_to_address(vm.stack.pop()?);

    vm.access_address(beneficiary);
    host.balance(beneficiary)?;

    Err(HaltReason::UnsupportedCall(SELFDESTRUCT).into())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Address;

    use crate::{
        core::vm::{
            handlers::test_utils::{machine, run_code, MockHost},
            ExitStatus, HaltReason,
        },
        error::HostError,
    };

    #[test]
    fn test_return_data() {
        // PUSH1 0x2a, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
        let machine = run_code(&[0x60, 0x2a, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3]);

        let mut expected = vec![0u8; 32];
        expected[31] = 0x2a;
        assert_eq!(machine.exit_status(), Some(&ExitStatus::Return(expected)));
        assert_eq!(machine.exit_status().map(ExitStatus::code), Some(0x12));
    }

    #[test]
    fn test_revert_keeps_unused_gas() {
        // PUSH1 0, PUSH1 0, REVERT
        let machine = run_code(&[0x60, 0x00, 0x60, 0x00, 0xfd]);
        assert_eq!(machine.exit_status(), Some(&ExitStatus::Revert(vec![])));
        assert_eq!(machine.gas_used, 21_006);
    }

    #[test]
    fn test_call_halts_unsupported() {
        // PUSH1 0 x5, PUSH1 0x77, PUSH1 0, CALL
        let machine = run_code(&[
            0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x77, 0x60, 0x00,
            0xf1,
        ]);
        assert_eq!(
            machine.exit_status(),
            Some(&ExitStatus::Halt(HaltReason::UnsupportedCall(0xf1)))
        );
        assert!(machine.address_access_set.contains(&Address::with_last_byte(0x77)));
    }

    #[test]
    fn test_call_to_unknown_address_is_host_error() {
        let host = MockHost { strict: true, ..Default::default() };

        // PUSH1 0 x4, PUSH1 0x77, PUSH1 0, STATICCALL
        let mut vm = machine(
            &[
                0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x77, 0x60, 0x00, 0xfa,
            ],
            &[],
        );
        assert_eq!(
            vm.run(u64::MAX, &host),
            Err(HostError::AddressMustBePresent(Address::with_last_byte(0x77)))
        );
    }

    #[test]
    fn test_invalid_opcode_consumes_all_gas() {
        let machine = run_code(&[0xfe]);
        assert_eq!(
            machine.exit_status(),
            Some(&ExitStatus::Halt(HaltReason::InvalidOpcode(0xfe)))
        );
        assert_eq!(machine.gas_used, 1_000_000);
        assert_eq!(machine.exit_status().map(ExitStatus::code), Some(0xd0));
    }
}
