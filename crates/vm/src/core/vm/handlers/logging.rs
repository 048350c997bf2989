use eyre::Result;

use crate::core::log::Log;

use super::super::core::Machine;

/// LOG0-LOG4 - Append log record with n topics
pub fn log_n(vm: &mut Machine, topic_count: u8) -> Result<()> {
    let offset = Machine::as_usize(vm.stack.pop()?);
    let size = Machine::as_usize(vm.stack.pop()?);
    let topics = vm.stack.pop_n(topic_count as usize)?;

    // consume dynamic gas
    let gas_cost = 8 * (size as u128) + vm.memory.expansion_cost(offset, size);
    if !vm.consume_gas(gas_cost) {
        return Ok(());
    }

    vm.memory.extend(offset, size);
    let data = vm.memory.read(offset, size);

    let index = vm.events.len() as u64;
    vm.events.push(Log::new(index, vm.address, topics, &data));
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use crate::core::vm::handlers::test_utils::{run_code, CONTRACT};

    #[test]
    fn test_log2() {
        // PUSH1 0xaa, PUSH1 0, MSTORE8, PUSH1 2, PUSH1 1, PUSH1 1, PUSH1 0, LOG2
        let machine = run_code(&[
            0x60, 0xaa, 0x60, 0x00, 0x53, 0x60, 0x02, 0x60, 0x01, 0x60, 0x01, 0x60, 0x00, 0xa2,
            0x00,
        ]);

        assert_eq!(machine.events.len(), 1);
        let log = &machine.events[0];
        assert_eq!(log.index, 0);
        assert_eq!(log.address, CONTRACT);
        assert_eq!(log.topics, vec![U256::from(1), U256::from(2)]);
        assert_eq!(log.data, vec![0xaa]);
        assert_eq!(machine.result().expect("finished").events.len(), 1);
    }

    #[test]
    fn test_log_underflow_halts() {
        // PUSH1 0, PUSH1 0, LOG1
        let machine = run_code(&[0x60, 0x00, 0x60, 0x00, 0xa1, 0x00]);
        assert!(machine.events.is_empty());
        assert!(!machine.exit_status().expect("finished").is_success());
    }
}
