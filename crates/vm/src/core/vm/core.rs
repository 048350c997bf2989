use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::{Address, B256, U256};
use eyre::{OptionExt, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(feature = "step-tracing")]
use tracing::trace;

use crate::{
    core::opcodes::{self, OpCodeInfo},
    error::HostError,
};

use super::super::{host::Host, log::Log, memory::Memory, stack::Stack, storage::Storage};

use super::{
    execution::{ExecutionResult, ExitStatus, HaltReason},
    handlers,
};

/// The transaction-level inputs of an execution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// The address that signed the transaction.
    pub origin: Address,
    /// The address that directly called this contract.
    pub caller: Address,
    /// The address of the executing contract.
    pub address: Address,
    /// The amount of tokens sent with the call.
    pub value: U256,
    /// The price per unit of gas.
    pub gas_price: U256,
    /// The maximum amount of gas the transaction may consume.
    pub gas_limit: u64,
    /// The input data provided to the contract call. Empty for contract creation.
    pub calldata: Vec<u8>,
}

/// The [`Machine`] struct represents an EVM instance. \
/// It contains the EVM's [`Stack`], [`Memory`], [`Storage`] journal, and other state variables
/// needed to execute a single top-level call, and can be checkpointed between any two steps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    /// The EVM stack that holds values during execution.
    pub stack: Stack,

    /// The EVM memory space that can be read from and written to.
    pub memory: Memory,

    /// Storage writes of the executing contract, not yet committed.
    pub storage: Storage,

    /// The current instruction pointer, one past the program counter.
    pub instruction: usize,

    /// The bytecode being executed.
    pub bytecode: Vec<u8>,

    /// The input data provided to the contract call.
    pub calldata: Vec<u8>,

    /// The address of the executing contract.
    pub address: Address,

    /// The address that originated the transaction.
    pub origin: Address,

    /// The address that directly called this contract.
    pub caller: Address,

    /// The amount of tokens sent with the call.
    pub value: U256,

    /// The price per unit of gas.
    pub gas_price: U256,

    /// The gas limit of the transaction.
    pub gas_limit: u64,

    /// The amount of gas remaining for execution.
    pub gas_remaining: u64,

    /// The amount of gas used so far, including intrinsic gas.
    pub gas_used: u64,

    /// The events (logs) emitted during execution.
    pub events: Vec<Log>,

    /// The data returned by the last nested call. Always empty, since nested calls halt.
    pub returndata: Vec<u8>,

    /// How execution ended, or `None` while the machine can still run.
    pub exit: Option<ExitStatus>,

    /// The number of steps executed so far.
    pub steps: u64,

    /// Every address the execution has touched, used for warm/cold gas pricing.
    pub address_access_set: BTreeSet<Address>,
}

impl Machine {
    /// Creates a new [`Machine`] that runs `code` in the given [`Context`], with `intrinsic_gas`
    /// already charged.
    ///
    /// ```
    /// use shuttle_vm::core::vm::{Context, Machine};
    ///
    /// let machine = Machine::new(
    ///     Context { gas_limit: 100_000, ..Default::default() },
    ///     &[0x00],
    ///     21_000,
    /// );
    /// assert_eq!(machine.gas_used, 21_000);
    /// assert_eq!(machine.gas_remaining, 79_000);
    /// assert!(machine.exit_status().is_none());
    /// ```
    pub fn new(context: Context, code: &[u8], intrinsic_gas: u64) -> Machine {
        let mut machine = Machine {
            stack: Stack::new(),
            memory: Memory::new(),
            storage: Storage::new(),
            instruction: 1,
            bytecode: code.to_vec(),
            calldata: context.calldata,
            address: context.address,
            origin: context.origin,
            caller: context.caller,
            value: context.value,
            gas_price: context.gas_price,
            gas_limit: context.gas_limit,
            gas_remaining: context.gas_limit.saturating_sub(intrinsic_gas),
            gas_used: intrinsic_gas.min(context.gas_limit),
            events: Vec::new(),
            returndata: Vec::new(),
            exit: None,
            steps: 0,
            address_access_set: BTreeSet::from([context.origin, context.caller, context.address]),
        };

        if intrinsic_gas > context.gas_limit {
            machine.exit(ExitStatus::Halt(HaltReason::OutOfGas));
        }
        machine
    }

    /// How execution ended, or `None` while the machine can still run.
    pub fn exit_status(&self) -> Option<&ExitStatus> {
        self.exit.as_ref()
    }

    /// Ends execution with the given status. An exceptional halt consumes all remaining gas.
    ///
    /// ```
    /// use shuttle_vm::core::vm::{Context, ExitStatus, HaltReason, Machine};
    ///
    /// let mut machine = Machine::new(
    ///     Context { gas_limit: 100_000, ..Default::default() },
    ///     &[0x00],
    ///     21_000,
    /// );
    ///
    /// machine.exit(ExitStatus::Halt(HaltReason::InvalidOpcode(0xfe)));
    /// assert_eq!(machine.gas_used, 100_000);
    /// assert_eq!(machine.gas_remaining, 0);
    /// ```
    pub fn exit(&mut self, status: ExitStatus) {
        if let ExitStatus::Halt(_) = status {
            self.gas_used = self.gas_used.saturating_add(self.gas_remaining);
            self.gas_remaining = 0;
        }
        self.exit = Some(status);
    }

    /// Consume gas units, halting execution if out of gas
    ///
    /// ```
    /// use shuttle_vm::core::vm::{Context, ExitStatus, HaltReason, Machine};
    ///
    /// let mut machine = Machine::new(
    ///     Context { gas_limit: 100_000, ..Default::default() },
    ///     &[0x00],
    ///     21_000,
    /// );
    ///
    /// assert!(machine.consume_gas(100));
    /// assert_eq!(machine.gas_remaining, 78_900);
    ///
    /// assert!(!machine.consume_gas(1_000_000));
    /// assert_eq!(machine.gas_remaining, 0);
    /// assert_eq!(machine.exit_status(), Some(&ExitStatus::Halt(HaltReason::OutOfGas)));
    /// ```
    pub fn consume_gas(&mut self, amount: u128) -> bool {
        if amount > self.gas_remaining as u128 {
            self.exit(ExitStatus::Halt(HaltReason::OutOfGas));
            return false;
        }

        // amount fits in a u64 here
        let amount = amount as u64;
        self.gas_remaining -= amount;
        self.gas_used = self.gas_used.saturating_add(amount);
        true
    }

    /// Marks `address` as touched and returns the extra gas charged for a cold access.
    pub(crate) fn access_address(&mut self, address: Address) -> u128 {
        if self.address_access_set.insert(address) {
            2500
        } else {
            0
        }
    }

    /// Push a boolean value onto the stack
    pub(crate) fn push_boolean(&mut self, condition: bool) -> Result<()> {
        self.stack.push(if condition { U256::from(1u8) } else { U256::ZERO })
    }

    /// Convert an address to U256
    pub(crate) fn address_to_u256(address: &Address) -> U256 {
        U256::from_be_bytes(address.into_word().0)
    }

    /// Convert the low 20 bytes of a stack word to an address
    pub(crate) fn u256_to_address(value: U256) -> Address {
        Address::from_word(B256::from(value))
    }

    /// Safely convert a stack word to a memory offset or size, saturating at `usize::MAX`
    pub(crate) fn as_usize(value: U256) -> usize {
        value.try_into().unwrap_or(usize::MAX)
    }

    /// Safely copy data from source with bounds checking
    pub(crate) fn safe_copy_data(source: &[u8], offset: usize, size: usize) -> Vec<u8> {
        let end_offset = offset.saturating_add(size).min(source.len());
        let mut value = source.get(offset..end_offset).unwrap_or(&[]).to_owned();
        if value.len() < size {
            value.resize(size, 0u8);
        }
        value
    }

    /// Executes the next instruction in the bytecode.
    fn _step<H: Host + ?Sized>(&mut self, host: &H) -> Result<()> {
        // running off the end of the code is an implicit STOP
        if self.instruction > self.bytecode.len() {
            self.exit(ExitStatus::Stop);
            return Ok(());
        }

        let opcode = self
            .bytecode
            .get(self.instruction - 1)
            .copied()
            .ok_or_eyre(format!("instruction pointer out of range: {}", self.instruction))?;
        self.instruction += 1;

        let opcode_info = OpCodeInfo::from(opcode);

        #[cfg(feature = "step-tracing")]
        trace!(
            pc = self.instruction - 2,
            opcode = opcode_info.name(),
            gas_remaining = self.gas_remaining,
            stack = %self.stack,
            "executing opcode"
        );

        // Consume the minimum gas for the opcode
        if !self.consume_gas(opcode_info.min_gas().into()) {
            return Ok(());
        }

        match opcode {
            opcodes::STOP => self.exit(ExitStatus::Stop),

            opcodes::ADD => handlers::arithmetic::add(self)?,
            opcodes::MUL => handlers::arithmetic::mul(self)?,
            opcodes::SUB => handlers::arithmetic::sub(self)?,
            opcodes::DIV => handlers::arithmetic::div(self)?,
            opcodes::SDIV => handlers::arithmetic::sdiv(self)?,
            opcodes::MOD => handlers::arithmetic::modulo(self)?,
            opcodes::SMOD => handlers::arithmetic::smod(self)?,
            opcodes::ADDMOD => handlers::arithmetic::addmod(self)?,
            opcodes::MULMOD => handlers::arithmetic::mulmod(self)?,
            opcodes::EXP => handlers::arithmetic::exp(self)?,
            opcodes::SIGNEXTEND => handlers::arithmetic::signextend(self)?,

            opcodes::LT => handlers::comparison::lt(self)?,
            opcodes::GT => handlers::comparison::gt(self)?,
            opcodes::SLT => handlers::comparison::slt(self)?,
            opcodes::SGT => handlers::comparison::sgt(self)?,
            opcodes::EQ => handlers::comparison::eq(self)?,
            opcodes::ISZERO => handlers::comparison::iszero(self)?,

            opcodes::AND => handlers::bitwise::and(self)?,
            opcodes::OR => handlers::bitwise::or(self)?,
            opcodes::XOR => handlers::bitwise::xor(self)?,
            opcodes::NOT => handlers::bitwise::not(self)?,
            opcodes::BYTE => handlers::bitwise::byte(self)?,
            opcodes::SHL => handlers::bitwise::shl(self)?,
            opcodes::SHR => handlers::bitwise::shr(self)?,
            opcodes::SAR => handlers::bitwise::sar(self)?,

            opcodes::SHA3 => handlers::crypto::sha3(self)?,

            opcodes::ADDRESS => handlers::environment::address(self)?,
            opcodes::BALANCE => handlers::environment::balance(self, host)?,
            opcodes::ORIGIN => handlers::environment::origin(self)?,
            opcodes::CALLER => handlers::environment::caller(self)?,
            opcodes::CALLVALUE => handlers::environment::callvalue(self)?,
            opcodes::CALLDATALOAD => handlers::environment::calldataload(self)?,
            opcodes::CALLDATASIZE => handlers::environment::calldatasize(self)?,
            opcodes::CALLDATACOPY => handlers::environment::calldatacopy(self)?,
            opcodes::CODESIZE => handlers::environment::codesize(self)?,
            opcodes::CODECOPY => handlers::environment::codecopy(self)?,
            opcodes::GASPRICE => handlers::environment::gasprice(self)?,
            opcodes::EXTCODESIZE => handlers::environment::extcodesize(self, host)?,
            opcodes::EXTCODECOPY => handlers::environment::extcodecopy(self, host)?,
            opcodes::RETURNDATASIZE => handlers::environment::returndatasize(self)?,
            opcodes::RETURNDATACOPY => handlers::environment::returndatacopy(self)?,
            opcodes::EXTCODEHASH => handlers::environment::extcodehash(self, host)?,

            opcodes::BLOCKHASH => handlers::block::blockhash(self)?,
            opcodes::NUMBER => handlers::block::number(self, host)?,
            opcodes::TIMESTAMP => handlers::block::timestamp(self, host)?,
            opcodes::GASLIMIT => handlers::block::gaslimit(self)?,
            opcodes::CHAINID => handlers::block::chainid(self, host)?,
            opcodes::SELFBALANCE => handlers::block::selfbalance(self, host)?,
            opcodes::BLOBHASH => handlers::block::blobhash(self)?,
            opcodes::COINBASE | opcodes::PREVRANDAO | opcodes::BASEFEE | opcodes::BLOBBASEFEE => {
                handlers::block::block_info_stub(self)?
            }

            opcodes::POP => handlers::stack::pop(self)?,
            opcodes::MLOAD => handlers::memory::mload(self)?,
            opcodes::MSTORE => handlers::memory::mstore(self)?,
            opcodes::MSTORE8 => handlers::memory::mstore8(self)?,
            opcodes::SLOAD => handlers::storage::sload(self, host)?,
            opcodes::SSTORE => handlers::storage::sstore(self)?,

            opcodes::JUMP => handlers::control::jump(self)?,
            opcodes::JUMPI => handlers::control::jumpi(self)?,
            opcodes::JUMPDEST => {}
            opcodes::TLOAD => handlers::storage::tload(self)?,
            opcodes::TSTORE => handlers::storage::tstore(self)?,
            opcodes::MCOPY => handlers::memory::mcopy(self)?,
            opcodes::PC => handlers::control::pc(self)?,
            opcodes::MSIZE => handlers::memory::msize(self)?,
            opcodes::GAS => handlers::control::gas(self)?,

            opcodes::PUSH0 => handlers::stack::push0(self)?,
            (opcodes::PUSH1..=opcodes::PUSH32) => handlers::stack::push_n(self, opcode)?,
            (opcodes::DUP1..=opcodes::DUP16) => handlers::stack::dup_n(self, opcode)?,
            (opcodes::SWAP1..=opcodes::SWAP16) => handlers::stack::swap_n(self, opcode)?,

            (opcodes::LOG0..=opcodes::LOG4) => {
                let topic_count = opcode - opcodes::LOG0;
                handlers::logging::log_n(self, topic_count)?;
            }

            opcodes::CALL | opcodes::CALLCODE => handlers::system::call(self, host, opcode, 7)?,
            opcodes::DELEGATECALL | opcodes::STATICCALL => {
                handlers::system::call(self, host, opcode, 6)?
            }
            opcodes::CREATE | opcodes::CREATE2 => handlers::system::create(self, opcode)?,
            opcodes::SELFDESTRUCT => handlers::system::selfdestruct(self, host)?,
            opcodes::RETURN => handlers::system::op_return(self)?,
            opcodes::REVERT => handlers::system::revert(self)?,

            _ => return Err(HaltReason::InvalidOpcode(opcode).into()),
        }

        Ok(())
    }

    /// Executes up to `step_limit` instructions and returns how many were executed.
    ///
    /// Execution stops early once the machine exits. Interpreter faults end execution with
    /// [`ExitStatus::Halt`]; only [`HostError`]s are returned, and they leave the machine in an
    /// undefined state that must be discarded.
    ///
    /// ```
    /// use shuttle_vm::core::vm::{Context, ExitStatus, Machine};
    /// # use shuttle_vm::{core::host::Host, error::HostError};
    /// # use alloy::primitives::{Address, Bytes, U256};
    /// # struct Empty;
    /// # impl Host for Empty {
    /// #     fn balance(&self, _: Address) -> Result<U256, HostError> { Ok(U256::ZERO) }
    /// #     fn code(&self, _: Address) -> Result<Bytes, HostError> { Ok(Bytes::new()) }
    /// #     fn storage(&self, _: Address, _: U256) -> Result<U256, HostError> { Ok(U256::ZERO) }
    /// #     fn chain_id(&self) -> u64 { 1 }
    /// #     fn block_number(&self) -> u64 { 0 }
    /// #     fn block_timestamp(&self) -> u64 { 0 }
    /// # }
    ///
    /// // PUSH1 0x01, PUSH1 0x02, ADD, STOP
    /// let mut machine = Machine::new(
    ///     Context { gas_limit: 100_000, ..Default::default() },
    ///     &[0x60, 0x01, 0x60, 0x02, 0x01, 0x00],
    ///     21_000,
    /// );
    ///
    /// assert_eq!(machine.run(2, &Empty).expect("host error"), 2);
    /// assert!(machine.exit_status().is_none());
    ///
    /// assert_eq!(machine.run(10, &Empty).expect("host error"), 2);
    /// assert_eq!(machine.exit_status(), Some(&ExitStatus::Stop));
    /// assert_eq!(machine.stack.peek(0), U256::from(3));
    /// ```
    pub fn run<H: Host + ?Sized>(&mut self, step_limit: u64, host: &H) -> Result<u64, HostError> {
        let mut executed = 0u64;

        while self.exit.is_none() && executed < step_limit {
            if let Err(report) = self._step(host) {
                let report = match report.downcast::<HostError>() {
                    Ok(error) => return Err(error),
                    Err(report) => report,
                };
                let reason = report
                    .downcast::<HaltReason>()
                    .unwrap_or_else(|report| HaltReason::Internal(report.to_string()));

                debug!("execution halted at instruction {}: {reason}", self.instruction - 1);
                self.exit(ExitStatus::Halt(reason));
            }
            executed += 1;
        }

        self.steps += executed;
        Ok(executed)
    }

    /// Executes the code until finished
    pub fn execute<H: Host + ?Sized>(&mut self, host: &H) -> Result<ExecutionResult, HostError> {
        self.run(u64::MAX, host)?;
        self.result().ok_or_else(|| HostError::State("execution did not finish".to_string()))
    }

    /// The outcome of a finished execution, or `None` while the machine can still run.
    ///
    /// Logs and storage writes are only reported for successful executions.
    pub fn result(&self) -> Option<ExecutionResult> {
        let exit_status = self.exit.clone()?;
        let success = exit_status.is_success();

        Some(ExecutionResult {
            gas_used: self.gas_used,
            gas_remaining: self.gas_remaining,
            events: if success { self.events.clone() } else { Vec::new() },
            storage: if success { self.storage.storage.clone() } else { BTreeMap::new() },
            steps: self.steps,
            exit_status,
        })
    }
}
