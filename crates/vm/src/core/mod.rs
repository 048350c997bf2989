/// The [`Host`](host::Host) seam through which the machine reads accounts
pub mod host;

/// Log implementation for event handling
pub mod log;

/// Memory implementation for VM memory management
pub mod memory;

/// Opcode definitions and static opcode information
pub mod opcodes;

/// Stack implementation for the VM
pub mod stack;

/// Journalled storage for the executing contract
pub mod storage;

/// Core virtual machine implementation
pub mod vm;
