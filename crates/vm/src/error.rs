use alloy::primitives::Address;

/// Errors raised by a [`Host`](crate::core::host::Host) while the machine is running.
///
/// These are the only errors that escape [`Machine::run`](crate::core::vm::Machine::run); every
/// other fault ends execution with a halt status instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The machine touched an address the host cannot resolve.
    #[error("address {0} must be present in the transaction's account list")]
    AddressMustBePresent(Address),
    /// The host's backing state is corrupt or unreadable.
    #[error("host state error: {0}")]
    State(String),
}
