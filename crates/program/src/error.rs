//! Error types for the program

use alloy::primitives::{Address, B256, U256};
use shuttle_vm::error::HostError;

use crate::ledger::Pubkey;

/// Errors that can occur while processing a program instruction or a ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The transaction's nonce differs from the sender's current nonce
    #[error("Invalid nonce: {sender} has nonce {expected}, transaction has {actual}")]
    InvalidNonce {
        /// The transaction sender
        sender: Address,
        /// The sender's current nonce
        expected: u64,
        /// The transaction's nonce
        actual: u64,
    },

    /// The transaction targets another chain, or has no chain id where one is required
    #[error("Invalid chain id: {0:?}")]
    InvalidChainId(Option<u64>),

    /// The sender cannot cover `value + gas_limit × gas_price`
    #[error("Insufficient funds: {sender} has {balance}, needs {required}")]
    InsufficientFunds {
        /// The transaction sender
        sender: Address,
        /// The sender's balance
        balance: U256,
        /// The balance the transaction needs
        required: U256,
    },

    /// The gas limit does not cover the intrinsic cost of the transaction
    #[error("Out of gas: limit {gas_limit} below intrinsic gas {intrinsic}")]
    OutOfGas {
        /// The transaction's gas limit
        gas_limit: u64,
        /// The intrinsic gas of the transaction
        intrinsic: u64,
    },

    /// Execution touched an address that was not listed with the instruction
    #[error("Address {0} must be present in the transaction's account list")]
    AddressMustBePresent(Address),

    /// The treasury account does not match the derived pool address
    #[error("Invalid treasury account {0} for pool index {1}")]
    InvalidTreasuryAccount(Pubkey, u32),

    /// Another operator bound the transaction and its priority window has not elapsed
    #[error("Operator {operator} is not authorized to continue, bound to {bound}")]
    NotAuthorizedOperator {
        /// The operator that sent the instruction
        operator: Pubkey,
        /// The operator the transaction is bound to
        bound: Pubkey,
    },

    /// The transaction already completed or was cancelled
    #[error("Transaction {0} is already finalized")]
    AlreadyFinalized(B256),

    /// Another in-flight transaction holds a conflicting lock on the account
    #[error("Account {0} is locked by another transaction")]
    LockedAccount(Pubkey),

    /// The account is not tagged as the operation requires
    #[error("Account {0} has an invalid tag {1}")]
    InvalidTag(Pubkey, u8),

    /// The derived account address already holds data
    #[error("Account {0} is already initialized")]
    AlreadyInitialized(Pubkey),

    /// A write does not fit the allocated holder capacity
    #[error("Account {0} is too small: {1} bytes needed, {2} available")]
    AccountSizeOverflow(Pubkey, u64, u64),

    /// An offset or length computation overflowed
    #[error("Integer overflow")]
    IntegerOverflow,

    /// The signer is not the owner of the holder
    #[error("Holder {holder} is owned by {owner}, not {signer}")]
    HolderInvalidOwner {
        /// The holder account
        holder: Pubkey,
        /// The recorded owner
        owner: Pubkey,
        /// The operator that sent the instruction
        signer: Pubkey,
    },

    /// The transaction hash differs from the one the account was written or bound with
    #[error("Invalid transaction hash: expected {0}, got {1}")]
    HolderInvalidHash(B256, B256),

    /// An iterative step was requested with fewer steps than allowed
    #[error("Step limit {0} below minimum {1}")]
    StepLimitBelowMinimum(u64, u64),

    /// Single-shot execution did not finish within its step budget
    #[error("Transaction did not finish within {0} steps")]
    StepLimitExceeded(u64),

    /// The signed transaction could not be decoded
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// An account record could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),

    /// Fewer accounts than the instruction requires
    #[error("Not enough accounts: {0} required, {1} given")]
    NotEnoughAccounts(usize, usize),

    /// The instruction data is malformed or the tag is unknown
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),

    /// A modified account was not marked writable
    #[error("Account {0} is not writable")]
    AccountNotWritable(Pubkey),

    /// A required signature is missing
    #[error("Account {0} did not sign the transaction")]
    AccountNotSigner(Pubkey),

    /// The account key does not match its derivation
    #[error("Invalid account key {0}")]
    InvalidAccountKey(Pubkey),

    /// The account is owned by another program, or modified by a program that does not own it
    #[error("Account {0} has an invalid owner")]
    InvalidAccountOwner(Pubkey),

    /// The listed accounts differ from the ones recorded when the transaction was bound
    #[error("Account list does not match the bound transaction: {0}")]
    AccountsMismatch(String),

    /// The account cannot pay the requested lamports
    #[error("Account {0} has insufficient lamports: {1} needed")]
    InsufficientLamports(Pubkey, u64),

    /// The instruction created or destroyed lamports
    #[error("Instruction changed the total lamports from {0} to {1}")]
    UnbalancedInstruction(u128, u128),

    /// The account would fall below its rent-exempt minimum
    #[error("Account {0} is not rent exempt")]
    RentNotExempt(Pubkey),

    /// The seeds cannot derive an address
    #[error("Invalid seeds: {0}")]
    InvalidSeeds(String),

    /// No program is deployed at the key
    #[error("Program {0} not found")]
    ProgramNotFound(Pubkey),

    /// An internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<shuttle_common::error::Error> for Error {
    fn from(error: shuttle_common::error::Error) -> Self {
        match error {
            shuttle_common::error::Error::IntegerOverflow => Error::IntegerOverflow,
            other => Error::InvalidTransaction(other.to_string()),
        }
    }
}

impl From<HostError> for Error {
    fn from(error: HostError) -> Self {
        match error {
            HostError::AddressMustBePresent(address) => Error::AddressMustBePresent(address),
            HostError::State(message) => Error::Internal(message),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(error: bincode::Error) -> Self {
        Error::Codec(error.to_string())
    }
}

impl From<eyre::Report> for Error {
    fn from(error: eyre::Report) -> Self {
        Error::Internal(error.to_string())
    }
}

/// Result alias used throughout the program
pub type Result<T> = std::result::Result<T, Error>;
