//! Error types for the common module

/// Errors that can occur while decoding or validating Ethereum transactions
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transaction bytes are malformed or the signature cannot be recovered
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// The transaction envelope is not a legacy transaction
    #[error("Unsupported transaction type: {0}")]
    UnsupportedTransactionType(u8),

    /// An arithmetic operation overflowed
    #[error("Integer overflow")]
    IntegerOverflow,

    /// An internal error
    #[error("Internal error: {0}")]
    Eyre(#[from] eyre::Report),
}
