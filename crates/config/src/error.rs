//! Error types for the configuration module

/// Errors that can occur while loading, editing or persisting the configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration file could not be located, read, written or removed
    #[error("Error: {0}")]
    Generic(String),

    /// A value or the file itself could not be parsed or serialized
    #[error("Parse error: {0}")]
    ParseError(String),

    /// `update` was given a key the configuration doesn't have
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// The parameters don't describe a usable protocol
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
