use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// The [`Log`] struct represents a log emitted by a `LOG0-LOG4` opcode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Position of the log within the transaction.
    pub index: u64,
    /// The contract that emitted the log.
    pub address: Address,
    /// Indexed topics, in the order they were popped.
    pub topics: Vec<U256>,
    /// The unindexed log payload.
    pub data: Vec<u8>,
}

impl Log {
    /// Creates a new [`Log`] with the given log index, emitter, topics, and data.
    pub fn new(index: u64, address: Address, topics: Vec<U256>, data: &[u8]) -> Log {
        Log { index, address, topics, data: data.to_vec() }
    }
}
