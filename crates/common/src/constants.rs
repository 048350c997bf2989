/// Base cost charged for every transaction.
pub const TX_BASE_GAS: u64 = 21000;

/// Additional cost charged for transactions that create a contract.
pub const TX_CREATE_GAS: u64 = 32000;

/// Cost per zero byte of transaction calldata.
pub const TX_DATA_ZERO_GAS: u64 = 4;

/// Cost per non-zero byte of transaction calldata.
pub const TX_DATA_NON_ZERO_GAS: u64 = 16;
