use super::strings::encode_hex;
use alloy::primitives::{Address, Bytes, FixedBytes, U256};

/// A convenience function which encodes a given EVM type into a sized, lowercase hex string.
pub trait ToLowerHex {
    /// Encodes `self` as a lowercase, `0x`-prefixed hex string.
    fn to_lower_hex(&self) -> String;
}

impl ToLowerHex for Bytes {
    fn to_lower_hex(&self) -> String {
        format!("0x{}", encode_hex(self))
    }
}

impl ToLowerHex for [u8] {
    fn to_lower_hex(&self) -> String {
        format!("0x{}", encode_hex(self))
    }
}

impl ToLowerHex for Vec<u8> {
    fn to_lower_hex(&self) -> String {
        self.as_slice().to_lower_hex()
    }
}

impl ToLowerHex for U256 {
    fn to_lower_hex(&self) -> String {
        format!("{self:#x}")
    }
}

impl ToLowerHex for FixedBytes<32> {
    fn to_lower_hex(&self) -> String {
        format!("{self:#x}")
    }
}

impl ToLowerHex for Address {
    fn to_lower_hex(&self) -> String {
        format!("{self:#x}")
    }
}
