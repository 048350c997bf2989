/// Signed transaction decoding and sender recovery.
pub mod transaction;
