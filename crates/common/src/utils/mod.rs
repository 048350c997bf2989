/// Hexadecimal encoding utilities.
pub mod hex;

/// Input/output utilities for file manipulation.
pub mod io;

/// String and integer conversion utilities.
pub mod strings;
