//! EVM opcode constants and the static information the interpreter needs about each of them.

/// The name of an opcode and the gas charged before its handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpCodeInfo {
    name: &'static str,
    gas: u16,
}

impl OpCodeInfo {
    /// What bytes outside the table decode to.
    pub const UNKNOWN: Self = Self { name: "unknown", gas: 0 };

    /// The mnemonic, e.g. `SSTORE`.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The static part of the opcode's cost. Dynamic costs are charged by the handlers.
    #[inline]
    pub const fn min_gas(&self) -> u16 {
        self.gas
    }
}

impl From<u8> for OpCodeInfo {
    #[inline]
    fn from(opcode: u8) -> Self {
        OPCODE_INFO_TABLE[opcode as usize].unwrap_or(Self::UNKNOWN)
    }
}

// `0xNN NAME gas;` rows, in ascending order
macro_rules! opcodes {
    ($($val:literal $name:ident $gas:literal;)*) => {
        $(
            #[doc = concat!("`", stringify!($name), "` (", stringify!($val), ").")]
            pub const $name: u8 = $val;
        )*

        /// The info of every defined opcode, indexed by opcode.
        pub const OPCODE_INFO_TABLE: [Option<OpCodeInfo>; 256] = {
            let mut table = [None; 256];
            let mut last: Option<u8> = None;
            $(
                if let Some(last) = last {
                    assert!($val > last, "opcodes must be listed in ascending order");
                }
                last = Some($val);
                table[$val] = Some(OpCodeInfo { name: stringify!($name), gas: $gas });
            )*
            let _ = last;
            table
        };
    }
}

/// Returns `true` if `destination` is a `JUMPDEST` that is not part of a push's immediate data.
///
/// ```
/// use shuttle_vm::core::opcodes::is_valid_jumpdest;
///
/// // PUSH1 0x5b JUMPDEST
/// let code = [0x60, 0x5b, 0x5b];
/// assert!(!is_valid_jumpdest(&code, 1));
/// assert!(is_valid_jumpdest(&code, 2));
/// ```
pub fn is_valid_jumpdest(code: &[u8], destination: usize) -> bool {
    if code.get(destination) != Some(&JUMPDEST) {
        return false;
    }

    let mut pc = 0;
    while pc < destination {
        let opcode = code[pc];
        pc += 1;
        if (PUSH1..=PUSH32).contains(&opcode) {
            pc += (opcode - PUSH0) as usize;
        }
    }
    pc == destination
}

opcodes! {
    0x00 STOP 0;

    0x01 ADD 3;
    0x02 MUL 5;
    0x03 SUB 3;
    0x04 DIV 5;
    0x05 SDIV 5;
    0x06 MOD 5;
    0x07 SMOD 5;
    0x08 ADDMOD 8;
    0x09 MULMOD 8;
    0x0a EXP 10;
    0x0b SIGNEXTEND 5;

    0x10 LT 3;
    0x11 GT 3;
    0x12 SLT 3;
    0x13 SGT 3;
    0x14 EQ 3;
    0x15 ISZERO 3;
    0x16 AND 3;
    0x17 OR 3;
    0x18 XOR 3;
    0x19 NOT 3;
    0x1a BYTE 3;
    0x1b SHL 3;
    0x1c SHR 3;
    0x1d SAR 3;

    0x20 SHA3 30;

    0x30 ADDRESS 2;
    0x31 BALANCE 100;
    0x32 ORIGIN 2;
    0x33 CALLER 2;
    0x34 CALLVALUE 2;
    0x35 CALLDATALOAD 3;
    0x36 CALLDATASIZE 2;
    0x37 CALLDATACOPY 3;
    0x38 CODESIZE 2;
    0x39 CODECOPY 3;
    0x3a GASPRICE 2;
    0x3b EXTCODESIZE 100;
    0x3c EXTCODECOPY 100;
    0x3d RETURNDATASIZE 2;
    0x3e RETURNDATACOPY 3;
    0x3f EXTCODEHASH 100;
    0x40 BLOCKHASH 20;
    0x41 COINBASE 2;
    0x42 TIMESTAMP 2;
    0x43 NUMBER 2;
    0x44 PREVRANDAO 2;
    0x45 GASLIMIT 2;
    0x46 CHAINID 2;
    0x47 SELFBALANCE 5;
    0x48 BASEFEE 2;
    0x49 BLOBHASH 3;
    0x4a BLOBBASEFEE 2;

    0x50 POP 2;
    0x51 MLOAD 3;
    0x52 MSTORE 3;
    0x53 MSTORE8 3;
    0x54 SLOAD 0;
    0x55 SSTORE 0;
    0x56 JUMP 8;
    0x57 JUMPI 10;
    0x58 PC 2;
    0x59 MSIZE 2;
    0x5a GAS 2;
    0x5b JUMPDEST 1;
    0x5c TLOAD 100;
    0x5d TSTORE 100;
    0x5e MCOPY 3;

    0x5f PUSH0 3;
    0x60 PUSH1 3;
    0x61 PUSH2 3;
    0x62 PUSH3 3;
    0x63 PUSH4 3;
    0x64 PUSH5 3;
    0x65 PUSH6 3;
    0x66 PUSH7 3;
    0x67 PUSH8 3;
    0x68 PUSH9 3;
    0x69 PUSH10 3;
    0x6a PUSH11 3;
    0x6b PUSH12 3;
    0x6c PUSH13 3;
    0x6d PUSH14 3;
    0x6e PUSH15 3;
    0x6f PUSH16 3;
    0x70 PUSH17 3;
    0x71 PUSH18 3;
    0x72 PUSH19 3;
    0x73 PUSH20 3;
    0x74 PUSH21 3;
    0x75 PUSH22 3;
    0x76 PUSH23 3;
    0x77 PUSH24 3;
    0x78 PUSH25 3;
    0x79 PUSH26 3;
    0x7a PUSH27 3;
    0x7b PUSH28 3;
    0x7c PUSH29 3;
    0x7d PUSH30 3;
    0x7e PUSH31 3;
    0x7f PUSH32 3;

    0x80 DUP1 3;
    0x81 DUP2 3;
    0x82 DUP3 3;
    0x83 DUP4 3;
    0x84 DUP5 3;
    0x85 DUP6 3;
    0x86 DUP7 3;
    0x87 DUP8 3;
    0x88 DUP9 3;
    0x89 DUP10 3;
    0x8a DUP11 3;
    0x8b DUP12 3;
    0x8c DUP13 3;
    0x8d DUP14 3;
    0x8e DUP15 3;
    0x8f DUP16 3;

    0x90 SWAP1 3;
    0x91 SWAP2 3;
    0x92 SWAP3 3;
    0x93 SWAP4 3;
    0x94 SWAP5 3;
    0x95 SWAP6 3;
    0x96 SWAP7 3;
    0x97 SWAP8 3;
    0x98 SWAP9 3;
    0x99 SWAP10 3;
    0x9a SWAP11 3;
    0x9b SWAP12 3;
    0x9c SWAP13 3;
    0x9d SWAP14 3;
    0x9e SWAP15 3;
    0x9f SWAP16 3;

    0xa0 LOG0 375;
    0xa1 LOG1 750;
    0xa2 LOG2 1125;
    0xa3 LOG3 1500;
    0xa4 LOG4 1875;

    0xf0 CREATE 32000;
    0xf1 CALL 100;
    0xf2 CALLCODE 100;
    0xf3 RETURN 0;
    0xf4 DELEGATECALL 100;
    0xf5 CREATE2 32000;
    0xfa STATICCALL 100;
    0xfd REVERT 0;
    0xfe INVALID 0;
    0xff SELFDESTRUCT 5000;
}
