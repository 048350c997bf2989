use crate::ledger::{AccountMeta, Pubkey};

/// A call into one program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// The program that processes the instruction.
    pub program_id: Pubkey,
    /// The accounts the program may read or modify, in the order it expects them.
    pub accounts: Vec<AccountMeta>,
    /// Program-defined input.
    pub data: Vec<u8>,
}

impl Instruction {
    /// Creates an instruction from raw bytes.
    pub fn new_with_bytes(program_id: Pubkey, data: &[u8], accounts: Vec<AccountMeta>) -> Self {
        Self { program_id, accounts, data: data.to_vec() }
    }
}

/// A list of instructions committed atomically, together with the keys that signed it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    /// The instructions, processed in order.
    pub instructions: Vec<Instruction>,
    /// The keys that signed the transaction.
    pub signers: Vec<Pubkey>,
}

impl Transaction {
    /// Creates a transaction signed by `signers`.
    pub fn new(instructions: Vec<Instruction>, signers: &[Pubkey]) -> Self {
        Self { instructions, signers: signers.to_vec() }
    }

    /// Returns `true` if `key` signed the transaction.
    pub fn is_signed_by(&self, key: &Pubkey) -> bool {
        self.signers.contains(key)
    }
}
