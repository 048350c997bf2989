//! An in-memory account ledger: keys, accounts, instructions, atomic transactions and the
//! post-instruction checks a program must pass.

mod account;
mod context;
mod instruction;
mod pubkey;
mod runtime;

pub use account::{Account, AccountInfo, AccountMeta, SYSTEM_PROGRAM_ID};
pub use context::{Clock, InvokeContext, LogRecord, Rent, ACCOUNT_STORAGE_OVERHEAD};
pub use instruction::{Instruction, Transaction};
pub use pubkey::{Pubkey, MAX_SEEDS, MAX_SEED_LEN};
pub use runtime::{system_transfer, Entrypoint, Ledger, Receipt};
