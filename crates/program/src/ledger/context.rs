use hashbrown::HashSet;
use tracing::trace;

use crate::{
    error::{Error, Result},
    ledger::{AccountInfo, Pubkey},
};

/// Fixed per-account overhead counted by the rent-exemption minimum, in bytes.
pub const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;

/// The rent-exemption schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rent {
    /// Lamports required per byte of account data, overhead included.
    pub lamports_per_byte: u64,
}

impl Rent {
    /// The smallest balance that keeps an account with `data_len` bytes alive.
    ///
    /// ```
    /// use shuttle_program::ledger::Rent;
    ///
    /// let rent = Rent { lamports_per_byte: 10 };
    /// assert_eq!(rent.minimum_balance(0), 1280);
    /// assert_eq!(rent.minimum_balance(72), 2000);
    /// ```
    pub fn minimum_balance(&self, data_len: usize) -> u64 {
        (ACCOUNT_STORAGE_OVERHEAD.saturating_add(data_len as u64))
            .saturating_mul(self.lamports_per_byte)
    }

    /// Returns `true` if `lamports` is enough for an account with `data_len` bytes.
    pub fn is_exempt(&self, lamports: u64, data_len: usize) -> bool {
        lamports >= self.minimum_balance(data_len)
    }
}

/// The ledger clock as seen by an instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    /// The current slot.
    pub slot: u64,
    /// The wall-clock time of the slot, in seconds since the unix epoch.
    pub unix_timestamp: u64,
}

/// A record a program emitted while processing an instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogRecord {
    /// A list of binary fields, the first of which names the record.
    Data(Vec<Vec<u8>>),
    /// A free-form message.
    Message(String),
}

/// Everything a program can reach besides its accounts while it processes an instruction.
#[derive(Debug)]
pub struct InvokeContext {
    program_id: Pubkey,
    clock: Clock,
    rent: Rent,
    logs: Vec<LogRecord>,
    created: HashSet<Pubkey>,
    signed: HashSet<Pubkey>,
}

impl InvokeContext {
    /// A fresh context for one instruction of `program_id`.
    pub fn new(program_id: Pubkey, clock: Clock, rent: Rent) -> Self {
        Self {
            program_id,
            clock,
            rent,
            logs: Vec::new(),
            created: HashSet::new(),
            signed: HashSet::new(),
        }
    }

    /// The program processing the instruction.
    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// The ledger clock.
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// The rent-exemption schedule.
    pub fn rent(&self) -> Rent {
        self.rent
    }

    /// Records a binary log entry.
    pub fn log_data(&mut self, fields: &[&[u8]]) {
        self.logs.push(LogRecord::Data(fields.iter().map(|field| field.to_vec()).collect()));
    }

    /// Records a message.
    pub fn log_msg(&mut self, message: impl Into<String>) {
        self.logs.push(LogRecord::Message(message.into()));
    }

    /// The records emitted so far.
    pub fn logs(&self) -> &[LogRecord] {
        &self.logs
    }

    pub(crate) fn into_logs(self) -> Vec<LogRecord> {
        self.logs
    }

    pub(crate) fn was_created(&self, key: &Pubkey) -> bool {
        self.created.contains(key)
    }

    pub(crate) fn has_signed(&self, key: &Pubkey) -> bool {
        self.signed.contains(key)
    }

    /// Moves lamports out of a signer through the system program.
    pub fn transfer(&mut self, from: &AccountInfo, to: &AccountInfo, lamports: u64) -> Result<()> {
        if !from.is_signer && !self.signed.contains(&from.key) {
            return Err(Error::AccountNotSigner(from.key));
        }
        from.transfer_lamports(to, lamports)
    }

    /// Moves lamports out of a system-owned account derived from this program, signing for it
    /// with `seeds`.
    pub fn transfer_signed(
        &mut self,
        from: &AccountInfo,
        to: &AccountInfo,
        lamports: u64,
        seeds: &[&[u8]],
    ) -> Result<()> {
        self.sign(from, seeds)?;
        self.transfer(from, to, lamports)
    }

    /// Creates an account at a program address derived from `seeds`, funded by `payer` and
    /// owned by this program.
    ///
    /// Lamports already held by `new` count towards the rent-exempt minimum.
    pub fn create_program_account(
        &mut self,
        payer: &AccountInfo,
        new: &AccountInfo,
        seeds: &[&[u8]],
        space: usize,
    ) -> Result<()> {
        self.sign(new, seeds)?;
        self.create_account(payer, new, space)
    }

    /// Creates an account at `create_with_seed(base, seed, program_id)`, funded by `payer` and
    /// owned by this program. `base` must have signed the transaction.
    pub fn create_account_with_seed(
        &mut self,
        payer: &AccountInfo,
        new: &AccountInfo,
        base: &AccountInfo,
        seed: &str,
        space: usize,
    ) -> Result<()> {
        if !base.is_signer {
            return Err(Error::AccountNotSigner(base.key));
        }
        let expected = Pubkey::create_with_seed(&base.key, seed, &self.program_id)?;
        if expected != new.key {
            return Err(Error::InvalidAccountKey(new.key));
        }
        self.create_account(payer, new, space)
    }

    fn sign(&mut self, account: &AccountInfo, seeds: &[&[u8]]) -> Result<()> {
        let expected = Pubkey::create_program_address(seeds, &self.program_id)?;
        if expected != account.key {
            return Err(Error::InvalidAccountKey(account.key));
        }
        self.signed.insert(account.key);
        Ok(())
    }

    fn create_account(&mut self, payer: &AccountInfo, new: &AccountInfo, space: usize) -> Result<()> {
        if !new.is_empty_system() {
            return Err(Error::AlreadyInitialized(new.key));
        }

        let required = self.rent.minimum_balance(space).saturating_sub(new.lamports());
        if required > 0 {
            self.transfer(payer, new, required)?;
        }
        new.realloc(space)?;
        new.assign(&self.program_id);
        self.created.insert(new.key);

        trace!("created account {} with {space} bytes", new.key);
        Ok(())
    }
}
