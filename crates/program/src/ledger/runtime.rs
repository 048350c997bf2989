use std::{cell::RefCell, fmt, rc::Rc};

use hashbrown::HashMap;
use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    ledger::{
        Account, AccountInfo, AccountMeta, Clock, Instruction, InvokeContext, LogRecord, Pubkey,
        Rent, Transaction, SYSTEM_PROGRAM_ID,
    },
};

/// A program the ledger can invoke.
pub trait Entrypoint: fmt::Debug {
    /// Processes one instruction. Any error aborts the whole ledger transaction.
    fn process_instruction(
        &self,
        ctx: &mut InvokeContext,
        accounts: &[AccountInfo],
        data: &[u8],
    ) -> Result<()>;
}

/// The outcome of a committed ledger transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Receipt {
    /// Every record emitted by the transaction's instructions, in order.
    pub logs: Vec<LogRecord>,
}

impl Receipt {
    /// The fields after the name of the last data record called `name`.
    pub fn data(&self, name: &[u8]) -> Option<&[Vec<u8>]> {
        self.logs.iter().rev().find_map(|record| match record {
            LogRecord::Data(fields) if fields.first().map(Vec::as_slice) == Some(name) => {
                Some(&fields[1..])
            }
            _ => None,
        })
    }

    /// Every message record, in order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.logs.iter().filter_map(|record| match record {
            LogRecord::Message(message) => Some(message.as_str()),
            LogRecord::Data(_) => None,
        })
    }
}

/// An in-memory account ledger.
///
/// Transactions are atomic: every instruction is processed against a working copy of the
/// accounts it names, which is committed only if all of them succeed.
#[derive(Clone, Debug)]
pub struct Ledger {
    accounts: HashMap<Pubkey, Account>,
    programs: HashMap<Pubkey, Rc<dyn Entrypoint>>,
    clock: Clock,
    rent: Rent,
}

impl Ledger {
    /// An empty ledger at slot 0 with the builtin system program deployed.
    pub fn new(rent: Rent) -> Self {
        let mut programs: HashMap<Pubkey, Rc<dyn Entrypoint>> = HashMap::new();
        programs.insert(SYSTEM_PROGRAM_ID, Rc::new(SystemProgram));

        Self { accounts: HashMap::new(), programs, clock: Clock::default(), rent }
    }

    /// Deploys `program` at `program_id`.
    pub fn add_program(&mut self, program_id: Pubkey, program: Rc<dyn Entrypoint>) {
        self.programs.insert(program_id, program);
    }

    /// The account stored at `key`, if any.
    pub fn account(&self, key: &Pubkey) -> Option<&Account> {
        self.accounts.get(key)
    }

    /// Stores `account` at `key`, replacing whatever was there.
    pub fn set_account(&mut self, key: Pubkey, account: Account) {
        self.accounts.insert(key, account);
    }

    /// Credits `lamports` to `key`, creating a system account if needed.
    pub fn airdrop(&mut self, key: Pubkey, lamports: u64) {
        let account = self.accounts.entry(key).or_default();
        account.lamports = account.lamports.saturating_add(lamports);
    }

    /// The balance of `key`, zero if the account does not exist.
    pub fn lamports(&self, key: &Pubkey) -> u64 {
        self.accounts.get(key).map_or(0, |account| account.lamports)
    }

    /// The ledger clock.
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// The current slot.
    pub fn slot(&self) -> u64 {
        self.clock.slot
    }

    /// The rent-exemption schedule.
    pub fn rent(&self) -> Rent {
        self.rent
    }

    /// Moves the clock forward to `slot`, advancing time by 400ms per slot.
    pub fn warp_to_slot(&mut self, slot: u64) {
        let elapsed = slot.saturating_sub(self.clock.slot);
        self.clock.unix_timestamp =
            self.clock.unix_timestamp.saturating_add(elapsed.saturating_mul(2) / 5);
        self.clock.slot = slot;
    }

    /// Processes every instruction of `transaction`, committing their effects only if all of
    /// them succeed.
    pub fn process_transaction(&mut self, transaction: &Transaction) -> Result<Receipt> {
        let mut working: HashMap<Pubkey, Account> = HashMap::new();
        let mut logs = Vec::new();

        for (index, instruction) in transaction.instructions.iter().enumerate() {
            let records = self
                .process_instruction(&mut working, transaction, instruction)
                .inspect_err(|e| debug!("instruction {index} failed: {e}"))?;
            logs.extend(records);
        }

        for (key, account) in working {
            if account.lamports == 0 {
                trace!("purging account {key}");
                self.accounts.remove(&key);
            } else {
                self.accounts.insert(key, account);
            }
        }

        Ok(Receipt { logs })
    }

    fn process_instruction(
        &self,
        working: &mut HashMap<Pubkey, Account>,
        transaction: &Transaction,
        instruction: &Instruction,
    ) -> Result<Vec<LogRecord>> {
        let program = self
            .programs
            .get(&instruction.program_id)
            .cloned()
            .ok_or(Error::ProgramNotFound(instruction.program_id))?;

        // duplicate keys share one account; their flags are merged
        let mut shared: HashMap<Pubkey, (Rc<RefCell<Account>>, bool, bool)> = HashMap::new();
        for meta in &instruction.accounts {
            if meta.is_signer && !transaction.is_signed_by(&meta.pubkey) {
                return Err(Error::AccountNotSigner(meta.pubkey));
            }
            let entry = shared.entry(meta.pubkey).or_insert_with(|| {
                let account = working
                    .get(&meta.pubkey)
                    .or_else(|| self.accounts.get(&meta.pubkey))
                    .cloned()
                    .unwrap_or_default();
                (Rc::new(RefCell::new(account)), false, false)
            });
            entry.1 |= meta.is_signer;
            entry.2 |= meta.is_writable;
        }

        let pre: HashMap<Pubkey, Account> = shared
            .iter()
            .map(|(key, (account, _, _))| (*key, account.borrow().clone()))
            .collect();

        let infos: Vec<AccountInfo> = instruction
            .accounts
            .iter()
            .filter_map(|meta| {
                shared.get(&meta.pubkey).map(|(account, is_signer, is_writable)| {
                    AccountInfo::new(meta.pubkey, *is_signer, *is_writable, account.clone())
                })
            })
            .collect();

        let mut ctx = InvokeContext::new(instruction.program_id, self.clock, self.rent);
        program.process_instruction(&mut ctx, &infos, &instruction.data)?;
        drop(infos);

        self.verify(&ctx, &pre, &shared)?;

        for (key, (account, _, _)) in shared {
            working.insert(key, account.borrow().clone());
        }
        Ok(ctx.into_logs())
    }

    fn verify(
        &self,
        ctx: &InvokeContext,
        pre: &HashMap<Pubkey, Account>,
        shared: &HashMap<Pubkey, (Rc<RefCell<Account>>, bool, bool)>,
    ) -> Result<()> {
        let program_id = ctx.program_id();
        let mut before = 0u128;
        let mut after = 0u128;

        for (key, (account, is_signer, is_writable)) in shared {
            let post = account.borrow();
            let Some(pre) = pre.get(key) else {
                return Err(Error::Internal(format!("missing pre-state for {key}")));
            };
            before += u128::from(pre.lamports);
            after += u128::from(post.lamports);

            if *post == *pre {
                continue;
            }
            if !is_writable {
                return Err(Error::AccountNotWritable(*key));
            }

            let owned = pre.owner == *program_id || ctx.was_created(key);
            if (post.data != pre.data || post.owner != pre.owner) && !owned {
                return Err(Error::InvalidAccountOwner(*key));
            }
            if post.lamports < pre.lamports &&
                !(pre.owner == *program_id || *is_signer || ctx.has_signed(key))
            {
                return Err(Error::InvalidAccountOwner(*key));
            }
            if post.lamports > 0 && !self.rent.is_exempt(post.lamports, post.data.len()) {
                return Err(Error::RentNotExempt(*key));
            }
        }

        if before != after {
            return Err(Error::UnbalancedInstruction(before, after));
        }
        Ok(())
    }
}

/// The builtin program that owns fresh accounts. It supports lamport transfers only.
#[derive(Debug)]
struct SystemProgram;

/// Instruction tag of a system transfer.
const SYSTEM_TRANSFER: u32 = 2;

impl Entrypoint for SystemProgram {
    fn process_instruction(
        &self,
        ctx: &mut InvokeContext,
        accounts: &[AccountInfo],
        data: &[u8],
    ) -> Result<()> {
        let (tag, lamports) = match (data.get(0..4), data.get(4..12)) {
            (Some(tag), Some(lamports)) => (
                u32::from_le_bytes(tag.try_into().map_err(|_| invalid_system_data())?),
                u64::from_le_bytes(lamports.try_into().map_err(|_| invalid_system_data())?),
            ),
            _ => return Err(invalid_system_data()),
        };
        if tag != SYSTEM_TRANSFER {
            return Err(Error::InvalidInstruction(format!("unsupported system instruction {tag}")));
        }

        let [from, to, ..] = accounts else {
            return Err(Error::NotEnoughAccounts(2, accounts.len()));
        };
        ctx.transfer(from, to, lamports)
    }
}

fn invalid_system_data() -> Error {
    Error::InvalidInstruction("malformed system instruction".to_string())
}

/// A system instruction moving `lamports` from the signer `from` to `to`.
pub fn system_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    let mut data = SYSTEM_TRANSFER.to_le_bytes().to_vec();
    data.extend_from_slice(&lamports.to_le_bytes());
    Instruction::new_with_bytes(
        SYSTEM_PROGRAM_ID,
        &data,
        vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
    )
}
