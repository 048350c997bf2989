use alloy::primitives::{Address, Bytes, U256};
use hashbrown::HashMap;
use shuttle_vm::error::HostError;
use tracing::trace;

use crate::{
    account::EtherAccount,
    error::{Error, Result},
    executor::host::AccountSource,
    ledger::{AccountInfo, InvokeContext, Pubkey},
};

#[derive(Debug)]
struct Entry<'a> {
    info: &'a AccountInfo,
    account: Option<EtherAccount>,
    dirty: bool,
}

/// The shadow accounts an instruction passed, decoded once and written back on
/// [`AccountsDb::flush`].
///
/// The listed accounts keep the order they were passed in. The operator's balance account may
/// be tracked alongside them without being listed.
#[derive(Debug)]
pub struct AccountsDb<'a> {
    program_id: Pubkey,
    entries: Vec<Entry<'a>>,
    listed: usize,
    index: HashMap<Pubkey, usize>,
}

impl<'a> AccountsDb<'a> {
    /// Decodes `listed` and, if it isn't one of them, `operator_balance`.
    ///
    /// Listed accounts must be writable and unique. Accounts that hold no data are tracked as
    /// missing.
    pub fn new(
        program_id: &Pubkey,
        listed: &'a [AccountInfo],
        operator_balance: Option<&'a AccountInfo>,
    ) -> Result<Self> {
        let mut db = Self {
            program_id: *program_id,
            entries: Vec::with_capacity(listed.len() + 1),
            listed: listed.len(),
            index: HashMap::with_capacity(listed.len() + 1),
        };

        for info in listed {
            if !info.is_writable {
                return Err(Error::AccountNotWritable(info.key));
            }
            if db.index.contains_key(&info.key) {
                return Err(Error::InvalidAccountKey(info.key));
            }
            db.push(info)?;
        }

        if let Some(info) = operator_balance {
            if !info.is_writable {
                return Err(Error::AccountNotWritable(info.key));
            }
            if info.is_empty_system() {
                return Err(Error::InvalidAccountOwner(info.key));
            }
            if !db.index.contains_key(&info.key) {
                db.push(info)?;
            }
        }
        Ok(db)
    }

    fn push(&mut self, info: &'a AccountInfo) -> Result<()> {
        let account = if info.is_empty_system() {
            None
        } else {
            Some(EtherAccount::from_account(&self.program_id, info)?)
        };
        self.index.insert(info.key, self.entries.len());
        self.entries.push(Entry { info, account, dirty: false });
        Ok(())
    }

    /// The program the accounts belong to.
    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// The ledger key of the shadow account of `address`.
    pub fn key(&self, address: Address) -> Pubkey {
        EtherAccount::key(&self.program_id, address).0
    }

    /// Returns `true` if `key` was passed as a listed account.
    pub fn is_listed(&self, key: &Pubkey) -> bool {
        self.index.get(key).is_some_and(|position| *position < self.listed)
    }

    /// The listed accounts, in order, with their records if they exist.
    pub fn listed(&self) -> impl Iterator<Item = (&'a AccountInfo, Option<&EtherAccount>)> + '_ {
        self.entries[..self.listed].iter().map(|entry| (entry.info, entry.account.as_ref()))
    }

    /// The record of `address`, `None` if its account doesn't exist yet.
    pub fn get(&self, address: Address) -> Result<Option<&EtherAccount>> {
        let position = self.position(address)?;
        Ok(self.entries[position].account.as_ref())
    }

    /// The record of `address`, created empty if its account doesn't exist yet.
    pub fn get_mut(&mut self, address: Address) -> Result<&mut EtherAccount> {
        let position = self.position(address)?;
        let entry = &mut self.entries[position];
        entry.dirty = true;
        Ok(entry.account.get_or_insert_with(|| EtherAccount::new(address)))
    }

    /// The record stored under `key`, for lock bookkeeping.
    pub(crate) fn get_by_key_mut(&mut self, key: &Pubkey) -> Option<&mut EtherAccount> {
        let position = *self.index.get(key)?;
        let entry = &mut self.entries[position];
        let account = entry.account.as_mut()?;
        entry.dirty = true;
        Some(account)
    }

    /// The record stored under `key`.
    pub(crate) fn get_by_key(&self, key: &Pubkey) -> Option<&EtherAccount> {
        self.index.get(key).and_then(|position| self.entries[*position].account.as_ref())
    }

    fn position(&self, address: Address) -> Result<usize> {
        self.index
            .get(&self.key(address))
            .copied()
            .ok_or(Error::AddressMustBePresent(address))
    }

    /// Writes every modified record back to its account. Accounts that don't exist yet are
    /// created, unless their record is empty. `payer` funds creation and growth.
    pub fn flush(&mut self, ctx: &mut InvokeContext, payer: &AccountInfo) -> Result<()> {
        for entry in self.entries.iter_mut().filter(|entry| entry.dirty) {
            let Some(account) = &entry.account else { continue };

            if entry.info.is_empty_system() {
                if account.is_empty() {
                    continue;
                }
                trace!("materializing shadow account of {}", account.address);
                account.create(ctx, entry.info, payer)?;
            } else {
                account.save(ctx, entry.info, payer)?;
            }
            entry.dirty = false;
        }
        Ok(())
    }
}

impl AccountSource for AccountsDb<'_> {
    fn balance(&self, address: Address) -> std::result::Result<U256, HostError> {
        Ok(self.lookup(address)?.map_or(U256::ZERO, |account| account.balance))
    }

    fn code(&self, address: Address) -> std::result::Result<Bytes, HostError> {
        Ok(self
            .lookup(address)?
            .map_or_else(Bytes::new, |account| Bytes::copy_from_slice(&account.code)))
    }

    fn storage(&self, address: Address, key: U256) -> std::result::Result<U256, HostError> {
        Ok(self
            .lookup(address)?
            .and_then(|account| account.storage.get(&key).copied())
            .unwrap_or_default())
    }
}

impl AccountsDb<'_> {
    fn lookup(&self, address: Address) -> std::result::Result<Option<&EtherAccount>, HostError> {
        self.get(address).map_err(|_| HostError::AddressMustBePresent(address))
    }
}
