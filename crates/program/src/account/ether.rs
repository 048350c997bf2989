//! Shadow accounts mirror an Ethereum address on the ledger: its nonce, balance, code and
//! storage, plus the lock that in-flight transactions hold on it.

use std::collections::BTreeMap;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    account::{read_record, record_len, write_record, TAG_EMPTY, TAG_ETHER},
    error::{Error, Result},
    ledger::{Account, AccountInfo, InvokeContext, Pubkey, Rent},
};

/// Seed prefix of shadow account addresses.
pub const ACCOUNT_SEED: &[u8] = b"ACCOUNT";

/// The exclusivity flag in-flight transactions hold on a shadow account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lock {
    /// No transaction uses the account.
    #[default]
    Free,
    /// The given number of transactions read the account.
    Read(u32),
    /// One transaction may modify the account.
    Write,
}

/// The shadow record of an Ethereum address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtherAccount {
    /// The mirrored address.
    pub address: Address,
    /// Number of transactions the address has sent.
    pub nonce: u64,
    /// Balance in wei.
    pub balance: U256,
    /// The lock in-flight transactions hold.
    pub lock: Lock,
    /// Deployed code, empty for externally owned accounts.
    pub code: Vec<u8>,
    /// Committed contract storage. Zero values are not stored.
    pub storage: BTreeMap<U256, U256>,
}

impl EtherAccount {
    /// An empty record for `address`.
    pub fn new(address: Address) -> Self {
        Self { address, ..Default::default() }
    }

    /// The ledger key of the shadow account of `address`, and its bump seed.
    ///
    /// ```
    /// use alloy::primitives::Address;
    /// use shuttle_program::{account::EtherAccount, ledger::Pubkey};
    ///
    /// let program_id = Pubkey::new_unique();
    /// let (key, _) = EtherAccount::key(&program_id, Address::repeat_byte(1));
    /// assert_ne!(key, EtherAccount::key(&program_id, Address::repeat_byte(2)).0);
    /// ```
    pub fn key(program_id: &Pubkey, address: Address) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[ACCOUNT_SEED, address.as_slice()], program_id)
    }

    /// Loads and verifies the shadow account stored in `info`.
    pub fn from_account(program_id: &Pubkey, info: &AccountInfo) -> Result<Self> {
        let account: Self = read_record(program_id, info, TAG_ETHER)?;
        if Self::key(program_id, account.address).0 != info.key {
            return Err(Error::InvalidAccountKey(info.key));
        }
        Ok(account)
    }

    /// Decodes the shadow account stored at `key` outside of an instruction.
    pub fn from_ledger_account(program_id: &Pubkey, key: &Pubkey, account: &Account) -> Result<Self> {
        if account.owner != *program_id {
            return Err(Error::InvalidAccountOwner(*key));
        }
        let record: Self = match account.data.split_first() {
            Some((&TAG_ETHER, rest)) => bincode::deserialize(rest)?,
            Some((tag, _)) => return Err(Error::InvalidTag(*key, *tag)),
            None => return Err(Error::InvalidTag(*key, TAG_EMPTY)),
        };
        if Self::key(program_id, record.address).0 != *key {
            return Err(Error::InvalidAccountKey(*key));
        }
        Ok(record)
    }

    /// A rent-exempt ledger account holding this record, for seeding a ledger directly.
    pub fn to_ledger_account(&self, program_id: &Pubkey, rent: &Rent) -> Result<Account> {
        let mut data = vec![TAG_ETHER];
        data.extend(bincode::serialize(self)?);
        Ok(Account { lamports: rent.minimum_balance(data.len()), data, owner: *program_id })
    }

    /// Creates the shadow account of `self.address` at `info`, funded by `payer`.
    pub fn create(
        &self,
        ctx: &mut InvokeContext,
        info: &AccountInfo,
        payer: &AccountInfo,
    ) -> Result<()> {
        let (_, bump) = Self::key(ctx.program_id(), self.address);
        let space = record_len(self)?;
        ctx.create_program_account(
            payer,
            info,
            &[ACCOUNT_SEED, self.address.as_slice(), &[bump]],
            space,
        )?;
        self.save(ctx, info, payer)
    }

    /// Persists the record. `payer` funds any growth.
    pub fn save(&self, ctx: &mut InvokeContext, info: &AccountInfo, payer: &AccountInfo) -> Result<()> {
        write_record(ctx, info, payer, TAG_ETHER, self, 0)
    }

    /// Returns `true` if the record carries nothing worth keeping on the ledger.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code.is_empty() && self.storage.is_empty()
    }

    /// Writes `value` to storage slot `key`, dropping zeroes.
    pub fn set_storage(&mut self, key: U256, value: U256) {
        if value.is_zero() {
            self.storage.remove(&key);
        } else {
            self.storage.insert(key, value);
        }
    }
}
