//! Holder accounts buffer a signed transaction that is too large for one instruction.
//!
//! Layout: `tag (1) | owner (32) | transaction hash (32) | transaction length (8, LE) | buffer`.
//! A finalized holder keeps the same header with the length zeroed.

use alloy::primitives::{keccak256, B256};
use tracing::trace;

use crate::{
    account::{tag, validate_owner, TAG_FINALIZED, TAG_HOLDER},
    error::{Error, Result},
    ledger::{AccountInfo, Pubkey},
};

const OWNER_OFFSET: usize = 1;
const HASH_OFFSET: usize = OWNER_OFFSET + 32;
const LEN_OFFSET: usize = HASH_OFFSET + 32;

/// Length of the holder header, tag included. The buffer starts here.
pub const HOLDER_HEADER_LEN: usize = LEN_OFFSET + 8;

/// A holder account.
#[derive(Debug)]
pub struct Holder<'a> {
    info: &'a AccountInfo,
    /// The operator allowed to write, execute and delete the holder.
    pub owner: Pubkey,
    /// The hash the buffered transaction is being written under.
    pub transaction_hash: B256,
    /// The number of buffered bytes.
    pub transaction_len: u64,
}

impl<'a> Holder<'a> {
    /// Initializes a freshly allocated account as an empty holder of `owner`.
    pub fn init(info: &'a AccountInfo, owner: Pubkey) -> Result<Self> {
        if info.data_len() < HOLDER_HEADER_LEN {
            return Err(Error::AccountSizeOverflow(
                info.key,
                HOLDER_HEADER_LEN as u64,
                info.data_len() as u64,
            ));
        }

        let mut holder = Self { info, owner, transaction_hash: B256::ZERO, transaction_len: 0 };
        info.try_borrow_mut_data()?.fill(0);
        holder.save(TAG_HOLDER)?;
        Ok(holder)
    }

    /// Loads a holder.
    pub fn from_account(program_id: &Pubkey, info: &'a AccountInfo) -> Result<Self> {
        match tag(program_id, info)? {
            TAG_HOLDER => Self::load(info),
            other => Err(Error::InvalidTag(info.key, other)),
        }
    }

    /// Loads a holder for writing. A finalized holder is turned back into an empty holder with
    /// the same owner.
    pub fn from_account_for_write(program_id: &Pubkey, info: &'a AccountInfo) -> Result<Self> {
        match tag(program_id, info)? {
            TAG_HOLDER => Self::load(info),
            TAG_FINALIZED => {
                let finalized = Finalized::from_account(program_id, info)?;
                let mut holder = Self {
                    info,
                    owner: finalized.owner,
                    transaction_hash: finalized.transaction_hash,
                    transaction_len: 0,
                };
                holder.clear()?;
                Ok(holder)
            }
            other => Err(Error::InvalidTag(info.key, other)),
        }
    }

    fn load(info: &'a AccountInfo) -> Result<Self> {
        let (owner, transaction_hash, transaction_len) = read_header(info)?;
        Ok(Self { info, owner, transaction_hash, transaction_len })
    }

    /// The holder's ledger account.
    pub fn info(&self) -> &'a AccountInfo {
        self.info
    }

    /// The number of bytes the buffer can hold.
    pub fn capacity(&self) -> u64 {
        self.info.data_len().saturating_sub(HOLDER_HEADER_LEN) as u64
    }

    /// Fails unless `operator` owns the holder.
    pub fn validate_owner(&self, operator: &Pubkey) -> Result<()> {
        if self.owner != *operator {
            return Err(Error::HolderInvalidOwner {
                holder: self.info.key,
                owner: self.owner,
                signer: *operator,
            });
        }
        Ok(())
    }

    /// Switches the holder to `transaction_hash`, discarding the buffer if the hash changes.
    pub fn update_hash(&mut self, transaction_hash: B256) -> Result<()> {
        if self.transaction_hash == transaction_hash {
            return Ok(());
        }

        trace!("holder {} switches to transaction {transaction_hash}", self.info.key);
        self.transaction_hash = transaction_hash;
        self.clear()
    }

    /// Copies `bytes` into the buffer at `offset`.
    ///
    /// ```
    /// # use std::{cell::RefCell, rc::Rc};
    /// use shuttle_program::{
    ///     account::holder::{Holder, HOLDER_HEADER_LEN},
    ///     ledger::{Account, AccountInfo, Pubkey},
    /// };
    ///
    /// let program_id = Pubkey::new_unique();
    /// let account = Account { lamports: 1, data: vec![0; HOLDER_HEADER_LEN + 4], owner: program_id };
    /// let info = AccountInfo::new(Pubkey::new_unique(), false, true, Rc::new(RefCell::new(account)));
    ///
    /// let mut holder = Holder::init(&info, Pubkey::new_unique()).unwrap();
    /// holder.write(2, &[1, 2]).unwrap();
    /// assert_eq!(holder.transaction().unwrap(), vec![0, 0, 1, 2]);
    /// assert!(holder.write(3, &[1, 2]).is_err());
    /// ```
    pub fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        let end = offset.checked_add(bytes.len() as u64).ok_or(Error::IntegerOverflow)?;
        if end > self.capacity() {
            return Err(Error::AccountSizeOverflow(self.info.key, end, self.capacity()));
        }

        let begin = HOLDER_HEADER_LEN + usize::try_from(offset).map_err(|_| Error::IntegerOverflow)?;
        let stop = begin.checked_add(bytes.len()).ok_or(Error::IntegerOverflow)?;
        self.info.try_borrow_mut_data()?[begin..stop].copy_from_slice(bytes);

        self.transaction_len = self.transaction_len.max(end);
        self.save(TAG_HOLDER)
    }

    /// The buffered transaction bytes.
    pub fn transaction(&self) -> Result<Vec<u8>> {
        let len = usize::try_from(self.transaction_len).map_err(|_| Error::IntegerOverflow)?;
        let data = self.info.try_borrow_data()?;
        data.get(HOLDER_HEADER_LEN..HOLDER_HEADER_LEN + len)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::Codec(format!("holder {} length out of bounds", self.info.key)))
    }

    /// Fails unless the buffer hashes to the hash it was written under.
    pub fn validate_transaction(&self) -> Result<Vec<u8>> {
        let transaction = self.transaction()?;
        let hash = keccak256(&transaction);
        if hash != self.transaction_hash {
            return Err(Error::HolderInvalidHash(self.transaction_hash, hash));
        }
        Ok(transaction)
    }

    /// Zeroes the buffer and resets the length.
    pub fn clear(&mut self) -> Result<()> {
        self.transaction_len = 0;
        self.info.try_borrow_mut_data()?[HOLDER_HEADER_LEN..].fill(0);
        self.save(TAG_HOLDER)
    }

    fn save(&mut self, tag: u8) -> Result<()> {
        let mut data = self.info.try_borrow_mut_data()?;
        data[0] = tag;
        data[OWNER_OFFSET..HASH_OFFSET].copy_from_slice(&self.owner.0);
        data[HASH_OFFSET..LEN_OFFSET].copy_from_slice(self.transaction_hash.as_slice());
        data[LEN_OFFSET..HOLDER_HEADER_LEN].copy_from_slice(&self.transaction_len.to_le_bytes());
        Ok(())
    }
}

/// A holder whose transaction completed or was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalized {
    /// The operator that owns the underlying holder.
    pub owner: Pubkey,
    /// The hash of the finished transaction.
    pub transaction_hash: B256,
}

impl Finalized {
    /// Loads a finalized holder.
    pub fn from_account(program_id: &Pubkey, info: &AccountInfo) -> Result<Self> {
        match tag(program_id, info)? {
            TAG_FINALIZED => {
                let (owner, transaction_hash, _) = read_header(info)?;
                Ok(Self { owner, transaction_hash })
            }
            other => Err(Error::InvalidTag(info.key, other)),
        }
    }

    /// Overwrites `info` with a finalized record, zeroing everything after the header.
    pub fn write(program_id: &Pubkey, info: &AccountInfo, record: Finalized) -> Result<()> {
        validate_owner(program_id, info)?;
        if info.data_len() < HOLDER_HEADER_LEN {
            info.realloc(HOLDER_HEADER_LEN)?;
        }

        let mut data = info.try_borrow_mut_data()?;
        data.fill(0);
        data[0] = TAG_FINALIZED;
        data[OWNER_OFFSET..HASH_OFFSET].copy_from_slice(&record.owner.0);
        data[HASH_OFFSET..LEN_OFFSET].copy_from_slice(record.transaction_hash.as_slice());
        Ok(())
    }
}

fn read_header(info: &AccountInfo) -> Result<(Pubkey, B256, u64)> {
    let data = info.try_borrow_data()?;
    if data.len() < HOLDER_HEADER_LEN {
        return Err(Error::Codec(format!("account {} is too small for a holder", info.key)));
    }

    let mut owner = [0u8; 32];
    owner.copy_from_slice(&data[OWNER_OFFSET..HASH_OFFSET]);
    let transaction_hash = B256::from_slice(&data[HASH_OFFSET..LEN_OFFSET]);
    let mut len = [0u8; 8];
    len.copy_from_slice(&data[LEN_OFFSET..HOLDER_HEADER_LEN]);

    Ok((Pubkey(owner), transaction_hash, u64::from_le_bytes(len)))
}
