use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

use crate::{
    error::{Error, Result},
    ledger::Pubkey,
};

/// The key of the builtin system program, which owns every account no program has claimed.
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey([0u8; 32]);

/// A ledger account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    /// The account balance in lamports.
    pub lamports: u64,
    /// Program-defined contents.
    pub data: Vec<u8>,
    /// The program allowed to modify `data` and debit `lamports`.
    pub owner: Pubkey,
}

impl Account {
    /// A data-less account owned by `owner`.
    pub fn new(lamports: u64, owner: Pubkey) -> Self {
        Self { lamports, data: Vec::new(), owner }
    }

    /// Returns `true` for an account the system program owns and that holds no data.
    pub fn is_empty_system(&self) -> bool {
        self.owner == SYSTEM_PROGRAM_ID && self.data.is_empty()
    }
}

/// How an instruction refers to an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountMeta {
    /// The account key.
    pub pubkey: Pubkey,
    /// Whether the transaction must be signed by this key.
    pub is_signer: bool,
    /// Whether the instruction may modify the account.
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account.
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self { pubkey, is_signer, is_writable: true }
    }

    /// A read-only account.
    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self { pubkey, is_signer, is_writable: false }
    }
}

/// An account as seen by a program while it processes one instruction.
///
/// Duplicate keys in one instruction share the same underlying account.
#[derive(Clone, Debug)]
pub struct AccountInfo {
    /// The account key.
    pub key: Pubkey,
    /// Whether the transaction was signed by this key.
    pub is_signer: bool,
    /// Whether the instruction may modify the account.
    pub is_writable: bool,
    account: Rc<RefCell<Account>>,
}

impl AccountInfo {
    /// Wraps a shared account.
    pub fn new(
        key: Pubkey,
        is_signer: bool,
        is_writable: bool,
        account: Rc<RefCell<Account>>,
    ) -> Self {
        Self { key, is_signer, is_writable, account }
    }

    /// The account balance in lamports.
    pub fn lamports(&self) -> u64 {
        self.account.borrow().lamports
    }

    /// Overwrites the account balance.
    pub fn set_lamports(&self, lamports: u64) {
        self.account.borrow_mut().lamports = lamports;
    }

    /// The owning program.
    pub fn owner(&self) -> Pubkey {
        self.account.borrow().owner
    }

    /// Transfers ownership to `owner`.
    pub fn assign(&self, owner: &Pubkey) {
        self.account.borrow_mut().owner = *owner;
    }

    /// The length of the account data.
    pub fn data_len(&self) -> usize {
        self.account.borrow().data.len()
    }

    /// Returns `true` for an account the system program owns and that holds no data.
    pub fn is_empty_system(&self) -> bool {
        self.account.borrow().is_empty_system()
    }

    /// Borrows the account data.
    pub fn try_borrow_data(&self) -> Result<Ref<'_, Vec<u8>>> {
        self.account
            .try_borrow()
            .map(|account| Ref::map(account, |account| &account.data))
            .map_err(|_| Error::Internal(format!("account {} is already borrowed", self.key)))
    }

    /// Mutably borrows the account data.
    pub fn try_borrow_mut_data(&self) -> Result<RefMut<'_, Vec<u8>>> {
        self.account
            .try_borrow_mut()
            .map(|account| RefMut::map(account, |account| &mut account.data))
            .map_err(|_| Error::Internal(format!("account {} is already borrowed", self.key)))
    }

    /// Resizes the account data, zero-filling any new bytes.
    pub fn realloc(&self, new_len: usize) -> Result<()> {
        self.try_borrow_mut_data()?.resize(new_len, 0);
        Ok(())
    }

    /// Moves `lamports` from this account to `to`.
    ///
    /// The ledger rejects the instruction afterwards unless the running program owns this
    /// account or was authorized to debit it.
    pub fn transfer_lamports(&self, to: &AccountInfo, lamports: u64) -> Result<()> {
        let balance = self.lamports();
        let remaining = balance
            .checked_sub(lamports)
            .ok_or(Error::InsufficientLamports(self.key, lamports))?;
        self.set_lamports(remaining);
        to.set_lamports(to.lamports().checked_add(lamports).ok_or(Error::IntegerOverflow)?);
        Ok(())
    }
}
