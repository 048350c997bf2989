use std::ops::Deref;

use crate::{
    error::{Error, Result},
    ledger::AccountInfo,
};

/// The signer submitting an instruction and paying for it.
#[derive(Debug, Clone, Copy)]
pub struct Operator<'a> {
    info: &'a AccountInfo,
}

impl<'a> Operator<'a> {
    /// Fails unless `info` signed the transaction and is writable.
    pub fn from_account(info: &'a AccountInfo) -> Result<Self> {
        if !info.is_signer {
            return Err(Error::AccountNotSigner(info.key));
        }
        if !info.is_writable {
            return Err(Error::AccountNotWritable(info.key));
        }
        Ok(Self { info })
    }

    /// The operator's ledger account.
    pub fn info(&self) -> &'a AccountInfo {
        self.info
    }
}

impl Deref for Operator<'_> {
    type Target = AccountInfo;

    fn deref(&self) -> &Self::Target {
        self.info
    }
}
