//! The checkpoint record of a transaction bound for iterative execution.

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use shuttle_common::ether::transaction::RawTransaction;
use shuttle_vm::core::vm::Machine;

use crate::{
    account::{read_record, write_record, TAG_STATE},
    error::{Error, Result},
    ledger::{AccountInfo, InvokeContext, Pubkey},
};

/// The fields of a signed transaction the program needs after it was validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    /// Hash of the signed transaction bytes.
    pub hash: B256,
    /// The recovered sender.
    pub caller: Address,
    /// The EIP-155 chain id, if any.
    pub chain_id: Option<u64>,
    /// The sender nonce the transaction consumes.
    pub nonce: u64,
    /// The call target, `None` for contract creation.
    pub to: Option<Address>,
    /// The value transferred to the target.
    pub value: U256,
    /// The gas limit.
    pub gas_limit: u64,
    /// The price per unit of gas.
    pub gas_price: u128,
}

impl TransactionInfo {
    /// The called contract, or the address the transaction deploys to.
    pub fn target(&self) -> Address {
        self.to.unwrap_or_else(|| self.caller.create(self.nonce))
    }

    /// `gas × gas_price`.
    pub fn gas_in_tokens(&self, gas: u64) -> Result<U256> {
        U256::from(gas).checked_mul(U256::from(self.gas_price)).ok_or(Error::IntegerOverflow)
    }
}

impl From<&RawTransaction> for TransactionInfo {
    fn from(tx: &RawTransaction) -> Self {
        Self {
            hash: tx.hash,
            caller: tx.sender,
            chain_id: tx.chain_id,
            nonce: tx.nonce,
            to: tx.to,
            value: tx.value,
            gas_limit: tx.gas_limit,
            gas_price: tx.gas_price,
        }
    }
}

/// A shadow account listed when the transaction was bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedAccount {
    /// The ledger key.
    pub key: Pubkey,
    /// Whether the transaction holds a write lock, rather than a read lock, on it.
    pub is_writable: bool,
    /// Whether the account existed at bind time. Missing accounts are not locked.
    pub exists: bool,
}

/// The state of a bound transaction, persisted between steps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAccount {
    /// The operator that owns the underlying holder.
    pub owner: Pubkey,
    /// The bound transaction.
    pub transaction: TransactionInfo,
    /// Gas used so far and already paid to operators.
    pub gas_used: u64,
    /// Lamports escrowed in the account while the transaction is bound.
    pub deposit: u64,
    /// The operator currently allowed to continue.
    pub operator: Pubkey,
    /// The slot `operator` took over the transaction.
    pub slot: u64,
    /// The listed accounts, in the order every call must pass them.
    pub accounts: Vec<ListedAccount>,
    /// The interpreter checkpoint.
    pub machine: Machine,
}

impl StateAccount {
    /// Loads a bound transaction.
    pub fn from_account(program_id: &Pubkey, info: &AccountInfo) -> Result<Self> {
        read_record(program_id, info, TAG_STATE)
    }

    /// Persists the state into `info`. `operator` pays for any growth.
    pub fn save(
        &self,
        ctx: &mut InvokeContext,
        info: &AccountInfo,
        operator: &AccountInfo,
    ) -> Result<()> {
        write_record(ctx, info, operator, TAG_STATE, self, self.deposit)
    }

    /// Fails unless `hash` is the bound transaction's hash.
    pub fn validate_hash(&self, hash: &B256) -> Result<()> {
        if self.transaction.hash != *hash {
            return Err(Error::HolderInvalidHash(self.transaction.hash, *hash));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use shuttle_vm::core::vm::Context;

    use super::*;
    use crate::ledger::{Account, Clock, Rent, SYSTEM_PROGRAM_ID};

    #[test]
    fn test_save_grows_and_round_trips() {
        let program_id = Pubkey::new_unique();
        let rent = Rent { lamports_per_byte: 1 };
        let mut ctx = InvokeContext::new(program_id, Clock::default(), rent);

        let info = AccountInfo::new(
            Pubkey::new_unique(),
            false,
            true,
            Rc::new(RefCell::new(Account {
                lamports: rent.minimum_balance(8),
                data: vec![0xff; 8],
                owner: program_id,
            })),
        );
        let operator = AccountInfo::new(
            Pubkey::new_unique(),
            true,
            true,
            Rc::new(RefCell::new(Account::new(1_000_000, SYSTEM_PROGRAM_ID))),
        );

        let caller = Address::repeat_byte(1);
        let state = StateAccount {
            owner: operator.key,
            transaction: TransactionInfo {
                hash: B256::repeat_byte(7),
                caller,
                chain_id: Some(111),
                nonce: 0,
                to: None,
                value: U256::ZERO,
                gas_limit: 100_000,
                gas_price: 1,
            },
            gas_used: 0,
            deposit: 1_000,
            operator: operator.key,
            slot: 5,
            accounts: vec![ListedAccount { key: Pubkey::new_unique(), is_writable: true, exists: true }],
            machine: Machine::new(
                Context { origin: caller, caller, gas_limit: 100_000, ..Default::default() },
                &[0x00],
                53_000,
            ),
        };

        state.save(&mut ctx, &info, &operator).expect("save");
        assert!(info.data_len() > 8);
        assert_eq!(info.lamports(), rent.minimum_balance(info.data_len()) + 1_000);
        assert_eq!(info.lamports() + operator.lamports(), 1_000_000 + rent.minimum_balance(8));

        let loaded = StateAccount::from_account(&program_id, &info).expect("load");
        assert_eq!(loaded, state);
        assert_eq!(loaded.transaction.target(), caller.create(0));
        assert!(loaded.validate_hash(&B256::repeat_byte(7)).is_ok());
        assert_eq!(
            loaded.validate_hash(&B256::ZERO),
            Err(Error::HolderInvalidHash(B256::repeat_byte(7), B256::ZERO))
        );
    }
}
