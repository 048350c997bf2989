//! Shared fixtures for the program integration tests.

#![allow(dead_code, unreachable_pub)]

use std::{cell::RefCell, rc::Rc};

use alloy::{
    consensus::{SignableTransaction, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718,
    primitives::{keccak256, Address, Bytes, TxKind, B256, U256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use shuttle_config::Configuration;
use shuttle_program::{
    account::{EtherAccount, MainTreasury, StateAccount, Treasury},
    client::{self, ExecutionAccounts},
    error::Result,
    ledger::{AccountInfo, Instruction, Ledger, Pubkey, Receipt, Rent, Transaction},
    processor::Processor,
};

/// Counts down from 100 in a stack loop, then stores 0x2a in slot 1. About 700 steps.
pub const LOOP: [u8; 18] = [
    0x60, 0x64, // PUSH1 100
    0x5b, // JUMPDEST
    0x60, 0x01, 0x90, 0x03, // PUSH1 1, SWAP1, SUB
    0x80, // DUP1
    0x60, 0x02, 0x57, // PUSH1 2, JUMPI
    0x50, // POP
    0x60, 0x2a, 0x60, 0x01, 0x55, // PUSH1 0x2a, PUSH1 1, SSTORE
    0x00, // STOP
];

/// Reverts immediately.
pub const REVERT: [u8; 5] = [0x60, 0x00, 0x80, 0xfd, 0x00];

pub const CONTRACT: Address = Address::repeat_byte(0xcc);
pub const RECIPIENT: Address = Address::repeat_byte(0xdd);
pub const MINER: Address = Address::repeat_byte(0xee);

pub const ONE_ETHER: u128 = 1_000_000_000_000_000_000;
pub const GAS_LIMIT: u64 = 100_000;
pub const GAS_PRICE: u128 = 2;

/// A ledger with the program deployed, funded operators and treasury pools, and a funded
/// sender.
pub struct Env {
    pub ledger: Ledger,
    pub program_id: Pubkey,
    pub config: Configuration,
    pub signer: PrivateKeySigner,
    pub operator: Pubkey,
    pub other_operator: Pubkey,
}

impl Env {
    pub fn new() -> Self {
        Self::with_config(Configuration { evm_steps_min: 100, ..Configuration::default() })
    }

    pub fn with_config(config: Configuration) -> Self {
        let rent = Rent { lamports_per_byte: config.rent_lamports_per_byte };
        let mut ledger = Ledger::new(rent);
        let program_id = Pubkey::new_unique();
        ledger.add_program(program_id, Rc::new(Processor::new(config.clone())));

        for index in 0..config.treasury_pool_count {
            let (pool, _) = Treasury::address(&program_id, &config, index);
            ledger.airdrop(pool, rent.minimum_balance(0));
        }
        ledger.airdrop(MainTreasury::address(&program_id, &config).0, rent.minimum_balance(0));

        let (operator, other_operator) = (Pubkey::new_unique(), Pubkey::new_unique());
        ledger.airdrop(operator, 1_000_000_000_000);
        ledger.airdrop(other_operator, 1_000_000_000_000);

        let signer =
            PrivateKeySigner::from_bytes(&B256::repeat_byte(0x07)).expect("valid private key");

        let mut env = Self { ledger, program_id, config, signer, operator, other_operator };
        env.set_shadow(EtherAccount::new(MINER));
        env.set_shadow(EtherAccount {
            balance: U256::from(ONE_ETHER),
            ..EtherAccount::new(env.sender())
        });
        env.set_shadow(EtherAccount { code: LOOP.to_vec(), ..EtherAccount::new(CONTRACT) });
        env
    }

    pub fn sender(&self) -> Address {
        self.signer.address()
    }

    /// A new signer whose address holds one ether.
    pub fn funded_signer(&mut self, byte: u8) -> PrivateKeySigner {
        let signer =
            PrivateKeySigner::from_bytes(&B256::repeat_byte(byte)).expect("valid private key");
        self.set_shadow(EtherAccount {
            balance: U256::from(ONE_ETHER),
            ..EtherAccount::new(signer.address())
        });
        signer
    }

    pub fn key(&self, address: Address) -> Pubkey {
        EtherAccount::key(&self.program_id, address).0
    }

    pub fn set_shadow(&mut self, account: EtherAccount) {
        let key = self.key(account.address);
        let rent = self.ledger.rent();
        self.ledger.set_account(
            key,
            account.to_ledger_account(&self.program_id, &rent).expect("encodable account"),
        );
    }

    pub fn shadow(&self, address: Address) -> Option<EtherAccount> {
        let key = self.key(address);
        self.ledger.account(&key).map(|account| {
            EtherAccount::from_ledger_account(&self.program_id, &key, account)
                .expect("valid shadow account")
        })
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.shadow(address).map_or(U256::ZERO, |account| account.balance)
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.shadow(address).map_or(0, |account| account.nonce)
    }

    /// Signs a legacy transaction from the fixture sender.
    pub fn sign(&self, nonce: u64, to: Option<Address>, value: u128, input: &[u8]) -> Vec<u8> {
        self.sign_with(&self.signer, Some(self.config.chain_id), nonce, to, value, input)
    }

    pub fn sign_with(
        &self,
        signer: &PrivateKeySigner,
        chain_id: Option<u64>,
        nonce: u64,
        to: Option<Address>,
        value: u128,
        input: &[u8],
    ) -> Vec<u8> {
        let tx = TxLegacy {
            chain_id,
            nonce,
            gas_price: GAS_PRICE,
            gas_limit: GAS_LIMIT,
            to: to.map_or(TxKind::Create, TxKind::Call),
            value: U256::from(value),
            input: Bytes::copy_from_slice(input),
        };
        sign_legacy(signer, tx)
    }

    /// Signs a transfer to `to` with an explicit gas limit.
    pub fn sign_transfer(&self, nonce: u64, to: Address, value: u128, gas_limit: u64) -> Vec<u8> {
        let tx = TxLegacy {
            chain_id: Some(self.config.chain_id),
            nonce,
            gas_price: GAS_PRICE,
            gas_limit,
            to: TxKind::Call(to),
            value: U256::from(value),
            input: Bytes::new(),
        };
        sign_legacy(&self.signer, tx)
    }

    pub fn accounts(&self, operator: Pubkey, listed: &[Address]) -> ExecutionAccounts {
        ExecutionAccounts {
            operator,
            operator_balance: self.key(MINER),
            treasury_index: 3,
            listed: listed.iter().map(|address| self.key(*address)).collect(),
        }
    }

    pub fn send(&mut self, signer: Pubkey, instructions: Vec<Instruction>) -> Result<Receipt> {
        self.ledger.process_transaction(&Transaction::new(instructions, &[signer]))
    }

    pub fn create_holder(&mut self, operator: Pubkey, seed: &str, size: u64) -> Pubkey {
        let (holder, instruction) =
            client::holder_create(&self.program_id, &operator, seed, size).expect("valid seed");
        self.send(operator, vec![instruction]).expect("failed to create holder");
        holder
    }

    /// Creates a holder of `operator` and uploads `transaction` into it.
    pub fn upload(&mut self, operator: Pubkey, seed: &str, transaction: &[u8]) -> Pubkey {
        let holder = self.create_holder(operator, seed, 1024);
        let writes = client::holder_upload(&self.program_id, &holder, &operator, transaction, 64);
        self.send(operator, writes).expect("failed to upload");
        holder
    }

    /// Binds `transaction` to `storage`, or continues it.
    pub fn step(
        &mut self,
        operator: Pubkey,
        storage: &Pubkey,
        listed: &[Address],
        step_count: u32,
        transaction: &[u8],
    ) -> Result<Receipt> {
        let accounts = self.accounts(operator, listed);
        let instruction = client::step_from_instruction(
            &self.program_id,
            &self.config,
            storage,
            &accounts,
            step_count,
            transaction,
        );
        self.send(operator, vec![instruction])
    }

    /// Steps `transaction` until it finalizes. Returns the number of calls, bind included.
    pub fn step_to_end(
        &mut self,
        operator: Pubkey,
        storage: &Pubkey,
        listed: &[Address],
        step_count: u32,
        transaction: &[u8],
    ) -> usize {
        let mut calls = 0;
        loop {
            let receipt = self
                .step(operator, storage, listed, step_count, transaction)
                .expect("step failed");
            calls += 1;
            if receipt.data(b"RETURN").is_some() {
                return calls;
            }
            assert!(calls < 1_000, "transaction never finished");
        }
    }

    pub fn cancel(
        &mut self,
        operator: Pubkey,
        storage: &Pubkey,
        listed: &[Address],
        transaction_hash: B256,
    ) -> Result<Receipt> {
        let accounts = self.accounts(operator, listed);
        let instruction = client::cancel(&self.program_id, storage, &accounts, transaction_hash);
        self.send(operator, vec![instruction])
    }

    /// The layout tag of a program account.
    pub fn tag(&self, key: &Pubkey) -> Option<u8> {
        self.ledger.account(key).and_then(|account| account.data.first().copied())
    }

    pub fn state(&self, key: &Pubkey) -> StateAccount {
        let account = self.ledger.account(key).cloned().expect("storage account exists");
        let info = AccountInfo::new(*key, false, false, Rc::new(RefCell::new(account)));
        StateAccount::from_account(&self.program_id, &info).expect("bound storage account")
    }

    pub fn treasury_lamports(&self, index: u32) -> u64 {
        self.ledger.lamports(&Treasury::address(&self.program_id, &self.config, index).0)
    }
}

fn sign_legacy(signer: &PrivateKeySigner, tx: TxLegacy) -> Vec<u8> {
    let signature = signer.sign_hash_sync(&tx.signature_hash()).expect("failed to sign");
    TxEnvelope::Legacy(tx.into_signed(signature)).encoded_2718()
}

pub fn hash(transaction: &[u8]) -> B256 {
    keccak256(transaction)
}
