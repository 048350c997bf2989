//! Builders for the program's instructions, as an operator submits them.
//!
//! ```
//! use shuttle_config::Configuration;
//! use shuttle_program::{client, instruction::EvmInstruction, ledger::Pubkey};
//!
//! let program_id = Pubkey::new_unique();
//! let operator = Pubkey::new_unique();
//!
//! let (holder, instruction) = client::holder_create(&program_id, &operator, "holder", 1024).unwrap();
//! assert_eq!(instruction.data[0], EvmInstruction::HolderCreate as u8);
//! assert_eq!(instruction.accounts[0].pubkey, holder);
//! ```

use alloy::primitives::{keccak256, Address, B256};
use shuttle_config::Configuration;

use crate::{
    account::{EtherAccount, MainTreasury, Treasury},
    error::Result,
    instruction::EvmInstruction,
    ledger::{AccountMeta, Instruction, Pubkey},
};

/// The accounts an executing instruction passes after its own leading accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionAccounts {
    /// The signing operator.
    pub operator: Pubkey,
    /// The shadow account gas is paid to.
    pub operator_balance: Pubkey,
    /// The treasury pool index the call pays into.
    pub treasury_index: u32,
    /// The shadow accounts the transaction touches.
    pub listed: Vec<Pubkey>,
}

impl ExecutionAccounts {
    fn metas(&self, program_id: &Pubkey, config: &Configuration) -> Vec<AccountMeta> {
        let (treasury, _) = Treasury::address(program_id, config, self.treasury_index);
        let mut metas = vec![
            AccountMeta::new(self.operator, true),
            AccountMeta::new(treasury, false),
            AccountMeta::new(self.operator_balance, false),
        ];
        metas.extend(self.listed.iter().map(|key| AccountMeta::new(*key, false)));
        metas
    }
}

fn instruction(
    program_id: &Pubkey,
    tag: EvmInstruction,
    payload: &[&[u8]],
    accounts: Vec<AccountMeta>,
) -> Instruction {
    let mut data = vec![tag as u8];
    for part in payload {
        data.extend_from_slice(part);
    }
    Instruction::new_with_bytes(*program_id, &data, accounts)
}

/// Creates a holder of `size` bytes owned by `operator`. Returns the holder address.
pub fn holder_create(
    program_id: &Pubkey,
    operator: &Pubkey,
    seed: &str,
    size: u64,
) -> Result<(Pubkey, Instruction)> {
    let holder = Pubkey::create_with_seed(operator, seed, program_id)?;
    Ok((
        holder,
        instruction(
            program_id,
            EvmInstruction::HolderCreate,
            &[&size.to_le_bytes(), seed.as_bytes()],
            vec![AccountMeta::new(holder, false), AccountMeta::new(*operator, true)],
        ),
    ))
}

/// Deletes a holder of `operator`.
pub fn holder_delete(program_id: &Pubkey, holder: &Pubkey, operator: &Pubkey) -> Instruction {
    instruction(
        program_id,
        EvmInstruction::HolderDelete,
        &[],
        vec![AccountMeta::new(*holder, false), AccountMeta::new(*operator, true)],
    )
}

/// Writes `bytes` at `offset` into a holder, under `transaction_hash`.
pub fn holder_write(
    program_id: &Pubkey,
    holder: &Pubkey,
    operator: &Pubkey,
    transaction_hash: B256,
    offset: u64,
    bytes: &[u8],
) -> Instruction {
    instruction(
        program_id,
        EvmInstruction::HolderWrite,
        &[
            transaction_hash.as_slice(),
            &offset.to_le_bytes(),
            &(bytes.len() as u64).to_le_bytes(),
            bytes,
        ],
        vec![AccountMeta::new(*holder, false), AccountMeta::new_readonly(*operator, true)],
    )
}

/// Splits a signed transaction into [`holder_write`] instructions of at most `chunk_size`
/// bytes each.
pub fn holder_upload(
    program_id: &Pubkey,
    holder: &Pubkey,
    operator: &Pubkey,
    transaction: &[u8],
    chunk_size: usize,
) -> Vec<Instruction> {
    let hash = keccak256(transaction);
    transaction
        .chunks(chunk_size.max(1))
        .enumerate()
        .map(|(index, chunk)| {
            let offset = (index * chunk_size.max(1)) as u64;
            holder_write(program_id, holder, operator, hash, offset, chunk)
        })
        .collect()
}

/// Creates the shadow account of `address`, funded by `operator`.
pub fn create_account(program_id: &Pubkey, operator: &Pubkey, address: Address) -> Instruction {
    let (shadow, _) = EtherAccount::key(program_id, address);
    instruction(
        program_id,
        EvmInstruction::CreateAccount,
        &[address.as_slice()],
        vec![AccountMeta::new(*operator, true), AccountMeta::new(shadow, false)],
    )
}

/// Sweeps treasury pool `index` into the main treasury.
pub fn collect_treasury(program_id: &Pubkey, config: &Configuration, index: u32) -> Instruction {
    let (main, _) = MainTreasury::address(program_id, config);
    let (pool, _) = Treasury::address(program_id, config, index);
    instruction(
        program_id,
        EvmInstruction::CollectTreasury,
        &[&index.to_le_bytes()],
        vec![AccountMeta::new(main, false), AccountMeta::new(pool, false)],
    )
}

/// Runs `transaction` to completion in one instruction.
pub fn execute_from_instruction(
    program_id: &Pubkey,
    config: &Configuration,
    accounts: &ExecutionAccounts,
    transaction: &[u8],
) -> Instruction {
    instruction(
        program_id,
        EvmInstruction::ExecuteFromInstruction,
        &[&accounts.treasury_index.to_le_bytes(), transaction],
        accounts.metas(program_id, config),
    )
}

/// Runs the transaction buffered in `holder` to completion in one instruction.
pub fn execute_from_account(
    program_id: &Pubkey,
    config: &Configuration,
    holder: &Pubkey,
    accounts: &ExecutionAccounts,
) -> Instruction {
    let mut metas = vec![AccountMeta::new_readonly(*holder, false)];
    metas.extend(accounts.metas(program_id, config));
    instruction(
        program_id,
        EvmInstruction::ExecuteFromAccount,
        &[&accounts.treasury_index.to_le_bytes()],
        metas,
    )
}

/// Binds or continues `transaction` in `storage`, running at most `step_count` steps.
pub fn step_from_instruction(
    program_id: &Pubkey,
    config: &Configuration,
    storage: &Pubkey,
    accounts: &ExecutionAccounts,
    step_count: u32,
    transaction: &[u8],
) -> Instruction {
    let mut metas = vec![AccountMeta::new(*storage, false)];
    metas.extend(accounts.metas(program_id, config));
    instruction(
        program_id,
        EvmInstruction::StepFromInstruction,
        &[&accounts.treasury_index.to_le_bytes(), &step_count.to_le_bytes(), transaction],
        metas,
    )
}

/// Binds or continues the transaction buffered in `storage`.
pub fn step_from_account(
    program_id: &Pubkey,
    config: &Configuration,
    storage: &Pubkey,
    accounts: &ExecutionAccounts,
    step_count: u32,
    allow_no_chain_id: bool,
) -> Instruction {
    let tag = if allow_no_chain_id {
        EvmInstruction::StepFromAccountNoChainId
    } else {
        EvmInstruction::StepFromAccount
    };
    let mut metas = vec![AccountMeta::new(*storage, false)];
    metas.extend(accounts.metas(program_id, config));
    instruction(
        program_id,
        tag,
        &[&accounts.treasury_index.to_le_bytes(), &step_count.to_le_bytes()],
        metas,
    )
}

/// Cancels the transaction bound to `storage`. The treasury is not involved.
pub fn cancel(
    program_id: &Pubkey,
    storage: &Pubkey,
    accounts: &ExecutionAccounts,
    transaction_hash: B256,
) -> Instruction {
    let mut metas = vec![
        AccountMeta::new(*storage, false),
        AccountMeta::new(accounts.operator, true),
        AccountMeta::new(accounts.operator_balance, false),
    ];
    metas.extend(accounts.listed.iter().map(|key| AccountMeta::new(*key, false)));
    instruction(program_id, EvmInstruction::Cancel, &[transaction_hash.as_slice()], metas)
}
