//! The program entrypoint: decodes the instruction tag and dispatches to its handler.

use shuttle_config::Configuration;
use tracing::debug;

use crate::{
    error::{Error, Result},
    instruction::{
        account_create, account_holder_create, account_holder_delete, account_holder_write,
        collect_treasury, transaction_cancel, transaction_execute_from_account,
        transaction_execute_from_instruction, transaction_step_from_account,
        transaction_step_from_instruction, EvmInstruction,
    },
    ledger::{AccountInfo, Entrypoint, InvokeContext},
};

/// The EVM program, parameterized by the protocol [`Configuration`].
#[derive(Debug, Clone, Default)]
pub struct Processor {
    config: Configuration,
}

impl Processor {
    /// A program running with `config`.
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    /// The protocol parameters.
    pub fn config(&self) -> &Configuration {
        &self.config
    }
}

impl Entrypoint for Processor {
    fn process_instruction(
        &self,
        ctx: &mut InvokeContext,
        accounts: &[AccountInfo],
        data: &[u8],
    ) -> Result<()> {
        let (tag, payload) = data
            .split_first()
            .ok_or_else(|| Error::InvalidInstruction("empty instruction data".to_string()))?;
        let instruction = EvmInstruction::try_from(*tag)?;

        debug!("processing {instruction} with {} accounts", accounts.len());
        ctx.log_msg(format!("Instruction: {instruction}"));

        let config = &self.config;
        match instruction {
            EvmInstruction::CollectTreasury => {
                collect_treasury::process(ctx, config, accounts, payload)
            }
            EvmInstruction::HolderCreate => {
                account_holder_create::process(ctx, config, accounts, payload)
            }
            EvmInstruction::HolderDelete => {
                account_holder_delete::process(ctx, config, accounts, payload)
            }
            EvmInstruction::HolderWrite => {
                account_holder_write::process(ctx, config, accounts, payload)
            }
            EvmInstruction::CreateAccount => account_create::process(ctx, config, accounts, payload),
            EvmInstruction::ExecuteFromInstruction => {
                transaction_execute_from_instruction::process(ctx, config, accounts, payload)
            }
            EvmInstruction::ExecuteFromAccount => {
                transaction_execute_from_account::process(ctx, config, accounts, payload)
            }
            EvmInstruction::StepFromInstruction => {
                transaction_step_from_instruction::process(ctx, config, accounts, payload)
            }
            EvmInstruction::StepFromAccount => {
                transaction_step_from_account::process(ctx, config, accounts, payload, false)
            }
            EvmInstruction::StepFromAccountNoChainId => {
                transaction_step_from_account::process(ctx, config, accounts, payload, true)
            }
            EvmInstruction::Cancel => transaction_cancel::process(ctx, config, accounts, payload),
        }
    }
}
