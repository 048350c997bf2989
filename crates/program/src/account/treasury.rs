//! Treasury pools collect the per-call payment. Pools are system accounts at addresses derived
//! from the configured seed and their index, and are swept into the main treasury.

use shuttle_config::Configuration;

use crate::{
    error::{Error, Result},
    ledger::{AccountInfo, InvokeContext, Pubkey},
};

/// A verified treasury pool account.
#[derive(Debug)]
pub struct Treasury<'a> {
    info: &'a AccountInfo,
    index: u32,
    bump: u8,
}

impl<'a> Treasury<'a> {
    /// The pool an instruction carrying `index` pays into.
    pub fn pool_index(config: &Configuration, index: u32) -> u32 {
        index % config.treasury_pool_count.max(1)
    }

    /// The address of the pool for `index`, and its bump seed.
    ///
    /// ```
    /// use shuttle_config::Configuration;
    /// use shuttle_program::{account::Treasury, ledger::Pubkey};
    ///
    /// let program_id = Pubkey::new_unique();
    /// let config = Configuration::default();
    ///
    /// // indices wrap around the pool count
    /// assert_eq!(
    ///     Treasury::address(&program_id, &config, 3),
    ///     Treasury::address(&program_id, &config, 3 + config.treasury_pool_count),
    /// );
    /// ```
    pub fn address(program_id: &Pubkey, config: &Configuration, index: u32) -> (Pubkey, u8) {
        let pool = Self::pool_index(config, index);
        Pubkey::find_program_address(
            &[config.treasury_pool_seed.as_bytes(), &pool.to_le_bytes()],
            program_id,
        )
    }

    /// Verifies that `info` is the pool for `index`.
    pub fn from_account(
        program_id: &Pubkey,
        config: &Configuration,
        index: u32,
        info: &'a AccountInfo,
    ) -> Result<Self> {
        let (expected, bump) = Self::address(program_id, config, index);
        if expected != info.key {
            return Err(Error::InvalidTreasuryAccount(info.key, index));
        }
        if !info.is_writable {
            return Err(Error::AccountNotWritable(info.key));
        }
        Ok(Self { info, index: Self::pool_index(config, index), bump })
    }

    /// The pool's ledger account.
    pub fn info(&self) -> &'a AccountInfo {
        self.info
    }

    /// Pays `lamports` from the signer `operator` into the pool.
    pub fn pay(&self, ctx: &mut InvokeContext, operator: &AccountInfo, lamports: u64) -> Result<()> {
        ctx.transfer(operator, self.info, lamports)
    }

    /// Moves everything above the pool's rent-exempt minimum into the main treasury.
    pub fn sweep(
        &self,
        ctx: &mut InvokeContext,
        config: &Configuration,
        main: &MainTreasury<'_>,
    ) -> Result<u64> {
        let minimum = ctx.rent().minimum_balance(self.info.data_len());
        let amount = self.info.lamports().saturating_sub(minimum);
        if amount > 0 {
            let index = self.index.to_le_bytes();
            ctx.transfer_signed(
                self.info,
                main.info,
                amount,
                &[config.treasury_pool_seed.as_bytes(), &index, &[self.bump]],
            )?;
        }
        Ok(amount)
    }
}

/// The verified main treasury account.
#[derive(Debug)]
pub struct MainTreasury<'a> {
    info: &'a AccountInfo,
}

impl<'a> MainTreasury<'a> {
    /// The address of the main treasury, and its bump seed.
    pub fn address(program_id: &Pubkey, config: &Configuration) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[config.treasury_pool_seed.as_bytes()], program_id)
    }

    /// Verifies that `info` is the main treasury.
    pub fn from_account(
        program_id: &Pubkey,
        config: &Configuration,
        info: &'a AccountInfo,
    ) -> Result<Self> {
        if Self::address(program_id, config).0 != info.key {
            return Err(Error::InvalidTreasuryAccount(info.key, u32::MAX));
        }
        if !info.is_writable {
            return Err(Error::AccountNotWritable(info.key));
        }
        Ok(Self { info })
    }
}
