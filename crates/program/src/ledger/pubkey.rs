use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use alloy::primitives::keccak256;
use serde::{Deserialize, Serialize};
use shuttle_common::utils::hex::ToLowerHex;

use crate::error::{Error, Result};

/// Maximum length of a single derivation seed, in bytes.
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds in one derivation.
pub const MAX_SEEDS: usize = 16;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// The address of a ledger account.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Pubkey(pub [u8; 32]);

impl Pubkey {
    /// Wraps raw key bytes.
    pub const fn new_from_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// A key that is distinct from every other key produced by this function in the process.
    pub fn new_unique() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(keccak256(counter.to_be_bytes()).0)
    }

    /// The raw key bytes.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Derives a program address from `seeds` and `program_id`.
    ///
    /// Derived addresses have no private key; only `program_id` can sign for them.
    pub fn create_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Pubkey> {
        if seeds.len() > MAX_SEEDS {
            return Err(Error::InvalidSeeds(format!("{} seeds, at most {MAX_SEEDS}", seeds.len())));
        }

        let mut preimage = Vec::with_capacity(seeds.len() * MAX_SEED_LEN + 64);
        for seed in seeds {
            if seed.len() > MAX_SEED_LEN {
                return Err(Error::InvalidSeeds(format!(
                    "seed of {} bytes, at most {MAX_SEED_LEN}",
                    seed.len()
                )));
            }
            preimage.extend_from_slice(seed);
        }
        preimage.extend_from_slice(&program_id.0);
        preimage.extend_from_slice(PDA_MARKER);

        Ok(Pubkey(keccak256(&preimage).0))
    }

    /// Finds the program address for `seeds` together with its bump seed.
    ///
    /// The bump is appended as a final seed. Every hash is a valid program address in this
    /// ledger, so the search always settles on the first bump, 255.
    ///
    /// ```
    /// use shuttle_program::ledger::Pubkey;
    ///
    /// let program_id = Pubkey::new_unique();
    /// let (address, bump) = Pubkey::find_program_address(&[b"seed"], &program_id);
    ///
    /// assert_eq!(bump, 255);
    /// assert_eq!(
    ///     Pubkey::create_program_address(&[b"seed", &[bump]], &program_id).unwrap(),
    ///     address
    /// );
    /// ```
    pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> (Pubkey, u8) {
        for bump in (0..=u8::MAX).rev() {
            let bump_seed = [bump];
            let mut with_bump: Vec<&[u8]> = seeds.to_vec();
            with_bump.push(&bump_seed);
            if let Ok(address) = Self::create_program_address(&with_bump, program_id) {
                return (address, bump);
            }
        }

        // unreachable for well-formed seeds; callers validate seed lengths first
        (Pubkey::default(), 0)
    }

    /// Derives an account key from a base key, a string seed and the owning program.
    pub fn create_with_seed(base: &Pubkey, seed: &str, owner: &Pubkey) -> Result<Pubkey> {
        if seed.len() > MAX_SEED_LEN {
            return Err(Error::InvalidSeeds(format!(
                "seed of {} bytes, at most {MAX_SEED_LEN}",
                seed.len()
            )));
        }

        let mut preimage = Vec::with_capacity(64 + seed.len());
        preimage.extend_from_slice(&base.0);
        preimage.extend_from_slice(seed.as_bytes());
        preimage.extend_from_slice(&owner.0);

        Ok(Pubkey(keccak256(&preimage).0))
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_lower_hex())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}
