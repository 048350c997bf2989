//! Configuration management for shuttle
//!
//! This crate provides the protocol parameters shared by every shuttle module, including
//! loading, saving, updating, and deleting them from `$HOME/.shuttle/config.toml`.

/// Error types for the configuration module
pub mod error;

use crate::error::Error;
use clap::Parser;
use serde::{Deserialize, Serialize};
use shuttle_common::utils::io::file::{delete_path, read_file, write_file};
#[allow(deprecated)]
use std::env::home_dir;
use std::{path::PathBuf, str::FromStr};
use tracing::{debug, error, info};

/// Command line arguments for the configuration command
#[derive(Debug, Clone, Parser)]
#[clap(about = "Display and edit the current configuration", override_usage = "shuttle config [OPTIONS]")]
pub struct ConfigArgs {
    /// The target key to update.
    #[clap(required = false, default_value = "")]
    key: String,

    /// The value to set the key to.
    #[clap(required = false, default_value = "")]
    value: String,
}

/// The [`Configuration`] struct holds the protocol parameters. Every shuttle module reads its
/// constants from here rather than hard-coding them.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// The only chain id accepted for EIP-155 transactions
    pub chain_id: u64,

    /// Slots during which only the binding operator may continue a transaction
    pub operator_priority_slots: u64,

    /// Number of treasury pool accounts fees rotate over
    pub treasury_pool_count: u32,

    /// Seed used to derive treasury pool addresses
    pub treasury_pool_seed: String,

    /// Lamports paid to a treasury pool by every executing call
    pub payment_to_treasury: u64,

    /// Lamports escrowed in a storage account while a transaction is bound
    pub payment_to_deposit: u64,

    /// Minimum steps per iterative call for transactions with a non-zero gas price
    pub evm_steps_min: u64,

    /// Step budget for single-shot execution
    pub single_shot_step_limit: u64,

    /// Rent-exemption rate per byte of account data
    pub rent_lamports_per_byte: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            chain_id: 111,
            operator_priority_slots: 16,
            treasury_pool_count: 128,
            treasury_pool_seed: "treasury_pool".to_string(),
            payment_to_treasury: 1000,
            payment_to_deposit: 1000,
            evm_steps_min: 500,
            single_shot_step_limit: 1_000_000,
            rent_lamports_per_byte: 6960,
        }
    }
}

#[allow(deprecated)]
fn config_path() -> Result<PathBuf, Error> {
    let mut home = home_dir().ok_or_else(|| {
        Error::Generic(
            "failed to get home directory. does your os support `std::env::home_dir()`?"
                .to_string(),
        )
    })?;
    home.push(".shuttle");
    home.push("config.toml");
    Ok(home)
}

fn path_str(path: &std::path::Path) -> Result<&str, Error> {
    path.to_str().ok_or_else(|| Error::Generic("failed to convert path to string".to_string()))
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| Error::ParseError(format!("invalid value for \'{key}\': {e}")))
}

impl Configuration {
    /// Returns the current configuration, creating it from defaults if it doesn't exist.
    pub fn load() -> Result<Self, Error> {
        let path = config_path()?;

        // if the config file doesn't exist, create it
        if !path.exists() {
            debug!("no config file at {}, writing defaults", path.display());
            let config = Configuration::default();
            config.save()?;
        }

        // read the config file
        let contents = read_file(path_str(&path)?)
            .map_err(|e| Error::Generic(format!("failed to read config file: {e}")))?;

        // parse the config file
        let config: Configuration = toml::from_str(&contents)
            .map_err(|e| Error::ParseError(format!("failed to parse config file: {e}")))?;
        config.validate()?;

        Ok(config)
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> Result<(), Error> {
        let path = config_path()?;

        write_file(
            path_str(&path)?,
            &toml::to_string(&self)
                .map_err(|e| Error::ParseError(format!("failed to serialize config: {e}")))?,
        )
        .map_err(|e| Error::Generic(format!("failed to write config file: {e}")))?;

        Ok(())
    }

    /// Deletes the configuration file at `$HOME/.shuttle/config.toml`.
    pub fn delete() -> Result<(), Error> {
        let path = config_path()?;

        if !delete_path(path_str(&path)?) {
            return Err(Error::Generic(format!("failed to delete {}", path.display())));
        }

        Ok(())
    }

    /// Checks that the parameters describe a usable protocol.
    pub fn validate(&self) -> Result<(), Error> {
        if self.treasury_pool_count == 0 {
            return Err(Error::Invalid("treasury_pool_count must be greater than zero".into()));
        }
        if self.treasury_pool_seed.is_empty() {
            return Err(Error::Invalid("treasury_pool_seed must not be empty".into()));
        }

        Ok(())
    }

    /// Update a single key/value pair in the configuration.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), Error> {
        // update the key in the struct and ensure it's the correct type
        match key {
            "chain_id" => self.chain_id = parse_value(key, value)?,
            "operator_priority_slots" => self.operator_priority_slots = parse_value(key, value)?,
            "treasury_pool_count" => self.treasury_pool_count = parse_value(key, value)?,
            "treasury_pool_seed" => self.treasury_pool_seed = value.to_string(),
            "payment_to_treasury" => self.payment_to_treasury = parse_value(key, value)?,
            "payment_to_deposit" => self.payment_to_deposit = parse_value(key, value)?,
            "evm_steps_min" => self.evm_steps_min = parse_value(key, value)?,
            "single_shot_step_limit" => self.single_shot_step_limit = parse_value(key, value)?,
            "rent_lamports_per_byte" => self.rent_lamports_per_byte = parse_value(key, value)?,
            _ => return Err(Error::UnknownKey(key.to_string())),
        }
        self.validate()?;

        // write the updated config to disk
        self.save()?;

        Ok(())
    }
}

/// The `config` command is used to display and edit the current configuration.
pub fn config(args: ConfigArgs) -> Result<(), Error> {
    if !args.key.is_empty() {
        if !args.value.is_empty() {
            // read the config file and update the key/value pair
            let mut config = Configuration::load()?;
            config.update(&args.key, &args.value)?;
            info!("updated configuration! Set \'{}\' = \'{}\' .", &args.key, &args.value);
        } else {
            // key is set, but no value is set
            error!("found key but no value to set. Please specify a value to set.");
        }
    } else {
        // no key is set, print the config file
        println!("{:#?}", Configuration::load()?);
        info!("use `shuttle config <KEY> <VALUE>` to set a key/value pair.");
    }

    Ok(())
}
