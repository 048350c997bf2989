use alloy::{
    consensus::{SignableTransaction, TxEnvelope},
    eips::eip2718::Decodable2718,
    primitives::{Address, Bytes, TxKind, B256, U256},
};
use tracing::trace;

use crate::{
    constants::{TX_BASE_GAS, TX_CREATE_GAS, TX_DATA_NON_ZERO_GAS, TX_DATA_ZERO_GAS},
    error::Error,
};

/// A decoded, signature-verified legacy Ethereum transaction, together with the raw bytes it was
/// decoded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTransaction {
    /// The signed, RLP-encoded transaction bytes.
    pub bytes: Bytes,
    /// Keccak-256 hash of [`RawTransaction::bytes`].
    pub hash: B256,
    /// The address recovered from the signature.
    pub sender: Address,
    /// The EIP-155 chain id, or `None` for pre-EIP-155 transactions.
    pub chain_id: Option<u64>,
    /// The sender's nonce.
    pub nonce: u64,
    /// The price per unit of gas, in tokens.
    pub gas_price: u128,
    /// The maximum amount of gas this transaction may consume.
    pub gas_limit: u64,
    /// The call target, or `None` for contract creation.
    pub to: Option<Address>,
    /// The value transferred to `to`.
    pub value: U256,
    /// The calldata, or the init code for contract creation.
    pub input: Bytes,
}

impl RawTransaction {
    /// Decodes a signed legacy transaction and recovers its sender.
    ///
    /// Typed (EIP-2718) envelopes other than legacy are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let mut buf = bytes;
        let envelope = TxEnvelope::decode_2718(&mut buf)
            .map_err(|e| Error::InvalidTransaction(format!("failed to decode: {e}")))?;
        if !buf.is_empty() {
            return Err(Error::InvalidTransaction(format!(
                "{} trailing bytes after transaction",
                buf.len()
            )));
        }

        let signed = match envelope {
            TxEnvelope::Legacy(signed) => signed,
            other => return Err(Error::UnsupportedTransactionType(other.tx_type() as u8)),
        };

        let sender = signed
            .signature()
            .recover_address_from_prehash(&signed.tx().signature_hash())
            .map_err(|e| Error::InvalidTransaction(format!("failed to recover sender: {e}")))?;

        let hash = *signed.hash();
        let tx = signed.tx();
        trace!("decoded transaction {hash} from {sender}");

        Ok(Self {
            bytes: Bytes::copy_from_slice(bytes),
            hash,
            sender,
            chain_id: tx.chain_id,
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            to: match tx.to {
                TxKind::Call(address) => Some(address),
                TxKind::Create => None,
            },
            value: tx.value,
            input: tx.input.clone(),
        })
    }

    /// Returns `true` if this transaction deploys a contract.
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// Gas charged before any code runs.
    ///
    /// ```
    /// use shuttle_common::constants::TX_BASE_GAS;
    /// # use shuttle_common::ether::transaction::RawTransaction;
    /// # fn check(tx: &RawTransaction) {
    /// assert!(tx.intrinsic_gas() >= TX_BASE_GAS);
    /// # }
    /// ```
    pub fn intrinsic_gas(&self) -> u64 {
        let data_gas = self.input.iter().fold(0u64, |acc, byte| {
            acc.saturating_add(if *byte == 0 { TX_DATA_ZERO_GAS } else { TX_DATA_NON_ZERO_GAS })
        });
        let create_gas = if self.is_create() { TX_CREATE_GAS } else { 0 };

        TX_BASE_GAS.saturating_add(data_gas).saturating_add(create_gas)
    }

    /// `gas_limit × gas_price`: the most this transaction can pay for gas.
    pub fn gas_limit_in_tokens(&self) -> Result<U256, Error> {
        U256::from(self.gas_limit)
            .checked_mul(U256::from(self.gas_price))
            .ok_or(Error::IntegerOverflow)
    }

    /// `value + gas_limit × gas_price`: the balance the sender needs up front.
    pub fn required_balance(&self) -> Result<U256, Error> {
        self.value.checked_add(self.gas_limit_in_tokens()?).ok_or(Error::IntegerOverflow)
    }
}
