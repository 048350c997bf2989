use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// The [`Storage`] struct journals the storage writes of the executing contract. \
/// \
/// Writes stay here until the owner of the machine commits them; reads of keys that were never
/// written fall through to the host. A set of accessed keys is kept for warm/cold gas pricing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    /// Persistent writes, keyed by slot.
    pub storage: BTreeMap<U256, U256>,
    /// Transient (EIP-1153) slots, dropped with the machine.
    pub transient: BTreeMap<U256, U256>,
    access_set: BTreeSet<U256>,
}

impl Storage {
    /// Creates a new, empty [`Storage`] journal.
    ///
    /// ```
    /// use shuttle_vm::core::storage::Storage;
    ///
    /// let storage = Storage::new();
    /// assert!(storage.storage.is_empty());
    /// ```
    pub fn new() -> Storage {
        Storage::default()
    }

    /// Store a key-value pair in the journal.
    ///
    /// ```
    /// use shuttle_vm::core::storage::Storage;
    /// use alloy::primitives::U256;
    ///
    /// let mut storage = Storage::new();
    /// storage.store(U256::from(1), U256::from(2));
    ///
    /// assert_eq!(storage.get(U256::from(1)), Some(U256::from(2)));
    /// ```
    pub fn store(&mut self, key: U256, value: U256) {
        self.access_set.insert(key);
        self.storage.insert(key, value);
    }

    /// Returns the journalled value of a key, or `None` if it was never written.
    pub fn get(&self, key: U256) -> Option<U256> {
        self.storage.get(&key).copied()
    }

    /// Store a key-value pair in the transient storage map.
    pub fn tstore(&mut self, key: U256, value: U256) {
        self.transient.insert(key, value);
    }

    /// Load a value from the transient storage map, zero if unset.
    ///
    /// ```
    /// use shuttle_vm::core::storage::Storage;
    /// use alloy::primitives::U256;
    ///
    /// let mut storage = Storage::new();
    /// storage.tstore(U256::from(1), U256::from(2));
    ///
    /// assert_eq!(storage.tload(U256::from(1)), U256::from(2));
    /// assert_eq!(storage.tload(U256::from(3)), U256::ZERO);
    /// ```
    pub fn tload(&self, key: U256) -> U256 {
        self.transient.get(&key).copied().unwrap_or_default()
    }

    /// calculate the cost of accessing a key in storage, warming it
    ///
    /// ```
    /// use shuttle_vm::core::storage::Storage;
    /// use alloy::primitives::U256;
    ///
    /// let mut storage = Storage::new();
    ///
    /// // the key is not warm, so the cost should be 2100
    /// assert_eq!(storage.access_cost(U256::from(1)), 2100);
    ///
    /// // the key is now warm, so the cost should be 100
    /// assert_eq!(storage.access_cost(U256::from(1)), 100);
    /// ```
    pub fn access_cost(&mut self, key: U256) -> u64 {
        if self.access_set.insert(key) {
            2100
        } else {
            100
        }
    }

    /// calculate the cost of storing a key-value pair in storage
    ///
    /// ```
    /// use shuttle_vm::core::storage::Storage;
    /// use alloy::primitives::U256;
    ///
    /// let mut storage = Storage::new();
    ///
    /// // clearing a cold key costs 2900 + 2100
    /// assert_eq!(storage.storage_cost(U256::from(1), U256::ZERO), 5000);
    ///
    /// // setting a warm key costs 20000 + 100
    /// assert_eq!(storage.storage_cost(U256::from(1), U256::from(2)), 20100);
    /// ```
    pub fn storage_cost(&mut self, key: U256, value: U256) -> u64 {
        let base = if value.is_zero() { 2900 } else { 20000 };
        base + self.access_cost(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_overwrites() {
        let mut storage = Storage::new();
        storage.store(U256::from(1), U256::from(1));
        storage.store(U256::from(1), U256::from(255));

        assert_eq!(storage.get(U256::from(1)), Some(U256::from(255)));
        assert_eq!(storage.get(U256::from(2)), None);
        assert_eq!(storage.storage.len(), 1);
    }

    #[test]
    fn test_store_warms_key() {
        let mut storage = Storage::new();
        storage.store(U256::from(7), U256::from(1));
        assert_eq!(storage.access_cost(U256::from(7)), 100);
        assert_eq!(storage.storage_cost(U256::from(7), U256::ZERO), 3000);
    }

    #[test]
    fn test_transient_is_separate() {
        let mut storage = Storage::new();
        storage.tstore(U256::from(1), U256::from(9));

        assert_eq!(storage.get(U256::from(1)), None);
        assert_eq!(storage.tload(U256::from(1)), U256::from(9));
        assert_eq!(storage.access_cost(U256::from(1)), 2100);
    }
}
