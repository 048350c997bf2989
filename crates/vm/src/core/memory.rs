use serde::{Deserialize, Serialize};

/// The [`Memory`] struct represents the memory of an EVM.
///
/// Callers charge [`Memory::expansion_cost`] before touching memory, so offsets reaching this
/// struct are bounded by the gas available.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// Vector storing memory data
    pub memory: Vec<u8>,
}

impl Memory {
    /// Creates a new, empty [`Memory`].
    pub fn new() -> Memory {
        Memory { memory: Vec::new() }
    }

    /// Gets the current size of the memory in bytes.
    ///
    /// ```
    /// use shuttle_vm::core::memory::Memory;
    ///
    /// let memory = Memory::new();
    /// assert_eq!(memory.size(), 0);
    /// ```
    pub fn size(&self) -> usize {
        self.memory.len()
    }

    /// Extends the memory to cover `offset..offset + size`, rounded up to a whole word. A
    /// zero-sized access never extends the memory.
    ///
    /// ```
    /// use shuttle_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.extend(0, 33);
    /// assert_eq!(memory.size(), 64);
    /// ```
    pub fn extend(&mut self, offset: usize, size: usize) {
        if size == 0 {
            return;
        }

        let new_mem_size = offset.saturating_add(size).saturating_add(31) / 32 * 32;
        if new_mem_size > self.size() {
            self.memory.resize(new_mem_size, 0u8);
        }
    }

    /// Store the given bytes in the memory at the given offset, with a fixed size. Short values
    /// are left-padded with zeros, long values are truncated.
    ///
    /// ```
    /// use shuttle_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.store(0, 32, &[0xff]);
    /// assert_eq!(memory.read(31, 1), vec![0xff]);
    /// ```
    pub fn store(&mut self, offset: usize, size: usize, value: &[u8]) {
        if size == 0 {
            return;
        }

        let value: Vec<u8> = if value.len() >= size {
            value[..size].to_vec()
        } else {
            let mut padded = vec![0u8; size - value.len()];
            padded.extend_from_slice(value);
            padded
        };

        self.extend(offset, size);
        self.memory.splice(offset..offset.saturating_add(size), value);
    }

    /// Read the given number of bytes from the memory at the given offset. Bytes past the end of
    /// memory read as zero.
    ///
    /// ```
    /// use shuttle_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.store(0, 1, &[0xff]);
    /// assert_eq!(memory.read(0, 2), vec![0xff, 0x00]);
    /// ```
    pub fn read(&self, offset: usize, size: usize) -> Vec<u8> {
        let mut value = Vec::with_capacity(size);
        if offset < self.size() {
            let end = offset.saturating_add(size).min(self.size());
            value.extend_from_slice(&self.memory[offset..end]);
        }
        value.resize(size, 0u8);
        value
    }

    /// Calculate the current memory cost
    ///
    /// ```
    /// use shuttle_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.store(0, 32, &[0xff]);
    /// assert_eq!(memory.memory_cost(), 3);
    /// ```
    pub fn memory_cost(&self) -> u128 {
        Self::cost_of_words((self.size() as u128).saturating_add(31) / 32)
    }

    /// calculate the memory cost of extending the memory to cover `offset..offset + size`
    ///
    /// ```
    /// use shuttle_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.store(0, 32, &[0xff]);
    /// assert_eq!(memory.expansion_cost(0, 32), 0);
    /// assert_eq!(memory.expansion_cost(0, 64), 3);
    /// assert_eq!(memory.expansion_cost(usize::MAX, 0), 0);
    /// ```
    pub fn expansion_cost(&self, offset: usize, size: usize) -> u128 {
        if size == 0 {
            return 0;
        }

        let new_memory_word_size =
            (offset as u128).saturating_add(size as u128).saturating_add(31) / 32;
        Self::cost_of_words(new_memory_word_size).saturating_sub(self.memory_cost())
    }

    fn cost_of_words(words: u128) -> u128 {
        (words.saturating_mul(words) / 512).saturating_add(words.saturating_mul(3))
    }
}

#[cfg(test)]
mod tests {
    use shuttle_common::utils::strings::decode_hex;

    use super::*;

    #[test]
    fn test_mstore_simple() {
        let mut memory = Memory::new();
        memory.store(
            0,
            32,
            &decode_hex("00000000000000000000000000000000000000000000000000000000000000ff")
                .expect("failed to decode hex"),
        );
        assert_eq!(
            memory.memory,
            decode_hex("00000000000000000000000000000000000000000000000000000000000000ff")
                .expect("failed to decode hex"),
        );
    }

    #[test]
    fn test_mstore_offset_extends_by_words() {
        let mut memory = Memory::new();
        memory.store(4, 32, &[0xff]);
        assert_eq!(memory.size(), 64);
        assert_eq!(memory.read(35, 1), vec![0xff]);
        assert_eq!(memory.read(0, 4), vec![0; 4]);
    }

    #[test]
    fn test_store_truncates_long_values() {
        let mut memory = Memory::new();
        memory.store(0, 2, &[0x01, 0x02, 0x03]);
        assert_eq!(memory.read(0, 3), vec![0x01, 0x02, 0x00]);
    }

    #[test]
    fn test_read_past_end() {
        let memory = Memory::new();
        assert_eq!(memory.read(100, 4), vec![0; 4]);
        assert_eq!(memory.size(), 0);
    }

    #[test]
    fn test_expansion_cost_quadratic() {
        let memory = Memory::new();
        // 1024 words: 3 * 1024 + 1024^2 / 512
        assert_eq!(memory.expansion_cost(0, 1024 * 32), 3 * 1024 + 2048);
        assert!(memory.expansion_cost(usize::MAX - 1, 64) > u64::MAX as u128);
    }
}
