use std::{collections::VecDeque, fmt::Display};

use alloy::primitives::U256;
use eyre::Result;
use serde::{Deserialize, Serialize};

use super::vm::HaltReason;

/// The maximum number of words the stack may hold.
pub const STACK_LIMIT: usize = 1024;

/// The [`Stack`] struct represents the EVM stack.
///
/// The front of the deque is the top of the stack.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    /// The stack words, top first.
    pub stack: VecDeque<U256>,
}

impl Stack {
    /// Creates a new, empty [`Stack`].
    ///
    /// ```
    /// use shuttle_vm::core::stack::Stack;
    ///
    /// let stack = Stack::new();
    /// assert_eq!(stack.size(), 0);
    /// ```
    pub fn new() -> Stack {
        Stack { stack: VecDeque::new() }
    }

    /// Push a value onto the stack, failing with a stack overflow once the stack is full.
    ///
    /// ```
    /// use shuttle_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x00)).expect("stack overflow");
    /// assert_eq!(stack.size(), 1);
    /// ```
    pub fn push(&mut self, value: U256) -> Result<()> {
        if self.stack.len() >= STACK_LIMIT {
            return Err(HaltReason::StackOverflow.into());
        }
        self.stack.push_front(value);
        Ok(())
    }

    /// Pop a value off the stack.
    ///
    /// ```
    /// use shuttle_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x01)).expect("stack overflow");
    ///
    /// assert_eq!(stack.pop().expect("stack underflow"), U256::from(0x01));
    /// assert!(stack.pop().is_err());
    /// ```
    pub fn pop(&mut self) -> Result<U256> {
        Ok(self.stack.pop_front().ok_or(HaltReason::StackUnderflow)?)
    }

    /// Pop n values off the stack, top first.
    ///
    /// Nothing is popped if the stack holds fewer than n values.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<U256>> {
        if self.stack.len() < n {
            return Err(HaltReason::StackUnderflow.into());
        }
        Ok(self.stack.drain(0..n).collect())
    }

    /// Swap the top value and the nth value on the stack.
    ///
    /// ```
    /// use shuttle_vm::core::stack::Stack;
    /// use alloy::primitives::U256;
    ///
    /// let mut stack = Stack::new();
    /// stack.push(U256::from(0x00)).expect("stack overflow");
    /// stack.push(U256::from(0x01)).expect("stack overflow");
    ///
    /// // stack is now [0x01, 0x00]
    /// stack.swap(1).expect("stack underflow");
    ///
    /// // stack is now [0x00, 0x01]
    /// assert_eq!(stack.pop().expect("stack underflow"), U256::from(0x00));
    /// ```
    pub fn swap(&mut self, n: usize) -> Result<()> {
        if n >= self.stack.len() {
            return Err(HaltReason::StackUnderflow.into());
        }
        self.stack.swap(0, n);
        Ok(())
    }

    /// Duplicate the nth value on the stack, where `1` is the top.
    pub fn dup(&mut self, n: usize) -> Result<()> {
        let value = match n.checked_sub(1).and_then(|index| self.stack.get(index)) {
            Some(value) => *value,
            None => return Err(HaltReason::StackUnderflow.into()),
        };
        self.push(value)
    }

    /// Peek at the value at the given index, where `0` is the top. Returns zero when the index is
    /// out of range.
    pub fn peek(&self, index: usize) -> U256 {
        self.stack.get(index).copied().unwrap_or_default()
    }

    /// Gets the current size of the stack.
    pub fn size(&self) -> usize {
        self.stack.len()
    }

    /// Check if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Display for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let words = self.stack.iter().map(|word| format!("{word:#x}")).collect::<Vec<String>>();
        write!(f, "[{}]", words.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(values: &[u64]) -> Stack {
        let mut stack = Stack::new();
        for value in values {
            stack.push(U256::from(*value)).expect("stack overflow");
        }
        stack
    }

    #[test]
    fn test_push_pop() {
        let mut stack = stack_of(&[1, 2]);
        assert_eq!(stack.pop().expect("stack underflow"), U256::from(2));
        assert_eq!(stack.pop().expect("stack underflow"), U256::from(1));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_n() {
        let mut stack = stack_of(&[1, 2, 3]);
        assert_eq!(stack.pop_n(2).expect("stack underflow"), vec![U256::from(3), U256::from(2)]);
        assert!(stack.pop_n(2).is_err());
        assert_eq!(stack.size(), 1);
    }

    #[test]
    fn test_swap() {
        let mut stack = stack_of(&[1, 2, 3]);
        stack.swap(2).expect("stack underflow");
        assert_eq!(stack.peek(0), U256::from(1));
        assert_eq!(stack.peek(2), U256::from(3));
        assert!(stack.swap(3).is_err());
    }

    #[test]
    fn test_dup() {
        let mut stack = stack_of(&[1, 2]);
        stack.dup(2).expect("stack underflow");
        assert_eq!(stack.peek(0), U256::from(1));
        assert_eq!(stack.size(), 3);
        assert!(stack.dup(4).is_err());
        assert!(stack.dup(0).is_err());
    }

    #[test]
    fn test_overflow() {
        let mut stack = Stack::new();
        for _ in 0..STACK_LIMIT {
            stack.push(U256::ZERO).expect("stack overflow");
        }
        let err = stack.push(U256::ZERO).expect_err("pushed past the limit");
        assert_eq!(err.downcast_ref::<HaltReason>(), Some(&HaltReason::StackOverflow));
    }

    #[test]
    fn test_display() {
        let stack = stack_of(&[1, 255]);
        assert_eq!(stack.to_string(), "[0xff, 0x1]");
    }
}
