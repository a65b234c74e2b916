//! Memory structure

use crate::error::MemoryError;
use crate::error::MemoryErrorKind;
use crate::error::SimulatorResult;

/// Flat word-addressed data memory.
/// Addresses are word indices; anything outside `0..len` is rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct DataMemory {
    words: Vec<i32>,
}

impl DataMemory {
    pub fn new(words: usize) -> Self {
        Self { words: vec![0; words] }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn index(&self, address: i32) -> Option<usize> {
        usize::try_from(address).ok().filter(|i| *i < self.words.len())
    }

    /// Reads the word at `address`
    pub fn read(&self, address: i32) -> SimulatorResult<i32> {
        match self.index(address) {
            Some(i) => Ok(self.words[i]),
            None => Err(MemoryError::AccessError {
                address: address as i64,
                kind: MemoryErrorKind::ReadOutOfBounds(self.len()),
            }
            .into()),
        }
    }

    /// Writes `value` to the word at `address`
    pub fn write(&mut self, address: i32, value: i32) -> SimulatorResult<()> {
        match self.index(address) {
            Some(i) => {
                self.words[i] = value;
                Ok(())
            }
            None => Err(MemoryError::AccessError {
                address: address as i64,
                kind: MemoryErrorKind::WriteOutOfBounds(self.len()),
            }
            .into()),
        }
    }

    /// Read-only view of all words
    pub fn words(&self) -> &[i32] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulatorError;

    #[test]
    fn write_then_read() {
        let mut mem = DataMemory::new(8);
        mem.write(7, -3).unwrap();
        assert_eq!(mem.read(7).unwrap(), -3);
        assert_eq!(mem.read(0).unwrap(), 0);
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let mut mem = DataMemory::new(8);
        assert!(matches!(
            mem.read(8),
            Err(SimulatorError::MemoryError(MemoryError::AccessError { address: 8, .. }))
        ));
        assert!(mem.write(-1, 0).is_err());
        assert_eq!(mem.words(), &[0; 8]);
    }
}
