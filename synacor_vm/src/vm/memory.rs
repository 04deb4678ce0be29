use super::error::Error;
use super::{Address, Result, Word};

pub const MEMORY_SIZE: usize = 32768;

/// `Memory` is the VM's word-addressed storage: `2^15` cells, each holding
/// one `Word`. It is populated once from a decoded program image and is
/// read and written exclusively by the `Engine`.
#[derive(Debug)]
pub struct Memory {
    cells: [Word; MEMORY_SIZE],
}

impl Memory {
    /// Build `Memory` from the words of a decoded program image. `words`
    /// is copied into the start of memory; any remaining cells are zero.
    pub fn from_words(words: &[Word]) -> Result<Memory> {
        if words.len() > MEMORY_SIZE {
            return Err(Error::ImageTooLarge {
                word_count: words.len(),
            });
        }

        let mut cells = [0; MEMORY_SIZE];
        cells[..words.len()].copy_from_slice(words);

        Ok(Memory { cells })
    }

    pub fn load(&self, address: Address) -> Result<Word> {
        self.cells
            .get(address as usize)
            .copied()
            .ok_or(Error::OutOfRangeMemory { address })
    }

    pub fn store(&mut self, address: Address, value: Word) -> Result<()> {
        let cell = self
            .cells
            .get_mut(address as usize)
            .ok_or(Error::OutOfRangeMemory { address })?;

        *cell = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_words_zero_fills_past_the_image() {
        let memory = Memory::from_words(&[1, 2, 3]).unwrap();

        assert_eq!(memory.load(0).unwrap(), 1);
        assert_eq!(memory.load(2).unwrap(), 3);
        assert_eq!(memory.load(3).unwrap(), 0);
        assert_eq!(memory.load(32767).unwrap(), 0);
    }

    #[test]
    fn from_words_rejects_images_larger_than_memory() {
        let words = vec![0; MEMORY_SIZE + 1];

        assert!(matches!(
            Memory::from_words(&words),
            Err(Error::ImageTooLarge { word_count }) if word_count == MEMORY_SIZE + 1
        ));
    }

    #[test]
    fn store_then_load_roundtrips() {
        let mut memory = Memory::from_words(&[]).unwrap();
        memory.store(100, 42).unwrap();

        assert_eq!(memory.load(100).unwrap(), 42);
    }

    #[test]
    fn load_out_of_range_address_is_an_error() {
        let memory = Memory::from_words(&[]).unwrap();

        assert!(matches!(
            memory.load(32768),
            Err(Error::OutOfRangeMemory { address: 32768 })
        ));
    }

    #[test]
    fn store_out_of_range_address_is_an_error() {
        let mut memory = Memory::from_words(&[]).unwrap();

        assert!(matches!(
            memory.store(32768, 1),
            Err(Error::OutOfRangeMemory { address: 32768 })
        ));
    }
}
