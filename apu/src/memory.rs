//! Main memory, as seen by the appending unit.
//!
//! Addresses are 24-bit absolute addresses.  Address arithmetic
//! wraps within the 24-bit address space (that is, it is performed
//! modulo PAMASK+1).  A memory smaller than the full address space
//! can be configured; references beyond its end raise a store fault.
use std::fmt::{self, Debug, Formatter};

use tracing::{Level, event};

use base::prelude::*;

use crate::fault::Fault;

/// The largest memory the 24-bit address space can hold.
pub const MAX_MEMORY_WORDS: usize = 1 << 24;

/// Primitives of the physical access layer.
///
/// `core_read` and `core_write` are used when fetching and updating
/// descriptors.  The appending unit uses the other operations to
/// transfer operands once the final address is known.
pub trait PhysicalMemory {
    fn core_read(&mut self, address: Unsigned24Bit) -> Result<Unsigned36Bit, Fault>;

    fn core_write(&mut self, address: Unsigned24Bit, word: Unsigned36Bit) -> Result<(), Fault>;

    /// Read `buf.len()` consecutive words starting at `address`.
    fn core_read_n(
        &mut self,
        address: Unsigned24Bit,
        buf: &mut [Unsigned36Bit],
    ) -> Result<(), Fault> {
        let mut a = address;
        for slot in buf.iter_mut() {
            *slot = self.core_read(a)?;
            a = a.wrapping_add(Unsigned24Bit::ONE);
        }
        Ok(())
    }

    /// Write `data` to consecutive words starting at `address`.
    fn core_write_n(&mut self, address: Unsigned24Bit, data: &[Unsigned36Bit]) -> Result<(), Fault> {
        let mut a = address;
        for word in data {
            self.core_write(a, *word)?;
            a = a.wrapping_add(Unsigned24Bit::ONE);
        }
        Ok(())
    }

    /// Replace only the bits of the word at `address` which are set
    /// in `zone` with the corresponding bits of `word`.
    fn core_write_zone(
        &mut self,
        address: Unsigned24Bit,
        word: Unsigned36Bit,
        zone: Unsigned36Bit,
    ) -> Result<(), Fault> {
        let current = self.core_read(address)?;
        self.core_write(address, (current & !zone) | (word & zone))
    }

    /// Read a word as the first half of a read-modify-write sequence.
    fn core_read_lock(&mut self, address: Unsigned24Bit) -> Result<Unsigned36Bit, Fault> {
        self.core_read(address)
    }

    /// Write a word as the second half of a read-modify-write
    /// sequence.
    fn core_write_unlock(
        &mut self,
        address: Unsigned24Bit,
        word: Unsigned36Bit,
    ) -> Result<(), Fault> {
        self.core_write(address, word)
    }
}

pub struct MemoryConfiguration {
    /// Number of words of main memory.  Values larger than
    /// [`MAX_MEMORY_WORDS`] are reduced to it.
    pub size_words: usize,
}

impl Default for MemoryConfiguration {
    fn default() -> MemoryConfiguration {
        MemoryConfiguration {
            size_words: 1 << 22,
        }
    }
}

pub struct MemoryUnit {
    words: Vec<Unsigned36Bit>,
    /// Address held by an incomplete read-modify-write sequence.
    locked: Option<Unsigned24Bit>,
}

impl Debug for MemoryUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryUnit")
            .field("size_words", &self.words.len())
            .field("locked", &self.locked)
            .finish()
    }
}

impl MemoryUnit {
    pub fn new(config: &MemoryConfiguration) -> MemoryUnit {
        let size = config.size_words.min(MAX_MEMORY_WORDS);
        MemoryUnit {
            words: vec![Unsigned36Bit::ZERO; size],
            locked: None,
        }
    }

    pub fn size_words(&self) -> usize {
        self.words.len()
    }

    /// Read a word without any side effects.  Returns `None` if the
    /// address is beyond the end of memory.
    pub fn peek(&self, address: Unsigned24Bit) -> Option<Unsigned36Bit> {
        self.words.get(usize::from(address)).copied()
    }

    /// Store consecutive words starting at `address`, for loading
    /// memory images.
    pub fn load(&mut self, address: Unsigned24Bit, data: &[Unsigned36Bit]) -> Result<(), Fault> {
        self.core_write_n(address, data)
    }

    /// The address locked by a read-modify-write sequence which has
    /// not yet been completed.
    pub fn locked_address(&self) -> Option<Unsigned24Bit> {
        self.locked
    }

    fn slot(&mut self, address: Unsigned24Bit) -> Result<&mut Unsigned36Bit, Fault> {
        match self.words.get_mut(usize::from(address)) {
            Some(w) => Ok(w),
            None => {
                event!(
                    Level::DEBUG,
                    "reference to nonexistent address {:08o}",
                    address
                );
                Err(Fault::nonexistent_address(address))
            }
        }
    }
}

impl PhysicalMemory for MemoryUnit {
    fn core_read(&mut self, address: Unsigned24Bit) -> Result<Unsigned36Bit, Fault> {
        let word = *self.slot(address)?;
        event!(Level::TRACE, "core_read {:08o} -> {:012o}", address, word);
        Ok(word)
    }

    fn core_write(&mut self, address: Unsigned24Bit, word: Unsigned36Bit) -> Result<(), Fault> {
        event!(Level::TRACE, "core_write {:08o} <- {:012o}", address, word);
        *self.slot(address)? = word;
        Ok(())
    }

    fn core_read_lock(&mut self, address: Unsigned24Bit) -> Result<Unsigned36Bit, Fault> {
        let word = self.core_read(address)?;
        if let Some(previous) = self.locked.replace(address) {
            event!(
                Level::WARN,
                "core_read_lock {:08o}: lock on {:08o} was never released",
                address,
                previous
            );
        }
        Ok(word)
    }

    fn core_write_unlock(
        &mut self,
        address: Unsigned24Bit,
        word: Unsigned36Bit,
    ) -> Result<(), Fault> {
        match self.locked.take() {
            Some(a) if a == address => (),
            Some(a) => {
                event!(
                    Level::WARN,
                    "core_write_unlock {:08o} does not match locked address {:08o}",
                    address,
                    a
                );
            }
            None => {
                event!(
                    Level::WARN,
                    "core_write_unlock {:08o} without a preceding core_read_lock",
                    address
                );
            }
        }
        self.core_write(address, word)
    }
}

#[cfg(test)]
fn small_memory() -> MemoryUnit {
    MemoryUnit::new(&MemoryConfiguration { size_words: 0o4000 })
}

#[test]
fn test_read_write_n() {
    let mut mem = small_memory();
    let data = [u36!(1), u36!(2), u36!(0o777777777777)];
    mem.core_write_n(u24!(0o100), &data).expect("in range");
    let mut buf = [Unsigned36Bit::ZERO; 3];
    mem.core_read_n(u24!(0o100), &mut buf).expect("in range");
    assert_eq!(buf, data);
}

#[test]
fn test_zone_write_merges() {
    let mut mem = small_memory();
    mem.core_write(u24!(7), u36!(0o111111_222222)).expect("in range");
    mem.core_write_zone(u24!(7), u36!(0o777777_000000), u36!(0o770000_000077))
        .expect("in range");
    assert_eq!(mem.peek(u24!(7)), Some(u36!(0o771111_222200)));
}

#[test]
fn test_nonexistent_address_is_store_fault() {
    let mut mem = small_memory();
    match mem.core_read(u24!(0o4000)) {
        Err(fault) => {
            assert_eq!(fault.kind(), crate::fault::FaultKind::STR);
        }
        Ok(w) => {
            panic!("read beyond end of memory should fail, but returned {w:o}");
        }
    }
    assert!(mem.core_write(u24!(0o77777777), Unsigned36Bit::ZERO).is_err());
    assert_eq!(mem.peek(u24!(0o4000)), None);
}

#[test]
fn test_read_lock_then_unlock() {
    let mut mem = small_memory();
    mem.core_write(u24!(0o10), u36!(5)).expect("in range");
    let w = mem.core_read_lock(u24!(0o10)).expect("in range");
    assert_eq!(w, u36!(5));
    assert_eq!(mem.locked_address(), Some(u24!(0o10)));
    mem.core_write_unlock(u24!(0o10), u36!(6)).expect("in range");
    assert_eq!(mem.locked_address(), None);
    assert_eq!(mem.peek(u24!(0o10)), Some(u36!(6)));
}
