//! Fixed-size occupancy bitmap

use crate::error::{Error, Result};

const WORD_BITS: usize = u64::BITS as usize;

/// Number of `u64` words needed to hold `bits` bits.
pub const fn words_for_bits(bits: usize) -> usize {
    bits.div_ceil(WORD_BITS)
}

/// Bitmap with one bit per slot, backed by `u64` words
///
/// Bit `i` lives in word `i / 64` at position `i % 64`. Bits past `len`
/// in the last word are never set.
///
/// Indexing methods panic when `index >= len`; the pool checks bounds
/// before touching the bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBitmap {
    words: Vec<u64>,
    len: usize,
}

impl SlotBitmap {
    /// Create an all-clear bitmap covering exactly `bits` bits
    ///
    /// Fails with `InvalidCapacity` if `bits` is zero or the word storage
    /// cannot be allocated.
    pub fn with_bits(bits: usize) -> Result<Self> {
        if bits == 0 {
            return Err(Error::InvalidCapacity { capacity: bits });
        }

        let word_count = words_for_bits(bits);
        let mut words = Vec::new();
        words
            .try_reserve_exact(word_count)
            .map_err(|_| Error::InvalidCapacity { capacity: bits })?;
        words.resize(word_count, 0);

        Ok(Self { words, len: bits })
    }

    /// Number of backing words
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len, "bit {} out of range {}", index, self.len);
        self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    /// Set a bit, returning its previous value
    #[inline]
    pub fn set(&mut self, index: usize) -> bool {
        let was = self.get(index);
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
        was
    }

    /// Clear a bit, returning its previous value
    #[inline]
    pub fn clear(&mut self, index: usize) -> bool {
        let was = self.get(index);
        self.words[index / WORD_BITS] &= !(1u64 << (index % WORD_BITS));
        was
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// First clear bit at or after `start`, wrapping past the end
    ///
    /// Probes each bit at most once, so a full bitmap returns `None`
    /// after a single pass.
    pub fn next_clear_from(&self, start: usize) -> Option<usize> {
        let start = start % self.len;
        self.first_clear_in(start, self.len)
            .or_else(|| self.first_clear_in(0, start))
    }

    /// First clear bit in `[lo, hi)`, scanning a word at a time
    fn first_clear_in(&self, lo: usize, hi: usize) -> Option<usize> {
        if lo >= hi {
            return None;
        }

        let first = lo / WORD_BITS;
        let last = (hi - 1) / WORD_BITS;

        for word_idx in first..=last {
            let mut free = !self.words[word_idx];
            if word_idx == first {
                free &= u64::MAX << (lo % WORD_BITS);
            }
            if word_idx == last {
                let end = hi - word_idx * WORD_BITS;
                if end < WORD_BITS {
                    free &= (1u64 << end) - 1;
                }
            }
            if free != 0 {
                return Some(word_idx * WORD_BITS + free.trailing_zeros() as usize);
            }
        }

        None
    }
}
