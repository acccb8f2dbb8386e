//! # Fixed-Width Packed Word Storage

use crate::errors::{RPResult, RankpackError};

/// Minimal bits needed to encode ids for `k` distinct values.
///
/// This is `ceil(log2(k))`, with the convention that a table of size <= 1
/// needs 0 bits: when only one value is possible, its id needs no encoding.
pub fn bits_needed(k: usize) -> u8 {
    if k <= 1 {
        0
    } else {
        (usize::BITS - (k - 1).leading_zeros()) as u8
    }
}

/// A fixed-capacity array of `width`-bit unsigned words packed into `u64`s.
///
/// Element width is fixed at construction (`0..=64` bits) and elements are
/// stored back to back with no per-element padding, spanning backing-word
/// boundaries where needed. A zero-width table stores no bits at all and
/// reads back `0` for every element.
///
/// Appends are checked: a word wider than `width` bits or an append past
/// the declared capacity is an error, never a silent truncation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackedRankTable {
    words: Vec<u64>,
    width: u8,
    capacity: usize,
    len: usize,
}

impl PackedRankTable {
    /// Create a table for `capacity` elements of `width` bits each.
    ///
    /// ## Arguments
    /// * `capacity` - The fixed number of elements the table will hold.
    /// * `width` - The per-element bit width.
    ///
    /// ## Panics
    /// If `width > 64`.
    pub fn with_capacity(
        capacity: usize,
        width: u8,
    ) -> Self {
        assert!(width <= 64, "element width {width} exceeds 64 bits");
        let total_bits = capacity * width as usize;
        Self {
            words: vec![0u64; total_bits.div_ceil(64)],
            width,
            capacity,
            len: 0,
        }
    }

    #[inline(always)]
    fn mask(&self) -> u64 {
        if self.width == 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }

    /// Append `word` as the next element.
    ///
    /// ## Returns
    /// An error if `word` does not fit in the element width, or if the
    /// table is already at capacity.
    pub fn append(
        &mut self,
        word: u64,
    ) -> RPResult<()> {
        if word & !self.mask() != 0 {
            return Err(RankpackError::WordWidthOverflow {
                word,
                width: self.width,
            });
        }
        if self.len == self.capacity {
            return Err(RankpackError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        if self.width > 0 {
            let bit = self.len * self.width as usize;
            let slot = bit / 64;
            let offset = bit % 64;
            self.words[slot] |= word << offset;

            // Bits that did not fit spill into the next backing word.
            let room = 64 - offset;
            if (self.width as usize) > room {
                self.words[slot + 1] |= word >> room;
            }
        }

        self.len += 1;
        Ok(())
    }

    /// The element at `rank`.
    ///
    /// ## Panics
    /// If `rank >= len()`.
    #[inline(always)]
    pub fn get(
        &self,
        rank: usize,
    ) -> u64 {
        assert!(
            rank < self.len,
            "rank {rank} out of bounds (len {})",
            self.len
        );
        if self.width == 0 {
            return 0;
        }

        let bit = rank * self.width as usize;
        let slot = bit / 64;
        let offset = bit % 64;

        let mut word = self.words[slot] >> offset;
        let room = 64 - offset;
        if (self.width as usize) > room {
            word |= self.words[slot + 1] << room;
        }
        word & self.mask()
    }

    /// Number of appended elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no elements have been appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The fixed element capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The fixed per-element bit width.
    pub fn width(&self) -> u8 {
        self.width
    }
}
