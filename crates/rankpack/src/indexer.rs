//! # Deduplicating Float Value Table

use crate::types::{RPHashMap, hash_map_new};

/// Append-only table assigning stable sequential ids to distinct `f32`s.
///
/// Distinctness is bit-exact (`f32::to_bits`): `0.0` and `-0.0` are two
/// values, and NaNs with different payloads are different values. Ids are
/// assigned in first-seen order, so table contents are a deterministic
/// function of the `index_of` call sequence — the build and query phases
/// of one container rely on that determinism to agree on bit widths.
#[derive(Debug)]
pub struct FloatIndexer {
    /// Hash map from value bit pattern to assigned id.
    ids: RPHashMap<u32, u32>,

    /// Values in id order.
    values: Vec<f32>,
}

// Not derived: `ahash::AHashMap` only implements `Default` when one of the
// rng features is enabled, and this crate pins ahash to `std` only.
impl Default for FloatIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl FloatIndexer {
    /// Create an empty indexer.
    pub fn new() -> Self {
        Self {
            ids: hash_map_new(),
            values: Vec::new(),
        }
    }

    /// Get the id for `value`, assigning the next sequential id on first
    /// sight.
    pub fn index_of(
        &mut self,
        value: f32,
    ) -> u32 {
        let bits = value.to_bits();
        if let Some(&id) = self.ids.get(&bits) {
            return id;
        }
        let id = self.values.len() as u32;
        self.ids.insert(bits, id);
        self.values.push(value);
        id
    }

    /// The value assigned to `id`.
    ///
    /// ## Panics
    /// If `id` was never assigned.
    #[inline(always)]
    pub fn value_of(
        &self,
        id: u32,
    ) -> f32 {
        self.values[id as usize]
    }

    /// Values in id order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of distinct values seen.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values have been seen.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the indexer into its dense id-to-value array.
    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}
