//! # Common Types and Aliases

/// A dense integer address into the packed value table.
///
/// Ranks are one level of indirection away from floating-point values:
/// the surrounding trie stores a rank per n-gram entry, and this crate
/// resolves ranks to `(prob, backoff)` pairs.
pub type Rank = u32;

/// An externally-encoded 64-bit raw value key.
///
/// The probability's `f32` bit pattern occupies the high 32 bits and the
/// back-off's the low 32. See [`crate::pair::ProbBackoff::as_raw`].
pub type RawKey = u64;

cfg_if::cfg_if! {
    if #[cfg(feature = "ahash")] {
        /// Type Alias for hash maps in this crate.
        pub type RPHashMap<K, V> = ahash::AHashMap<K, V>;

        /// Create a new empty hash map.
        pub fn hash_map_new<K, V>() -> RPHashMap<K, V> {
            RPHashMap::new()
        }

        /// Create a new hash map with the given capacity.
        pub fn hash_map_with_capacity<K, V>(capacity: usize) -> RPHashMap<K, V> {
            RPHashMap::with_capacity(capacity)
        }
    } else {
        /// Type Alias for hash maps in this crate.
        pub type RPHashMap<K, V> = std::collections::HashMap<K, V>;

        /// Create a new empty hash map.
        pub fn hash_map_new<K, V>() -> RPHashMap<K, V> {
            RPHashMap::new()
        }

        /// Create a new hash map with the given capacity.
        pub fn hash_map_with_capacity<K, V>(capacity: usize) -> RPHashMap<K, V> {
            RPHashMap::with_capacity(capacity)
        }
    }
}
