//! # `rankpack` — compact value storage for n-gram language models
//!
//! Large n-gram models hold hundreds of millions of entries, but only a
//! small set of distinct `(probability, back-off)` pairs. `rankpack` stores
//! those values once: deduplicated per-component float tables, a packed
//! minimal-bit-width rank table over them, and a reserved rank slot for the
//! "no explicit value" sentinel.
//!
//! See:
//! * [`values::ProbBackoffTable`] — the value container: build, query,
//!   build-index lifecycle, table-sharing clones.
//! * [`indexer::FloatIndexer`] — the deduplicating value table.
//! * [`packed::PackedRankTable`] — the fixed-width packed word array.
//!
//! ## Crate Features
//!
//! #### feature: ``ahash`` (default)
//!
//! Swaps the hash map implementation for ``ahash``; a performance win on
//! many/(most?) modern CPUs. Done via the ``types::RPHash{*}`` alias
//! machinery.
//!
//! #### feature: ``serde``
//!
//! Derives `Serialize`/`Deserialize` for the persisted state: the two value
//! tables, the packed rank table, and both bit widths. The build index is
//! never serialized; a deserialized container behaves as if already
//! released.
#![warn(missing_docs, unused)]

pub mod errors;
pub mod indexer;
pub mod packed;
pub mod pair;
pub mod types;
pub mod values;

#[doc(inline)]
pub use errors::{RPResult, RankpackError};
#[doc(inline)]
pub use indexer::FloatIndexer;
#[doc(inline)]
pub use packed::PackedRankTable;
#[doc(inline)]
pub use pair::ProbBackoff;
#[doc(inline)]
pub use types::{Rank, RawKey};
#[doc(inline)]
pub use values::{ProbBackoffTable, RankSource, RawKeyCounts, ValuesConfig};
