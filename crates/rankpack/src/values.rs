//! # Probability/Back-off Value Container
//!
//! Language models hold hundreds of millions of n-gram entries, but the
//! set of *distinct* `(prob, backoff)` pairs among them is orders of
//! magnitude smaller. [`ProbBackoffTable`] exploits that redundancy with
//! two levels of deduplication:
//!
//! 1. Each distinct raw pair gets a dense **rank**; the surrounding trie
//!    stores one rank per entry instead of two floats.
//! 2. Each rank's entry is a single packed word holding two sub-indices
//!    into deduplicated per-component float tables, at the minimal bit
//!    width the final table sizes allow.
//!
//! A fixed rank slot ([`ValuesConfig::default_rank`]) is reserved for the
//! `(NaN, NaN)` "no explicit value" sentinel, so lookups for absent values
//! resolve through the same code path as present ones.

use std::sync::Arc;

use crate::errors::{RPResult, RankpackError};
use crate::indexer::FloatIndexer;
use crate::packed::{PackedRankTable, bits_needed};
use crate::pair::ProbBackoff;
use crate::types::{RPHashMap, Rank, RawKey, hash_map_with_capacity};

/// Pre-aggregated occurrence counts for raw value keys.
pub type RawKeyCounts = RPHashMap<RawKey, u64>;

/// The external rank-assignment collaborator.
///
/// Implemented by the surrounding trie/rank-storage layer: it maps an
/// n-gram's `(order, index)` position to the rank it assigned during
/// insertion. This container only resolves ranks to values.
pub trait RankSource {
    /// The rank stored for the entry at `index` within n-gram `order`.
    fn rank_at(
        &self,
        order: usize,
        index: u64,
    ) -> Rank;
}

/// Pass-through configuration for a value container.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValuesConfig {
    /// Radix used by the surrounding trie's value encoding.
    pub value_radix: u32,

    /// Whether the surrounding structure also tracks prefix ranks.
    pub store_suffix_indexes: bool,

    /// Maximum n-gram order routed through this container.
    pub max_ngram_order: usize,

    /// Reserved rank slot for the default sentinel pair, fixed for the
    /// lifetime of the container.
    pub default_rank: Rank,
}

/// The immutable tables produced by the build: shared by all containers
/// cloned from one build via [`ProbBackoffTable::share`].
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct SharedTables {
    /// Distinct probabilities, indexed by probability id.
    probs: Vec<f32>,

    /// Distinct back-off weights, indexed by back-off id.
    backoffs: Vec<f32>,

    /// Packed `(prob id, backoff id)` word per rank.
    ranks: PackedRankTable,

    /// Bits of each packed word holding the back-off id.
    backoff_width: u8,

    /// Bits needed to address any rank; published for the surrounding
    /// trie to size its own rank-storage fields.
    word_width: u8,
}

impl SharedTables {
    #[inline(always)]
    fn backoff_mask(&self) -> u64 {
        (1u64 << self.backoff_width) - 1
    }

    #[inline(always)]
    fn prob_id_of(
        &self,
        word: u64,
    ) -> u32 {
        (word >> self.backoff_width) as u32
    }

    #[inline(always)]
    fn backoff_id_of(
        &self,
        word: u64,
    ) -> u32 {
        (word & self.backoff_mask()) as u32
    }
}

/// Pack two component ids into one rank-table word.
#[inline(always)]
fn combine(
    prob_id: u32,
    backoff_id: u32,
    backoff_width: u8,
) -> u64 {
    (u64::from(prob_id) << backoff_width) | u64::from(backoff_id)
}

/// Deduplicated, bit-packed rank-to-value storage for `(prob, backoff)`
/// pairs.
///
/// Built once from pre-aggregated key counts; immutable thereafter. The
/// lifecycle has three phases:
///
/// 1. **Building** — [`ProbBackoffTable::build`] runs the two-pass
///    dedup-and-pack algorithm.
/// 2. **Queryable, index present** — the surrounding trie translates raw
///    keys to ranks via [`rank_of`](Self::rank_of) while inserting
///    entries; rank-level queries are already valid.
/// 3. **Queryable, index released** — after [`release`](Self::release)
///    the build index is gone, `rank_of` is an error, and only
///    rank-to-value queries remain.
///
/// There is no transition backward. Once built, the tables are immutable
/// and safe for unlocked concurrent reads; `release` is the single
/// mutating event and must be ordered after all `rank_of` callers by the
/// owner.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbBackoffTable {
    tables: Arc<SharedTables>,

    /// Construction-only raw-key-to-rank index; shared (not copied) by
    /// clones, dropped per instance by `release`. Never persisted: a
    /// deserialized container behaves as if already released.
    #[cfg_attr(feature = "serde", serde(skip))]
    build_index: Option<Arc<RPHashMap<RawKey, Rank>>>,

    config: ValuesConfig,
}

impl ProbBackoffTable {
    /// Build a container from pre-aggregated raw-key counts.
    ///
    /// Distinct keys are processed in descending count order (ties broken
    /// on ascending raw key; this tie-break is implementation-defined and
    /// not a stable contract). The default sentinel's components are
    /// registered first, so they always hold id 0 in both value tables.
    /// When the sentinel key is absent from `counts`, a slot is reserved
    /// for it at `config.default_rank`; when it occurs naturally, its
    /// frequency position wins and no slot is reserved, so the caller is
    /// expected to supply a `default_rank` matching that position.
    ///
    /// ## Arguments
    /// * `counts` - Occurrence count per distinct raw value key.
    /// * `config` - Pass-through configuration and the reserved default
    ///   rank slot.
    ///
    /// ## Returns
    /// A fully built, queryable container with its build index present.
    pub fn build(
        counts: &RawKeyCounts,
        config: &ValuesConfig,
    ) -> RPResult<Self> {
        let default_key = ProbBackoff::raw_default();
        let has_default = counts.contains_key(&default_key);

        log::info!("storing values: {} distinct pairs", counts.len());

        let mut by_count: Vec<(RawKey, u64)> =
            counts.iter().map(|(&key, &count)| (key, count)).collect();
        by_count.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        // Pass 1: finalize component ids, default components first so
        // they get id 0 in both tables.
        let mut prob_indexer = FloatIndexer::new();
        let mut backoff_indexer = FloatIndexer::new();
        prob_indexer.index_of(ProbBackoff::prob_of(default_key));
        backoff_indexer.index_of(ProbBackoff::backoff_of(default_key));
        for &(key, _) in &by_count {
            prob_indexer.index_of(ProbBackoff::prob_of(key));
            backoff_indexer.index_of(ProbBackoff::backoff_of(key));
        }

        let backoff_width = bits_needed(backoff_indexer.len());
        let width = bits_needed(prob_indexer.len()) + backoff_width;

        let capacity = by_count.len() + usize::from(!has_default);
        let mut ranks = PackedRankTable::with_capacity(capacity, width);
        let mut build_index: RPHashMap<RawKey, Rank> = hash_map_with_capacity(capacity);

        let default_word = combine(
            prob_indexer.index_of(ProbBackoff::prob_of(default_key)),
            backoff_indexer.index_of(ProbBackoff::backoff_of(default_key)),
            backoff_width,
        );
        let mut default_stored = has_default;

        // Pass 2: append packed words in the same order, reserving the
        // default slot on the way past it.
        for &(key, _) in &by_count {
            if !default_stored && ranks.len() as Rank == config.default_rank {
                build_index.insert(default_key, ranks.len() as Rank);
                ranks.append(default_word)?;
                default_stored = true;
            }

            let word = combine(
                prob_indexer.index_of(ProbBackoff::prob_of(key)),
                backoff_indexer.index_of(ProbBackoff::backoff_of(key)),
                backoff_width,
            );
            build_index.insert(key, ranks.len() as Rank);
            ranks.append(word)?;
        }

        // The reserved slot lies at or past the end of the natural keys.
        if !default_stored {
            build_index.insert(default_key, ranks.len() as Rank);
            ranks.append(default_word)?;
        }

        let word_width = bits_needed(ranks.len());
        log::info!(
            "storing rank indices using {word_width} bits ({} ranks, {}+{} component bits)",
            ranks.len(),
            width - backoff_width,
            backoff_width,
        );

        Ok(Self {
            tables: Arc::new(SharedTables {
                probs: prob_indexer.into_values(),
                backoffs: backoff_indexer.into_values(),
                ranks,
                backoff_width,
                word_width,
            }),
            build_index: Some(Arc::new(build_index)),
            config: config.clone(),
        })
    }

    /// The probability stored at `rank`.
    ///
    /// ## Panics
    /// If `rank` is out of bounds.
    #[inline(always)]
    pub fn prob_of_rank(
        &self,
        rank: Rank,
    ) -> f32 {
        let t = &self.tables;
        let word = t.ranks.get(rank as usize);
        t.probs[t.prob_id_of(word) as usize]
    }

    /// The back-off weight stored at `rank`.
    ///
    /// ## Panics
    /// If `rank` is out of bounds.
    #[inline(always)]
    pub fn backoff_of_rank(
        &self,
        rank: Rank,
    ) -> f32 {
        let t = &self.tables;
        let word = t.ranks.get(rank as usize);
        t.backoffs[t.backoff_id_of(word) as usize]
    }

    /// Write both fields of the pair at `rank` into `out`.
    ///
    /// Takes a caller-supplied output to avoid per-call allocation on hot
    /// query paths; see [`scratch_pair`](Self::scratch_pair).
    #[inline(always)]
    pub fn pair_of_rank(
        &self,
        rank: Rank,
        out: &mut ProbBackoff,
    ) {
        let t = &self.tables;
        let word = t.ranks.get(rank as usize);
        out.prob = t.probs[t.prob_id_of(word) as usize];
        out.backoff = t.backoffs[t.backoff_id_of(word) as usize];
    }

    /// The probability for the entry at `(order, index)`, resolving the
    /// rank through the external collaborator.
    pub fn prob_at<R: RankSource>(
        &self,
        source: &R,
        order: usize,
        index: u64,
    ) -> f32 {
        self.prob_of_rank(source.rank_at(order, index))
    }

    /// The back-off weight for the entry at `(order, index)`.
    pub fn backoff_at<R: RankSource>(
        &self,
        source: &R,
        order: usize,
        index: u64,
    ) -> f32 {
        self.backoff_of_rank(source.rank_at(order, index))
    }

    /// Write the pair for the entry at `(order, index)` into `out`.
    pub fn pair_at<R: RankSource>(
        &self,
        source: &R,
        order: usize,
        index: u64,
        out: &mut ProbBackoff,
    ) {
        self.pair_of_rank(source.rank_at(order, index), out);
    }

    /// The rank assigned to `key` during the build.
    ///
    /// Valid only while the build index is present; used by the trie
    /// insertion pass to translate its raw values into ranks.
    ///
    /// ## Returns
    /// `Ok(None)` if `key` was never registered (the trie may legitimately
    /// probe for keys it has not decided to insert);
    /// [`RankpackError::IndexReleased`] after [`release`](Self::release).
    pub fn rank_of(
        &self,
        key: RawKey,
    ) -> RPResult<Option<Rank>> {
        match &self.build_index {
            Some(index) => Ok(index.get(&key).copied()),
            None => Err(RankpackError::IndexReleased),
        }
    }

    /// Discard this instance's handle on the build index.
    ///
    /// Call once the surrounding trie has finished inserting entries. The
    /// index memory is freed when every sharing instance has released it.
    /// After release, [`rank_of`](Self::rank_of) fails.
    pub fn release(&mut self) {
        self.build_index = None;
    }

    /// Whether this instance still holds the build index.
    pub fn is_released(&self) -> bool {
        self.build_index.is_none()
    }

    /// A new container sharing the same immutable tables (and build
    /// index, if still present) as this one.
    ///
    /// Used when multiple per-order rank-storage owners need one value
    /// vocabulary: the tables are never deep-copied, each instance is just
    /// a lightweight wrapper over the shared handles.
    pub fn share(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            build_index: self.build_index.clone(),
            config: self.config.clone(),
        }
    }

    /// Bits needed to address any rank in this container; the surrounding
    /// trie sizes its rank-storage fields from this.
    pub fn word_width(&self) -> u8 {
        self.tables.word_width
    }

    /// Bits of each packed word holding the back-off id.
    pub fn backoff_width(&self) -> u8 {
        self.tables.backoff_width
    }

    /// Number of rank slots.
    pub fn len(&self) -> usize {
        self.tables.ranks.len()
    }

    /// Whether the container holds no ranks.
    pub fn is_empty(&self) -> bool {
        self.tables.ranks.is_empty()
    }

    /// The configuration this container was built with.
    pub fn config(&self) -> &ValuesConfig {
        &self.config
    }

    /// A default-sentinel pair for use as a query output buffer.
    pub fn scratch_pair(&self) -> ProbBackoff {
        ProbBackoff::DEFAULT
    }
}
