#![allow(missing_docs)]

use rankpack::{
    ProbBackoff, ProbBackoffTable, Rank, RankpackError, RawKeyCounts, ValuesConfig,
    types::hash_map_new,
};

const SAMPLE_PAIRS: &[(f32, f32, u64)] = &[
    (-0.30103, 0.0, 4012),
    (-1.0, -0.25, 907),
    (-2.5, -0.25, 907),
    (-0.5, -0.60206, 311),
    (-3.75, 0.0, 44),
    (-1.0, 0.125, 44),
    (-6.25, -1.5, 1),
];

fn config(default_rank: Rank) -> ValuesConfig {
    ValuesConfig {
        value_radix: 6,
        store_suffix_indexes: false,
        max_ngram_order: 5,
        default_rank,
    }
}

fn counts_of(entries: &[(f32, f32, u64)]) -> RawKeyCounts {
    let mut counts = hash_map_new();
    for &(prob, backoff, count) in entries {
        counts.insert(ProbBackoff::new(prob, backoff).as_raw(), count);
    }
    counts
}

/// Every input key resolves, through its assigned rank, to bit-exactly the
/// pair it encodes.
#[test]
fn roundtrip_all_keys() {
    let counts = counts_of(SAMPLE_PAIRS);
    let table = ProbBackoffTable::build(&counts, &config(2)).unwrap();

    for &key in counts.keys() {
        let rank = table
            .rank_of(key)
            .unwrap()
            .unwrap_or_else(|| panic!("key {key:#x} not registered"));

        let mut out = table.scratch_pair();
        table.pair_of_rank(rank, &mut out);
        assert_eq!(out, ProbBackoff::from_raw(key), "rank {rank}");
        assert_eq!(
            table.prob_of_rank(rank).to_bits(),
            ProbBackoff::prob_of(key).to_bits()
        );
        assert_eq!(
            table.backoff_of_rank(rank).to_bits(),
            ProbBackoff::backoff_of(key).to_bits()
        );
    }
}

/// The reserved slot holds the sentinel wherever the slot falls: first,
/// mid-table, past the end of the natural keys, or when the sentinel
/// occurs naturally in the input.
#[test]
fn default_slot_invariant() {
    let natural_len = SAMPLE_PAIRS.len() as Rank;

    for default_rank in [0, 1, 3, natural_len] {
        let counts = counts_of(SAMPLE_PAIRS);
        let table = ProbBackoffTable::build(&counts, &config(default_rank)).unwrap();

        assert_eq!(table.len(), SAMPLE_PAIRS.len() + 1);

        let mut out = ProbBackoff::new(0.0, 0.0);
        table.pair_of_rank(default_rank, &mut out);
        assert_eq!(out, ProbBackoff::DEFAULT, "default_rank {default_rank}");
        assert_eq!(
            table.rank_of(ProbBackoff::raw_default()).unwrap(),
            Some(default_rank)
        );

        // The reservation displaces no natural key.
        for &key in counts.keys() {
            let rank = table.rank_of(key).unwrap().unwrap();
            let mut out = table.scratch_pair();
            table.pair_of_rank(rank, &mut out);
            assert_eq!(out, ProbBackoff::from_raw(key));
        }
    }

    // Naturally occurring sentinel: no extra slot, frequency position wins.
    let mut counts = counts_of(SAMPLE_PAIRS);
    counts.insert(ProbBackoff::raw_default(), 1_000_000);
    let table = ProbBackoffTable::build(&counts, &config(0)).unwrap();

    assert_eq!(table.len(), SAMPLE_PAIRS.len() + 1);
    let mut out = ProbBackoff::new(0.0, 0.0);
    table.pair_of_rank(0, &mut out);
    assert_eq!(out, ProbBackoff::DEFAULT);
}

/// A sentinel that occurs naturally at a *low* frequency keeps its
/// frequency position: the reserved slot is only enforced when the
/// sentinel is absent from the input. This pins the original container's
/// behavior; the slot constant is expected to point at the sentinel's
/// actual position in this case.
#[test]
fn natural_default_at_low_frequency_keeps_its_position() {
    let mut counts = counts_of(&[(0.1, 0.5, 100), (0.2, 0.0, 50)]);
    counts.insert(ProbBackoff::raw_default(), 1);

    let table = ProbBackoffTable::build(&counts, &config(0)).unwrap();

    // No extra slot: the sentinel is one of the three natural keys.
    assert_eq!(table.len(), 3);

    // It sorts last by count and lands at rank 2, not at the configured
    // slot 0.
    assert_eq!(
        table.rank_of(ProbBackoff::raw_default()).unwrap(),
        Some(2)
    );
    let mut out = ProbBackoff::new(0.0, 0.0);
    table.pair_of_rank(2, &mut out);
    assert_eq!(out, ProbBackoff::DEFAULT);

    // Slot 0 holds the top-frequency pair instead.
    table.pair_of_rank(0, &mut out);
    assert_eq!(out, ProbBackoff::new(0.1, 0.5));
}

/// Reserved slot falling mid-way through the frequency-ordered keys: two
/// keys, sentinel absent, slot 1.
#[test]
fn default_slot_mid_loop_scenario() {
    let counts = counts_of(&[(0.1, 0.5, 100), (0.2, 0.0, 50)]);
    let table = ProbBackoffTable::build(&counts, &config(1)).unwrap();

    assert_eq!(table.len(), 3);

    let mut out = ProbBackoff::new(0.0, 0.0);
    table.pair_of_rank(1, &mut out);
    assert_eq!(out, ProbBackoff::DEFAULT);

    let rank = table
        .rank_of(ProbBackoff::new(0.1, 0.5).as_raw())
        .unwrap()
        .unwrap();
    assert_ne!(rank, 1);
    assert_eq!(table.prob_of_rank(rank), 0.1);

    // Most frequent key still precedes the less frequent one.
    let rank2 = table
        .rank_of(ProbBackoff::new(0.2, 0.0).as_raw())
        .unwrap()
        .unwrap();
    assert!(rank < rank2);
}

/// A single distinct back-off means zero back-off bits; every rank reads
/// back that one value.
#[test]
fn single_backoff_zero_width() {
    // All keys share backoff NaN (the sentinel's own back-off component),
    // so the back-off table has exactly one distinct value.
    let entries: Vec<(f32, f32, u64)> = (0..6)
        .map(|i| (-(i as f32) - 0.5, f32::NAN, 10 - i as u64))
        .collect();
    let counts = counts_of(&entries);
    let table = ProbBackoffTable::build(&counts, &config(0)).unwrap();

    assert_eq!(table.backoff_width(), 0);
    for rank in 0..table.len() as Rank {
        assert!(table.backoff_of_rank(rank).is_nan(), "rank {rank}");
    }
}

#[test]
fn release_semantics() {
    let counts = counts_of(SAMPLE_PAIRS);
    let mut table = ProbBackoffTable::build(&counts, &config(0)).unwrap();
    let key = ProbBackoff::new(-1.0, -0.25).as_raw();

    // Before release: hit or clean miss, never a failure.
    assert!(table.rank_of(key).unwrap().is_some());
    assert_eq!(table.rank_of(0x1234_5678_9abc_def0).unwrap(), None);

    table.release();
    assert!(matches!(
        table.rank_of(key),
        Err(RankpackError::IndexReleased)
    ));

    // Rank-level queries are unaffected by release.
    let mut out = table.scratch_pair();
    table.pair_of_rank(table.config().default_rank, &mut out);
    assert_eq!(out, ProbBackoff::DEFAULT);
}

/// Clones share tables and build index; releasing one does not release
/// the other.
#[test]
fn sharing_clones() {
    let counts = counts_of(SAMPLE_PAIRS);
    let mut original = ProbBackoffTable::build(&counts, &config(2)).unwrap();
    let shared = original.share();

    assert_eq!(shared.word_width(), original.word_width());
    assert_eq!(shared.len(), original.len());

    for rank in 0..original.len() as Rank {
        assert_eq!(
            shared.prob_of_rank(rank).to_bits(),
            original.prob_of_rank(rank).to_bits()
        );
        assert_eq!(
            shared.backoff_of_rank(rank).to_bits(),
            original.backoff_of_rank(rank).to_bits()
        );
    }

    let key = ProbBackoff::new(-0.30103, 0.0).as_raw();
    assert_eq!(shared.rank_of(key).unwrap(), original.rank_of(key).unwrap());

    original.release();
    assert!(original.rank_of(key).is_err());
    assert!(shared.rank_of(key).unwrap().is_some(), "clone keeps its handle");
}

/// Repeated queries on a built table return identical results.
#[test]
fn idempotent_queries() {
    let counts = counts_of(SAMPLE_PAIRS);
    let table = ProbBackoffTable::build(&counts, &config(1)).unwrap();

    for rank in 0..table.len() as Rank {
        let first = (
            table.prob_of_rank(rank).to_bits(),
            table.backoff_of_rank(rank).to_bits(),
        );
        for _ in 0..3 {
            let again = (
                table.prob_of_rank(rank).to_bits(),
                table.backoff_of_rank(rank).to_bits(),
            );
            assert_eq!(again, first, "rank {rank}");
        }
    }
}

/// Dedup: table sizes equal the bit-distinct component counts, not the
/// key count.
#[test]
fn dedup_collapses_components() {
    // 7 keys over 6 distinct probs and 5 distinct backoffs; the sentinel
    // adds one more of each.
    let counts = counts_of(SAMPLE_PAIRS);
    let table = ProbBackoffTable::build(&counts, &config(0)).unwrap();

    // 6 distinct backoffs (incl. NaN) -> 3 bits.
    assert_eq!(table.backoff_width(), 3);
    // 8 ranks -> 3 bits to address them.
    assert_eq!(table.len(), 8);
    assert_eq!(table.word_width(), 3);
}

#[test]
fn empty_input_still_has_default() {
    let counts: RawKeyCounts = hash_map_new();
    let table = ProbBackoffTable::build(&counts, &config(0)).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.word_width(), 0);
    assert_eq!(table.backoff_width(), 0);

    let mut out = ProbBackoff::new(0.0, 0.0);
    table.pair_of_rank(0, &mut out);
    assert_eq!(out, ProbBackoff::DEFAULT);
}
