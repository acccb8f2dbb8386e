//! # Error Types

/// Errors from rankpack operations.
///
/// All of these indicate a build-order or collaborator-contract violation;
/// none is recoverable by retrying. A rank lookup for a key that was simply
/// never registered is not an error (see
/// [`ProbBackoffTable::rank_of`](crate::values::ProbBackoffTable::rank_of)).
#[derive(Debug, thiserror::Error)]
pub enum RankpackError {
    /// `rank_of` was called after the build index was released.
    #[error("build index has been released; rank lookups are no longer valid")]
    IndexReleased,

    /// A packed word does not fit in the table's declared bit width.
    #[error("word {word:#x} does not fit in {width} bits")]
    WordWidthOverflow {
        /// The word that was appended.
        word: u64,
        /// The table's fixed element width.
        width: u8,
    },

    /// An append would exceed the rank table's fixed capacity.
    #[error("rank table capacity ({capacity}) exceeded")]
    CapacityExceeded {
        /// The table's fixed capacity.
        capacity: usize,
    },
}

/// Result type for rankpack operations.
pub type RPResult<T> = core::result::Result<T, RankpackError>;
