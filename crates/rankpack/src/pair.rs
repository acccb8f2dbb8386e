//! # Probability/Back-off Value Pairs

use crate::types::RawKey;

/// A probability and back-off weight pair for one n-gram entry.
///
/// Equality is bit-exact (`f32::to_bits`), so the NaN default sentinel
/// compares equal to itself, `0.0` and `-0.0` are distinct, and two NaNs
/// with different payloads are distinct values.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbBackoff {
    /// Log probability.
    pub prob: f32,

    /// Back-off weight.
    pub backoff: f32,
}

impl PartialEq for ProbBackoff {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.prob.to_bits() == other.prob.to_bits()
            && self.backoff.to_bits() == other.backoff.to_bits()
    }
}

impl Eq for ProbBackoff {}

impl Default for ProbBackoff {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ProbBackoff {
    /// The reserved "no explicit value" sentinel: `(NaN, NaN)`.
    ///
    /// Detection is bit-exact: this constant is built from the canonical
    /// `f32::NAN` pattern, and a pair constructed from any other NaN bit
    /// pattern is a *different* distinct value, not the default. Callers
    /// that need the default must go through this constant (or
    /// [`Self::raw_default`]) rather than constructing their own NaNs.
    pub const DEFAULT: Self = Self {
        prob: f32::NAN,
        backoff: f32::NAN,
    };

    /// Create a new pair.
    pub fn new(
        prob: f32,
        backoff: f32,
    ) -> Self {
        Self { prob, backoff }
    }

    /// The raw 64-bit key for this pair.
    ///
    /// ## Returns
    /// The probability's bit pattern in the high 32 bits, the back-off's
    /// in the low 32.
    pub fn as_raw(&self) -> RawKey {
        (u64::from(self.prob.to_bits()) << 32) | u64::from(self.backoff.to_bits())
    }

    /// Decode a raw key back into a pair.
    pub fn from_raw(raw: RawKey) -> Self {
        Self {
            prob: Self::prob_of(raw),
            backoff: Self::backoff_of(raw),
        }
    }

    /// The raw key of the default sentinel.
    pub fn raw_default() -> RawKey {
        Self::DEFAULT.as_raw()
    }

    /// The probability component of a raw key.
    #[inline(always)]
    pub fn prob_of(raw: RawKey) -> f32 {
        f32::from_bits((raw >> 32) as u32)
    }

    /// The back-off component of a raw key.
    #[inline(always)]
    pub fn backoff_of(raw: RawKey) -> f32 {
        f32::from_bits(raw as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip() {
        let pair = ProbBackoff::new(-1.25, 0.5);
        let raw = pair.as_raw();

        assert_eq!(ProbBackoff::prob_of(raw), -1.25);
        assert_eq!(ProbBackoff::backoff_of(raw), 0.5);
        assert_eq!(ProbBackoff::from_raw(raw), pair);
    }

    #[test]
    fn test_default_sentinel() {
        let raw = ProbBackoff::raw_default();

        assert_eq!(ProbBackoff::from_raw(raw), ProbBackoff::DEFAULT);
        assert!(ProbBackoff::prob_of(raw).is_nan());
        assert!(ProbBackoff::backoff_of(raw).is_nan());

        // The sentinel key is stable across calls.
        assert_eq!(raw, ProbBackoff::raw_default());
    }

    #[test]
    fn test_bit_exact_equality() {
        assert_eq!(ProbBackoff::DEFAULT, ProbBackoff::DEFAULT);
        assert_ne!(
            ProbBackoff::new(0.0, 0.0),
            ProbBackoff::new(-0.0, 0.0),
        );

        // A NaN with a non-canonical payload is not the default.
        let odd_nan = f32::from_bits(f32::NAN.to_bits() ^ 1);
        assert!(odd_nan.is_nan());
        assert_ne!(ProbBackoff::new(odd_nan, f32::NAN), ProbBackoff::DEFAULT);
    }
}
