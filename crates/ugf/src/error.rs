//! Error types for the talos-ugf crate.

use talos_units::UnitError;

/// Error type for all fallible operations in the talos-ugf crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UgfError {
    /// Returned when extracting a polynomial from a diagram that has not been
    /// solved yet.
    #[error("diagram has not been solved; solve it before extracting a polynomial")]
    NotSolved,

    /// Returned when two time-indexed polynomials cannot be aligned slice by
    /// slice. Single-slice operands broadcast; anything else must match.
    #[error("slice count mismatch: {left} vs {right} (only single-slice operands broadcast)")]
    SliceMismatch {
        /// Slice count of the left operand.
        left: usize,
        /// Slice count of the right operand.
        right: usize,
    },

    /// Returned when a probability mass falls outside `[0, 1]` or the
    /// per-slice total exceeds 1.
    #[error("invalid probability mass {value} (must be in [0, 1] with per-slice totals \u{2264} 1)")]
    InvalidProbability {
        /// The offending mass.
        value: f64,
    },

    /// Returned when operand performance dimensions are incompatible.
    #[error(transparent)]
    Unit(#[from] UnitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_mismatch_message() {
        let e = UgfError::SliceMismatch { left: 3, right: 7 };
        assert_eq!(
            e.to_string(),
            "slice count mismatch: 3 vs 7 (only single-slice operands broadcast)"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<UgfError>();
    }
}
