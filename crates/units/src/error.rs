//! Error types for the talos-units crate.

use crate::Dimension;

/// Error type for all fallible operations in the talos-units crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    /// Returned when two quantities of different physical dimensions are combined.
    #[error("unit mismatch: expected a {expected} quantity, got {got}")]
    Mismatch {
        /// The dimension required by the operation.
        expected: Dimension,
        /// The dimension actually supplied.
        got: Dimension,
    },
}
