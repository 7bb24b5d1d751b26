//! Error types for the talos-dist crate.

use talos_units::UnitError;

/// Error type for all fallible operations in the talos-dist crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DistError {
    /// Returned when a distribution parameter is out of range.
    #[error("invalid parameter {name}: {value} ({requirement})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// Human-readable requirement, e.g. "must be finite and > 0".
        requirement: &'static str,
    },

    /// Returned when a probability or weight falls outside its valid range.
    #[error("invalid probability {value}: {requirement}")]
    InvalidProbability {
        /// The offending value.
        value: f64,
        /// Human-readable requirement.
        requirement: &'static str,
    },

    /// Returned when a query argument has the wrong physical dimension.
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// Returned when the underlying statrs distribution rejects its parameters.
    #[error("distribution construction failed: {message}")]
    Construction {
        /// Message reported by statrs.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use talos_units::Dimension;

    #[test]
    fn invalid_parameter_message() {
        let e = DistError::InvalidParameter {
            name: "shape",
            value: -1.0,
            requirement: "must be finite and > 0",
        };
        assert_eq!(
            e.to_string(),
            "invalid parameter shape: -1 (must be finite and > 0)"
        );
    }

    #[test]
    fn unit_error_is_transparent() {
        let e = DistError::from(UnitError::Mismatch {
            expected: Dimension::Time,
            got: Dimension::Power,
        });
        assert_eq!(
            e.to_string(),
            "unit mismatch: expected a time quantity, got power"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<DistError>();
    }
}
