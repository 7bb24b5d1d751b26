//! Error types for the talos-diagram crate.

use talos_units::UnitError;

/// Tolerance on the total initial probability mass of a diagram.
pub const PROB_TOL: f64 = 1e-9;

/// Error type for all fallible operations in the talos-diagram crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiagramError {
    /// Returned when a single probability falls outside `[0, 1]`.
    #[error("invalid probability for state {index}: {value} (must be in [0, 1])")]
    ProbabilityOutOfRange {
        /// State index the probability belongs to.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when the initial probabilities sum beyond 1.
    #[error("initial probabilities sum to {sum}, exceeding 1")]
    ProbabilityMassExceeded {
        /// The accumulated sum.
        sum: f64,
    },

    /// Returned when a complete diagram's initial probabilities do not sum to 1.
    #[error("initial probabilities sum to {sum}, expected 1 within {PROB_TOL:e}")]
    ProbabilityMassIncomplete {
        /// The accumulated sum.
        sum: f64,
    },

    /// Returned when a transition rate is not a finite positive number.
    #[error("invalid transition rate {value} (must be finite and > 0)")]
    InvalidRate {
        /// The offending value.
        value: f64,
    },

    /// Returned when a transition references a state that does not exist.
    #[error("unknown state index {index} (diagram has {n_states} states)")]
    UnknownState {
        /// The referenced index.
        index: usize,
        /// Number of states currently in the diagram.
        n_states: usize,
    },

    /// Returned when a diagram with no states is asked to solve or validate.
    #[error("diagram has no states")]
    Empty,

    /// Returned when solved trajectories are requested before solving.
    #[error("diagram has not been solved")]
    NotSolved,

    /// Returned when supplied solution arrays have inconsistent shapes.
    #[error("solution shape mismatch: {reason}")]
    SolutionShape {
        /// Description of the inconsistency.
        reason: String,
    },

    /// Returned when a performance value or rate has the wrong dimension.
    #[error(transparent)]
    Unit(#[from] UnitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_state_message() {
        let e = DiagramError::UnknownState {
            index: 4,
            n_states: 2,
        };
        assert_eq!(e.to_string(), "unknown state index 4 (diagram has 2 states)");
    }

    #[test]
    fn mass_messages() {
        let e = DiagramError::ProbabilityMassExceeded { sum: 1.25 };
        assert_eq!(e.to_string(), "initial probabilities sum to 1.25, exceeding 1");
    }

    #[test]
    fn invalid_rate_message() {
        let e = DiagramError::InvalidRate { value: -2.0 };
        assert_eq!(
            e.to_string(),
            "invalid transition rate -2 (must be finite and > 0)"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<DiagramError>();
    }
}
