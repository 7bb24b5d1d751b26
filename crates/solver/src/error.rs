//! Error types for the talos-solver crate.

use talos_diagram::DiagramError;
use talos_dist::DistError;

/// Error type for all fallible operations in the talos-solver crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SolverError {
    /// Returned when the diagram itself is malformed.
    #[error(transparent)]
    Diagram(#[from] DiagramError),

    /// Returned when a distribution query fails.
    #[error(transparent)]
    Dist(#[from] DistError),

    /// Returned when a solver configuration value is out of range.
    #[error("invalid solver configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a Markov or steady-state solve meets a transition with
    /// no constant rate (a non-exponential or weighted holding time).
    #[error("transition {transition} has no constant rate; use the semi-Markov solver")]
    NotMarkovian {
        /// Arena index of the offending transition.
        transition: usize,
    },

    /// Returned when the steady-state linear system has no unique solution
    /// and the communicating-class decomposition cannot recover one.
    #[error("steady-state system is singular: {reason}")]
    Singular {
        /// Description of the structural cause.
        reason: String,
    },

    /// Returned when the semi-Markov recursion meets a point-mass holding
    /// time, whose density the renewal quadrature cannot represent.
    #[error("transition {transition} has a point-mass holding time, which the semi-Markov quadrature cannot represent")]
    DegenerateHolding {
        /// Arena index of the offending transition.
        transition: usize,
    },

    /// Returned when the adaptive integrator underflows its step size.
    #[error("integration step underflow at t = {t} h (step {step} h)")]
    StepUnderflow {
        /// Time at which the step collapsed, base hours.
        t: f64,
        /// The collapsed step size.
        step: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_markovian_message() {
        let e = SolverError::NotMarkovian { transition: 3 };
        assert_eq!(
            e.to_string(),
            "transition 3 has no constant rate; use the semi-Markov solver"
        );
    }

    #[test]
    fn degenerate_holding_message() {
        let e = SolverError::DegenerateHolding { transition: 1 };
        assert_eq!(
            e.to_string(),
            "transition 1 has a point-mass holding time, which the semi-Markov quadrature cannot represent"
        );
    }

    #[test]
    fn diagram_error_is_transparent() {
        let e = SolverError::from(DiagramError::Empty);
        assert_eq!(e.to_string(), "diagram has no states");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<SolverError>();
    }
}
