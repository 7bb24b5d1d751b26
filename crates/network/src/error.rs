//! Error types for the talos-network crate.

use talos_ugf::UgfError;

/// Error type for all fallible operations in the talos-network crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// Returned when a source or component is attached from an unsolved
    /// diagram. Solve the diagram first; the network only ever stores
    /// extracted performance laws.
    #[error("cannot attach {element}: its diagram has not been solved")]
    UnsolvedModel {
        /// Human-readable description of the offending element.
        element: String,
    },

    /// Returned when a user node cannot be reached from any source.
    #[error("user node {node} is unreachable from every source")]
    Unreachable {
        /// The isolated user node id.
        node: usize,
    },

    /// Returned when a configuration field fails validation.
    #[error("invalid network configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// Returned when the fixed-point sweep fails to settle. The last iterate
    /// is still stored on the user nodes.
    #[error("fixed point not reached after {iterations} sweeps (residual {residual:e})")]
    NonConvergent {
        /// Number of sweeps performed.
        iterations: usize,
        /// Largest user-law mass change in the last sweep.
        residual: f64,
    },

    /// Returned when a u-function operation inside the sweep fails.
    #[error(transparent)]
    Ugf(#[from] UgfError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_convergent_message() {
        let e = NetworkError::NonConvergent {
            iterations: 50,
            residual: 0.125,
        };
        assert_eq!(
            e.to_string(),
            "fixed point not reached after 50 sweeps (residual 1.25e-1)"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<NetworkError>();
    }
}
