//! Configuration for the network fixed-point solver.

use crate::error::NetworkError;

/// Convergence controls for the fixed-point sweep.
///
/// # Example
///
/// ```
/// use talos_network::NetworkConfig;
///
/// let config = NetworkConfig::new()
///     .with_tolerance(1e-10)
///     .with_max_iterations(200);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    tolerance: f64,
    max_iterations: usize,
}

impl NetworkConfig {
    /// Creates a configuration with defaults: `tolerance = 1e-9`,
    /// `max_iterations = 100`.
    pub fn new() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 100,
        }
    }

    /// Sets the convergence tolerance on user-law mass changes.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the sweep budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// The convergence tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// The sweep budget.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Checks that the fields make sense together.
    pub fn validate(&self) -> Result<(), NetworkError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(NetworkError::InvalidConfig {
                reason: format!("tolerance must be finite and positive, got {}", self.tolerance),
            });
        }
        if self.max_iterations < 2 {
            return Err(NetworkError::InvalidConfig {
                reason: format!(
                    "max_iterations must be at least 2 (convergence needs a confirming sweep), got {}",
                    self.max_iterations
                ),
            });
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(NetworkConfig::new().validate().is_ok());
    }

    #[test]
    fn rejects_bad_tolerance() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let c = NetworkConfig::new().with_tolerance(bad);
            assert!(matches!(
                c.validate(),
                Err(NetworkError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn rejects_tiny_sweep_budget() {
        let c = NetworkConfig::new().with_max_iterations(1);
        assert!(matches!(
            c.validate(),
            Err(NetworkError::InvalidConfig { .. })
        ));
    }
}
