//! Configuration for the process solvers.

use talos_units::{Dimension, Quantity, Unit};

use crate::error::SolverError;

/// Configuration shared by all three process solvers.
///
/// Time values carry units; they are converted to base hours at the point of
/// use. The numerical tolerance and step size are explicit parameters, never
/// hidden constants.
///
/// # Example
///
/// ```
/// use talos_solver::SolveConfig;
/// use talos_units::{Quantity, Unit};
///
/// let config = SolveConfig::new()
///     .with_horizon(Quantity::new(2.0, Unit::Year))
///     .with_step(Quantity::new(1.0, Unit::Hour))
///     .with_tolerance(1e-8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct SolveConfig {
    start: Quantity,
    horizon: Quantity,
    step: Quantity,
    tolerance: f64,
}

impl SolveConfig {
    /// Creates a configuration with defaults.
    ///
    /// Defaults: `start = 0 h`, `horizon = 1 yr`, `step = 1 h`,
    /// `tolerance = 1e-8`.
    pub fn new() -> Self {
        Self {
            start: Quantity::new(0.0, Unit::Hour),
            horizon: Quantity::new(1.0, Unit::Year),
            step: Quantity::new(1.0, Unit::Hour),
            tolerance: 1e-8,
        }
    }

    /// Sets the start of the output time grid.
    pub fn with_start(mut self, start: Quantity) -> Self {
        self.start = start;
        self
    }

    /// Sets the end of the output time grid.
    pub fn with_horizon(mut self, horizon: Quantity) -> Self {
        self.horizon = horizon;
        self
    }

    /// Sets the output (and semi-Markov quadrature) step.
    pub fn with_step(mut self, step: Quantity) -> Self {
        self.step = step;
        self
    }

    /// Sets the numerical tolerance (integrator error control, pivot floor).
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    // --- Accessors ---

    /// Start of the grid.
    pub fn start(&self) -> Quantity {
        self.start
    }

    /// End of the grid.
    pub fn horizon(&self) -> Quantity {
        self.horizon
    }

    /// Grid step.
    pub fn step(&self) -> Quantity {
        self.step
    }

    /// Numerical tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Start in base hours.
    pub fn start_hours(&self) -> f64 {
        self.start.to_base()
    }

    /// Horizon in base hours.
    pub fn horizon_hours(&self) -> f64 {
        self.horizon.to_base()
    }

    /// Step in base hours.
    pub fn step_hours(&self) -> f64 {
        self.step.to_base()
    }

    /// The uniform output grid `start, start+step, …` up to the horizon,
    /// in base hours. The horizon itself is included when it falls on the
    /// grid within half a step of rounding.
    pub fn grid(&self) -> Vec<f64> {
        let start = self.start_hours();
        let dt = self.step_hours();
        let n = ((self.horizon_hours() - start) / dt + 0.5).floor() as usize;
        (0..=n).map(|k| start + k as f64 * dt).collect()
    }

    /// Validates the configuration.
    ///
    /// Checks time dimensions, `0 <= start < horizon`, a positive step no
    /// larger than the span, and a finite positive tolerance.
    pub fn validate(&self) -> Result<(), SolverError> {
        for (name, q) in [("start", &self.start), ("horizon", &self.horizon), ("step", &self.step)]
        {
            if q.expect_dimension(Dimension::Time).is_err() {
                return Err(SolverError::InvalidConfig {
                    reason: format!("{name} must be a time quantity, got {}", q.unit()),
                });
            }
            if !q.to_base().is_finite() {
                return Err(SolverError::InvalidConfig {
                    reason: format!("{name} must be finite, got {}", q.value()),
                });
            }
        }
        let start = self.start_hours();
        let horizon = self.horizon_hours();
        let step = self.step_hours();
        if start < 0.0 {
            return Err(SolverError::InvalidConfig {
                reason: format!("start must be >= 0, got {start} h"),
            });
        }
        if horizon <= start {
            return Err(SolverError::InvalidConfig {
                reason: format!("horizon ({horizon} h) must exceed start ({start} h)"),
            });
        }
        if step <= 0.0 || step > horizon - start {
            return Err(SolverError::InvalidConfig {
                reason: format!("step must be in (0, horizon - start], got {step} h"),
            });
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(SolverError::InvalidConfig {
                reason: format!("tolerance must be finite and > 0, got {}", self.tolerance),
            });
        }
        Ok(())
    }
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self::new()
    }
}
