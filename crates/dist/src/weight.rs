//! Time-dependent weight factor attached to every distribution.
//!
//! A weight scales the whole probability mass of a holding-time law, so that
//! `cdf + ccdf = weight(t)` instead of 1. Competing transitions out of one
//! state use weights below 1 to split the exit mass between causes.

use std::fmt;
use std::sync::Arc;

use crate::error::DistError;

/// A weight multiplier, either constant or a function of elapsed time.
///
/// A constant weight must lie in `(0, 1]`. A varying weight is a caller
/// supplied function of elapsed time (base hours); its values are expected in
/// `(0, 1]` but are only checked where they are consumed.
#[derive(Clone)]
pub enum Weight {
    /// A fixed multiplier in `(0, 1]`.
    Constant(f64),
    /// A multiplier evaluated at the elapsed time, in base hours.
    Varying(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl Weight {
    /// The unit weight (constant 1).
    pub fn one() -> Self {
        Weight::Constant(1.0)
    }

    /// Creates a constant weight after validating it lies in `(0, 1]`.
    pub fn constant(w: f64) -> Result<Self, DistError> {
        if !w.is_finite() || w <= 0.0 || w > 1.0 {
            return Err(DistError::InvalidProbability {
                value: w,
                requirement: "weight must be in (0, 1]",
            });
        }
        Ok(Weight::Constant(w))
    }

    /// Creates a time-varying weight from a function of elapsed time (hours).
    pub fn varying(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Weight::Varying(Arc::new(f))
    }

    /// Evaluates the weight at elapsed time `t` (base hours).
    pub fn at(&self, t: f64) -> f64 {
        match self {
            Weight::Constant(w) => *w,
            Weight::Varying(f) => f(t),
        }
    }

    /// True if this is the constant unit weight.
    pub fn is_one(&self) -> bool {
        matches!(self, Weight::Constant(w) if *w == 1.0)
    }
}

impl fmt::Debug for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Constant(w) => write!(f, "Weight::Constant({w})"),
            Weight::Varying(_) => f.write_str("Weight::Varying(..)"),
        }
    }
}
