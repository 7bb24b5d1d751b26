//! The closed set of holding-time laws and their operation table.

use statrs::distribution::{Continuous, ContinuousCDF, Exp, LogNormal, Weibull};
use talos_units::{Dimension, Quantity, Unit};

use crate::error::DistError;
use crate::weight::Weight;

/// Parameter payload of a distribution, normalised to base hours.
///
/// A closed tagged set: adding a law means adding a variant and extending the
/// exhaustive matches below, which the compiler enforces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kind {
    /// Exponential with rate per hour.
    Exponential {
        /// Rate λ, per hour.
        rate: f64,
    },
    /// Weibull with scale in hours and dimensionless shape.
    Weibull {
        /// Scale η, hours.
        scale: f64,
        /// Shape β.
        shape: f64,
    },
    /// Log-normal over hours, parameterised in log space.
    LogNormal {
        /// Location μ = ln(median hours).
        location: f64,
        /// Log-space standard deviation σ.
        scale: f64,
    },
    /// Unit mass at a fixed holding time.
    Dirac {
        /// The point mass location, hours.
        point: f64,
    },
}

/// A validated holding-time distribution with a weight multiplier.
///
/// Parameters are stored in base hours; the unit supplied at construction is
/// remembered so quantiles come back in the caller's own time scale. All
/// query arguments are checked for dimensional compatibility
/// ([`DistError::Unit`]) before any arithmetic.
#[derive(Debug, Clone)]
pub struct Distribution {
    kind: Kind,
    weight: Weight,
    unit: Unit,
}

fn require_positive(name: &'static str, value: f64) -> Result<(), DistError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DistError::InvalidParameter {
            name,
            value,
            requirement: "must be finite and > 0",
        });
    }
    Ok(())
}

fn require_time(q: &Quantity) -> Result<(), DistError> {
    q.expect_dimension(Dimension::Time).map_err(DistError::from)
}

impl Distribution {
    /// Exponential law from a mean holding time (scale = 1/λ).
    pub fn exponential(scale: Quantity) -> Result<Self, DistError> {
        require_time(&scale)?;
        require_positive("scale", scale.to_base())?;
        Ok(Self {
            kind: Kind::Exponential {
                rate: 1.0 / scale.to_base(),
            },
            weight: Weight::one(),
            unit: scale.unit(),
        })
    }

    /// Exponential law from a bare rate, the Markov-only shortcut.
    ///
    /// `rate` is the number of events per one `per` unit of time, e.g.
    /// `exponential_rate(10.0, Unit::Year)` for μ = 10/yr. The rate is
    /// lowered to an exponential distribution immediately, so semi-Markov
    /// computations never see a bare rate.
    pub fn exponential_rate(rate: f64, per: Unit) -> Result<Self, DistError> {
        Quantity::new(1.0, per)
            .expect_dimension(Dimension::Time)
            .map_err(DistError::from)?;
        require_positive("rate", rate)?;
        let rate_per_hour = rate / per.base_factor();
        Ok(Self {
            kind: Kind::Exponential { rate: rate_per_hour },
            weight: Weight::one(),
            unit: per,
        })
    }

    /// Weibull law from a time scale and a dimensionless shape.
    pub fn weibull(scale: Quantity, shape: f64) -> Result<Self, DistError> {
        require_time(&scale)?;
        require_positive("scale", scale.to_base())?;
        require_positive("shape", shape)?;
        Ok(Self {
            kind: Kind::Weibull {
                scale: scale.to_base(),
                shape,
            },
            weight: Weight::one(),
            unit: scale.unit(),
        })
    }

    /// Log-normal law from its median holding time and log-space σ.
    pub fn lognormal(median: Quantity, sigma: f64) -> Result<Self, DistError> {
        require_time(&median)?;
        require_positive("median", median.to_base())?;
        require_positive("sigma", sigma)?;
        Ok(Self {
            kind: Kind::LogNormal {
                location: median.to_base().ln(),
                scale: sigma,
            },
            weight: Weight::one(),
            unit: median.unit(),
        })
    }

    /// Dirac law: all mass at one fixed holding time (may be zero).
    pub fn dirac(point: Quantity) -> Result<Self, DistError> {
        require_time(&point)?;
        let p = point.to_base();
        if !p.is_finite() || p < 0.0 {
            return Err(DistError::InvalidParameter {
                name: "point",
                value: p,
                requirement: "must be finite and >= 0",
            });
        }
        Ok(Self {
            kind: Kind::Dirac { point: p },
            weight: Weight::one(),
            unit: point.unit(),
        })
    }

    /// Attaches a weight multiplier, replacing the current one.
    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }

    /// The parameter payload (base-hour values).
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The attached weight.
    pub fn weight(&self) -> &Weight {
        &self.weight
    }

    /// The time unit this distribution was declared in.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// The exponential rate per hour, if this law is Markov-compatible.
    ///
    /// Only an exponential with the unit weight has a well-defined constant
    /// transition rate; anything else returns `None`.
    pub fn markov_rate(&self) -> Option<f64> {
        match self.kind {
            Kind::Exponential { rate } if self.weight.is_one() => Some(rate),
            _ => None,
        }
    }

    // --- Base-hour operation table (no unit checks; solver hot loops) ---

    /// Unweighted pdf at `x` hours. Zero for negative `x`.
    pub fn pdf_base(&self, x: f64) -> f64 {
        if x < 0.0 || !x.is_finite() {
            return 0.0;
        }
        match self.kind {
            Kind::Exponential { rate } => rate * (-rate * x).exp(),
            Kind::Weibull { scale, shape } => match Weibull::new(shape, scale) {
                Ok(d) => d.pdf(x),
                Err(_) => 0.0,
            },
            Kind::LogNormal { location, scale } => match LogNormal::new(location, scale) {
                Ok(d) => d.pdf(x),
                Err(_) => 0.0,
            },
            // The delta density has no pointwise value; mass is carried by the cdf.
            Kind::Dirac { .. } => 0.0,
        }
    }

    /// Unweighted cdf at `x` hours. Zero for negative `x`.
    pub fn cdf_base(&self, x: f64) -> f64 {
        if x < 0.0 {
            return 0.0;
        }
        match self.kind {
            Kind::Exponential { rate } => 1.0 - (-rate * x).exp(),
            Kind::Weibull { scale, shape } => match Weibull::new(shape, scale) {
                Ok(d) => d.cdf(x),
                Err(_) => 0.0,
            },
            Kind::LogNormal { location, scale } => match LogNormal::new(location, scale) {
                Ok(d) => d.cdf(x),
                Err(_) => 0.0,
            },
            Kind::Dirac { point } => {
                if x >= point {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Weighted pdf at `x` hours, weight evaluated at elapsed time `t` hours.
    pub fn pdf_weighted_base(&self, x: f64, t: f64) -> f64 {
        self.weight.at(t) * self.pdf_base(x)
    }

    /// Weighted cdf at `x` hours, weight evaluated at elapsed time `t` hours.
    pub fn cdf_weighted_base(&self, x: f64, t: f64) -> f64 {
        self.weight.at(t) * self.cdf_base(x)
    }

    /// Weighted ccdf at `x` hours, so that `cdf + ccdf = weight(t)`.
    pub fn ccdf_weighted_base(&self, x: f64, t: f64) -> f64 {
        let w = self.weight.at(t);
        w - self.cdf_weighted_base(x, t)
    }

    // --- Unit-checked operations ---

    /// Probability density at `x`, scaled by the weight at `elapsed`.
    ///
    /// # Errors
    ///
    /// Returns [`DistError::Unit`] if `x` or `elapsed` is not a time quantity.
    pub fn pdf(&self, x: Quantity, elapsed: Quantity) -> Result<f64, DistError> {
        require_time(&x)?;
        require_time(&elapsed)?;
        Ok(self.pdf_weighted_base(x.to_base(), elapsed.to_base()))
    }

    /// Cumulative probability at `x`, scaled by the weight at `elapsed`.
    ///
    /// Satisfies `cdf(0) = 0` and `cdf + ccdf = weight(elapsed)`.
    pub fn cdf(&self, x: Quantity, elapsed: Quantity) -> Result<f64, DistError> {
        require_time(&x)?;
        require_time(&elapsed)?;
        Ok(self.cdf_weighted_base(x.to_base(), elapsed.to_base()))
    }

    /// Complementary cumulative probability at `x`.
    pub fn ccdf(&self, x: Quantity, elapsed: Quantity) -> Result<f64, DistError> {
        require_time(&x)?;
        require_time(&elapsed)?;
        Ok(self.ccdf_weighted_base(x.to_base(), elapsed.to_base()))
    }

    /// Quantile of the unweighted conditional law, in the declared unit.
    ///
    /// The weight scales masses, not the quantile axis, so `quantile` inverts
    /// the base cdf. `p` must lie in `[0, 1)`.
    pub fn quantile(&self, p: f64) -> Result<Quantity, DistError> {
        if !p.is_finite() || !(0.0..1.0).contains(&p) {
            return Err(DistError::InvalidProbability {
                value: p,
                requirement: "quantile probability must be in [0, 1)",
            });
        }
        let hours = match self.kind {
            Kind::Exponential { rate } => -(1.0 - p).ln() / rate,
            Kind::Weibull { scale, shape } => Weibull::new(shape, scale)
                .map_err(|e| DistError::Construction {
                    message: e.to_string(),
                })?
                .inverse_cdf(p),
            Kind::LogNormal { location, scale } => LogNormal::new(location, scale)
                .map_err(|e| DistError::Construction {
                    message: e.to_string(),
                })?
                .inverse_cdf(p),
            Kind::Dirac { point } => {
                if p > 0.0 {
                    point
                } else {
                    0.0
                }
            }
        };
        let value = Quantity::new(hours, Unit::Hour)
            .in_unit(self.unit)
            .map_err(DistError::from)?;
        Ok(Quantity::new(value, self.unit))
    }

    /// Complementary quantile: the time by which all but `p` of the mass has gone.
    pub fn cquantile(&self, p: f64) -> Result<Quantity, DistError> {
        if !p.is_finite() || p <= 0.0 || p > 1.0 {
            return Err(DistError::InvalidProbability {
                value: p,
                requirement: "complementary quantile probability must be in (0, 1]",
            });
        }
        self.quantile(1.0 - p)
    }

    /// Uniform sample grid from 0 to where the weighted ccdf drops below `tol`.
    ///
    /// Returns base-hour sample points `0, Δ, 2Δ, …` up to and including the
    /// first point at which `ccdf(x, 0) < tol`. The weight is evaluated at
    /// elapsed time 0.
    ///
    /// # Errors
    ///
    /// Rejects non-time or non-positive `step` and `tol` outside `(0, 1)`.
    pub fn sojourn(&self, step: Quantity, tol: f64) -> Result<Vec<f64>, DistError> {
        require_time(&step)?;
        let dt = step.to_base();
        require_positive("step", dt)?;
        if !tol.is_finite() || tol <= 0.0 || tol >= 1.0 {
            return Err(DistError::InvalidProbability {
                value: tol,
                requirement: "sojourn tolerance must be in (0, 1)",
            });
        }

        // Residual survival below tol/w(0) bounds the horizon; a weight at
        // or below tol means the mass never reaches the threshold from above.
        let w0 = self.weight.at(0.0);
        let target = (tol / w0).min(1.0);
        let horizon = if target >= 1.0 {
            0.0
        } else {
            self.cquantile(target)?.to_base().max(0.0)
        };

        let n = (horizon / dt).ceil() as usize;
        let mut points = Vec::with_capacity(n + 2);
        for k in 0..=n {
            points.push(k as f64 * dt);
        }
        // One step past the crossing so the final ccdf sample is below tol.
        if self.ccdf_weighted_base(*points.last().unwrap_or(&0.0), 0.0) >= tol {
            points.push((n + 1) as f64 * dt);
        }
        Ok(points)
    }
}
