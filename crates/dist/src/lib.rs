//! Holding-time distributions for multi-state system models.
//!
//! A component's transitions hold closed-form lifetime laws (exponential,
//! Weibull, log-normal, Dirac), each with an optional weight multiplier that
//! splits exit mass between competing causes. Every law exposes the same
//! operation table — pdf / cdf / ccdf / quantile / sojourn — selected by an
//! exhaustive match over [`Kind`], with unit checks at every query boundary.
//!
//! # Quick start
//!
//! ```rust
//! use talos_dist::Distribution;
//! use talos_units::{Quantity, Unit};
//!
//! // Repair completes at rate 10/yr.
//! let repair = Distribution::exponential_rate(10.0, Unit::Year).unwrap();
//! let half_year = Quantity::new(0.5, Unit::Year);
//! let now = Quantity::new(0.0, Unit::Hour);
//!
//! let done = repair.cdf(half_year, now).unwrap();
//! assert!(done > 0.99);
//! ```

mod error;
mod model;
mod weight;

pub use error::DistError;
pub use model::{Distribution, Kind};
pub use weight::Weight;
