//! Transitions of a component's diagram: directed multigraph edges with
//! holding-time laws.

use talos_dist::{DistError, Distribution};
use talos_units::{Dimension, Quantity, Unit};

use crate::error::DiagramError;

/// Bookkeeping tag grouping transitions by cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionKind {
    /// Loss of function.
    Failure,
    /// Restoration of function.
    Repair,
    /// Planned outage or inspection.
    Maintenance,
    /// Anything else.
    #[default]
    Other,
}

/// How long the process holds before taking a transition.
///
/// Either a bare constant rate (the Markov-only shortcut) or a general
/// lifetime distribution. The two cases are mutually exclusive by
/// construction; a bare rate is lowered to an implicit exponential before any
/// semi-Markov computation.
#[derive(Debug, Clone)]
pub enum HoldingTime {
    /// Constant rate, per base hour.
    Rate(f64),
    /// General lifetime distribution.
    Distr(Distribution),
}

impl HoldingTime {
    /// The constant Markov rate per hour, where one exists.
    ///
    /// A distribution yields a rate only if it is a plain exponential.
    pub fn rate(&self) -> Option<f64> {
        match self {
            HoldingTime::Rate(r) => Some(*r),
            HoldingTime::Distr(d) => d.markov_rate(),
        }
    }

    /// Lowers this holding time to a distribution, turning a bare rate into
    /// an exponential with that rate.
    pub fn as_distribution(&self) -> Result<Distribution, DistError> {
        match self {
            HoldingTime::Rate(r) => Distribution::exponential_rate(*r, Unit::Hour),
            HoldingTime::Distr(d) => Ok(d.clone()),
        }
    }
}

/// A directed edge between two state indices.
///
/// Parallel transitions between the same ordered pair are allowed and
/// meaningful: they model competing causes of leaving a state.
#[derive(Debug, Clone)]
pub struct Transition {
    from: usize,
    to: usize,
    kind: TransitionKind,
    holding: HoldingTime,
}

impl Transition {
    /// Transition with a constant rate expressed per the given time unit,
    /// e.g. `Transition::rate(0, 1, 10.0, Unit::Year)` for 10 events/yr.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Unit`] if `per` is not a time unit and
    /// [`DiagramError::InvalidRate`] unless the rate is finite and positive.
    pub fn rate(from: usize, to: usize, rate: f64, per: Unit) -> Result<Self, DiagramError> {
        Quantity::new(1.0, per).expect_dimension(Dimension::Time)?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(DiagramError::InvalidRate { value: rate });
        }
        Ok(Self {
            from,
            to,
            kind: TransitionKind::default(),
            holding: HoldingTime::Rate(rate / per.base_factor()),
        })
    }

    /// Transition with a general holding-time distribution.
    pub fn with_distribution(from: usize, to: usize, distr: Distribution) -> Self {
        Self {
            from,
            to,
            kind: TransitionKind::default(),
            holding: HoldingTime::Distr(distr),
        }
    }

    /// Sets the bookkeeping kind.
    pub fn kind(mut self, kind: TransitionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Source state index.
    pub fn from(&self) -> usize {
        self.from
    }

    /// Target state index.
    pub fn to(&self) -> usize {
        self.to
    }

    /// Bookkeeping tag.
    pub fn transition_kind(&self) -> TransitionKind {
        self.kind
    }

    /// The holding-time law.
    pub fn holding(&self) -> &HoldingTime {
        &self.holding
    }
}
