//! States of a component's transition diagram.

use talos_units::Quantity;

/// A single operating condition of a component.
///
/// Performance is a signed quantity with a physical unit and may be infinite
/// (an unconstrained source). Initial probability is the occupancy at the
/// start of the solve horizon; the diagram enforces that these sum to 1.
#[derive(Debug, Clone)]
pub struct State {
    name: Option<String>,
    performance: Quantity,
    init_prob: f64,
    trapping: bool,
}

impl State {
    /// Creates a state with the given performance level and initial probability.
    pub fn new(performance: Quantity, init_prob: f64) -> Self {
        Self {
            name: None,
            performance,
            init_prob,
            trapping: false,
        }
    }

    /// Sets a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks this state as trapping (absorbing): once entered it is never
    /// left within the solve horizon.
    pub fn trapping(mut self) -> Self {
        self.trapping = true;
        self
    }

    /// Display name, if one was set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Performance level delivered while in this state.
    pub fn performance(&self) -> Quantity {
        self.performance
    }

    /// Occupancy probability at the start of the horizon.
    pub fn init_prob(&self) -> f64 {
        self.init_prob
    }

    /// True if this state is absorbing.
    pub fn is_trapping(&self) -> bool {
        self.trapping
    }
}
