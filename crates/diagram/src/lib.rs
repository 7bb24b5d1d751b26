//! State-transition diagrams (STDs) for multi-state system components.
//!
//! A diagram owns an ordered set of states and a multigraph of transitions,
//! and — once a process solver has run — the occupancy probability and
//! transition frequency-density trajectories over a shared time grid.
//!
//! # Pipeline
//!
//! ```text
//!  ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//!  │   diagram     │────▶│  talos-solver  │────▶│    talos-ugf      │
//!  │ (build STD)   │     │ (trajectories) │     │ (extract, compose)│
//!  └──────────────┘     └────────────────┘     └──────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use talos_diagram::{State, StateDiagram, Transition, TransitionKind};
//! use talos_units::{Quantity, Unit};
//!
//! let mut std = StateDiagram::new();
//! std.add_states([
//!     State::new(Quantity::new(1.0, Unit::MegaWatt), 1.0).with_name("available"),
//!     State::new(Quantity::new(0.0, Unit::MegaWatt), 0.0).with_name("unavailable"),
//! ])
//! .unwrap();
//! std.add_transitions([
//!     Transition::rate(0, 1, 1.0, Unit::Year).unwrap().kind(TransitionKind::Failure),
//!     Transition::rate(1, 0, 10.0, Unit::Year).unwrap().kind(TransitionKind::Repair),
//! ])
//! .unwrap();
//! assert!(std.validate().is_ok());
//! ```

mod diagram;
mod error;
mod state;
mod transition;

pub use diagram::{Solution, StateDiagram};
pub use error::{DiagramError, PROB_TOL};
pub use state::State;
pub use transition::{HoldingTime, Transition, TransitionKind};
