//! Stochastic process solvers for state-transition diagrams.
//!
//! Three interchangeable algorithms populate a diagram's solved fields:
//!
//! ```text
//!  ┌───────────────┐    ┌──────────────┐    ┌────────────────┐
//!  │  SteadyState   │    │    Markov    │    │   SemiMarkov    │
//!  │  πQ = 0, Σπ=1  │    │  dp/dt = Qᵀp │    │ renewal (Volterra)│
//!  └───────────────┘    └──────────────┘    └────────────────┘
//!          └────────────────────┴────────────────────┘
//!                     same Solution fields
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use talos_diagram::{State, StateDiagram, Transition};
//! use talos_solver::{solve, Process, SolveConfig};
//! use talos_units::{Quantity, Unit};
//!
//! let mut std = StateDiagram::new();
//! std.add_states([
//!     State::new(Quantity::new(1.0, Unit::MegaWatt), 1.0),
//!     State::new(Quantity::new(0.0, Unit::MegaWatt), 0.0),
//! ])
//! .unwrap();
//! std.add_transitions([
//!     Transition::rate(0, 1, 1.0, Unit::Year).unwrap(),
//!     Transition::rate(1, 0, 10.0, Unit::Year).unwrap(),
//! ])
//! .unwrap();
//!
//! solve(&mut std, Process::SteadyState, &SolveConfig::new()).unwrap();
//! let sol = std.solution().unwrap();
//! assert!((sol.state_prob(0).unwrap()[0] - 10.0 / 11.0).abs() < 1e-9);
//! ```

mod config;
mod error;
mod generator;
mod linalg;
mod markov;
mod process;
mod semi_markov;
mod steady_state;

pub use config::SolveConfig;
pub use error::SolverError;
pub use process::{solve, Process};
