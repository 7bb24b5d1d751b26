//! Universal generating functions over solved state-transition diagrams.
//!
//! A solved diagram collapses into its performance law: a u-function mapping
//! each distinct performance value to a probability mass (or mass trajectory).
//! Laws compose algebraically — series picks the weaker element, parallel adds
//! capacities — which is how the network layer folds whole topologies into a
//! single delivered-performance distribution per user.
//!
//! # Quick start
//!
//! ```rust
//! use talos_diagram::StateDiagram;
//! use talos_ugf::Ugf;
//! use talos_units::{Quantity, Unit};
//!
//! // A 10 MW unit available 90% of the time, as a pre-solved law.
//! let unit = StateDiagram::from_solution(
//!     vec![
//!         Quantity::new(10.0, Unit::MegaWatt),
//!         Quantity::new(0.0, Unit::MegaWatt),
//!     ],
//!     Vec::new(),
//!     vec![vec![0.9], vec![0.1]],
//! )
//! .unwrap();
//!
//! let u = Ugf::from_diagram(&unit).unwrap();
//! let pair = u.parallel(&u.clone()).unwrap();
//! assert_eq!(pair.values(), &[0.0, 10_000.0, 20_000.0]);
//! ```

mod error;
mod polynomial;

pub use error::UgfError;
pub use polynomial::Ugf;
