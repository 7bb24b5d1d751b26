//! Network composition of component performance laws.
//!
//! Components solved in isolation collapse into u-functions; this crate wires
//! those laws into a flow topology — sources inject, edge components limit,
//! users receive — and computes every user's delivered-performance law with a
//! fixed-point sweep over the node arena.
//!
//! # Quick start
//!
//! ```rust
//! use talos_diagram::StateDiagram;
//! use talos_network::{Network, NetworkConfig};
//! use talos_units::Quantity;
//!
//! // A 90%-available source behind a perfect line.
//! let source = StateDiagram::from_solution(
//!     vec![Quantity::dimensionless(1.0), Quantity::dimensionless(0.0)],
//!     Vec::new(),
//!     vec![vec![0.9], vec![0.1]],
//! )
//! .unwrap();
//! let line = StateDiagram::from_solution(
//!     vec![Quantity::dimensionless(1.0)],
//!     Vec::new(),
//!     vec![vec![1.0]],
//! )
//! .unwrap();
//!
//! let mut net = Network::new();
//! net.add_source(0, Some("feed"), &source).unwrap();
//! net.add_component(0, 1, Some("line"), &line).unwrap();
//! net.add_user(1, Some("plant"), None);
//! net.solve(&NetworkConfig::new()).unwrap();
//!
//! let law = net.user_ugf(1).unwrap();
//! assert!((law.prob(1).unwrap()[0] - 0.9).abs() < 1e-9);
//! ```

mod config;
mod error;
mod network;

pub use config::NetworkConfig;
pub use error::NetworkError;
pub use network::Network;
