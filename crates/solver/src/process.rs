//! Solve-mode selection and the single solve entry point.

use talos_diagram::StateDiagram;
use tracing::info;

use crate::config::SolveConfig;
use crate::error::SolverError;

/// The stochastic process assumed when solving a diagram.
///
/// All three write the same solved fields, so downstream consumers (UGF
/// extraction, the network solver) never care which one ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Process {
    /// Long-run stationary occupancy only; ignores the time grid.
    SteadyState,
    /// Memoryless dynamics via forward Kolmogorov integration.
    Markov,
    /// General holding times via the Markov renewal equations.
    SemiMarkov,
}

/// Solves `diagram` in place under the selected process.
///
/// # Errors
///
/// Propagates construction errors ([`talos_diagram::DiagramError`]), Markov
/// solvers meeting non-exponential transitions
/// ([`SolverError::NotMarkovian`]), and singular steady-state structure that
/// the communicating-class decomposition cannot recover
/// ([`SolverError::Singular`]).
#[tracing::instrument(skip(diagram, config), fields(states = diagram.n_states()))]
pub fn solve(
    diagram: &mut StateDiagram,
    process: Process,
    config: &SolveConfig,
) -> Result<(), SolverError> {
    match process {
        Process::SteadyState => crate::steady_state::solve_steady(diagram, config)?,
        Process::Markov => crate::markov::solve_markov(diagram, config)?,
        Process::SemiMarkov => crate::semi_markov::solve_semi_markov(diagram, config)?,
    }
    info!(?process, transitions = diagram.n_transitions(), "diagram solved");
    Ok(())
}
