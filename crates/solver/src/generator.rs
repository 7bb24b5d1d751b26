//! Infinitesimal generator matrix of a Markov-compatible diagram.

use ndarray::Array2;
use talos_diagram::StateDiagram;

use crate::error::SolverError;

/// Builds the generator `Q` from transition rates.
///
/// Off-diagonal `Q[i][j]` is the summed rate of all transitions i→j (parallel
/// records are competing causes and add up); the diagonal is the negated row
/// sum. Transitions leaving a trapping state are ignored: an absorbing state
/// keeps a zero row.
///
/// # Errors
///
/// Returns [`SolverError::NotMarkovian`] naming the first transition whose
/// holding time has no constant rate.
pub(crate) fn generator_matrix(diagram: &StateDiagram) -> Result<Array2<f64>, SolverError> {
    let n = diagram.n_states();
    let mut q = Array2::zeros((n, n));
    for (idx, t) in diagram.transitions().iter().enumerate() {
        if diagram.states()[t.from()].is_trapping() {
            continue;
        }
        let rate = t
            .holding()
            .rate()
            .ok_or(SolverError::NotMarkovian { transition: idx })?;
        q[[t.from(), t.to()]] += rate;
        q[[t.from(), t.from()]] -= rate;
    }
    Ok(q)
}

/// Per-transition rates aligned to the diagram's transition arena, with
/// trapping-state exits zeroed. Used to recover frequency densities.
pub(crate) fn transition_rates(diagram: &StateDiagram) -> Result<Vec<f64>, SolverError> {
    diagram
        .transitions()
        .iter()
        .enumerate()
        .map(|(idx, t)| {
            if diagram.states()[t.from()].is_trapping() {
                return Ok(0.0);
            }
            t.holding()
                .rate()
                .ok_or(SolverError::NotMarkovian { transition: idx })
        })
        .collect()
}
