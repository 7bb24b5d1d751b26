//! Long-run stationary occupancy: solves `πQ = 0, Σπ = 1`.

use ndarray::{Array1, Array2};
use talos_diagram::{Solution, StateDiagram};
use tracing::debug;

use crate::config::SolveConfig;
use crate::error::SolverError;
use crate::generator::{generator_matrix, transition_rates};

/// Relative pivot floor for the balance-equation solves.
const PIVOT_TOL: f64 = 1e-12;

/// Solves the stationary distribution and writes a single-slice solution with
/// an empty time grid.
///
/// A uniquely ergodic chain is solved directly. When the balance system is
/// singular (several closed communicating classes, or absorbing structure)
/// the chain is decomposed: each closed class is solved independently and the
/// class distributions are weighted by their limiting occupation shares,
/// which combine initial mass inside the class with absorption probabilities
/// from the transient states.
pub(crate) fn solve_steady(
    diagram: &mut StateDiagram,
    config: &SolveConfig,
) -> Result<(), SolverError> {
    config.validate()?;
    diagram.validate()?;
    let q = generator_matrix(diagram)?;

    let pi = match stationary_unique(&q) {
        Ok(pi) => pi,
        Err(SolverError::Singular { reason }) => {
            debug!(%reason, "balance system singular, decomposing into classes");
            stationary_by_classes(diagram, &q)?
        }
        Err(e) => return Err(e),
    };

    let rates = transition_rates(diagram)?;
    let freq = diagram
        .transitions()
        .iter()
        .zip(&rates)
        .map(|(t, &rate)| vec![pi[t.from()] * rate])
        .collect();
    let state_probs = pi.iter().map(|&p| vec![p]).collect();
    diagram.set_solution(Solution::new(Vec::new(), state_probs, freq))?;
    Ok(())
}

/// Solves `Qᵀ π = 0` with the last balance row replaced by `Σπ = 1`.
fn stationary_unique(q: &Array2<f64>) -> Result<Array1<f64>, SolverError> {
    let n = q.nrows();
    let mut a = q.t().to_owned();
    for col in 0..n {
        a[[n - 1, col]] = 1.0;
    }
    let mut b = Array1::zeros(n);
    b[n - 1] = 1.0;
    let pi = crate::linalg::solve_dense(a, b, PIVOT_TOL)?;
    Ok(normalise(pi))
}

/// Clamps tiny negative round-off and rescales to unit mass.
fn normalise(mut pi: Array1<f64>) -> Array1<f64> {
    pi.mapv_inplace(|p| p.max(0.0));
    let sum: f64 = pi.sum();
    if sum > 0.0 {
        pi.mapv_inplace(|p| p / sum);
    }
    pi
}

/// Stationary distribution of a reducible chain via communicating classes.
fn stationary_by_classes(
    diagram: &StateDiagram,
    q: &Array2<f64>,
) -> Result<Array1<f64>, SolverError> {
    let n = q.nrows();
    let adj: Vec<Vec<usize>> = (0..n)
        .map(|i| (0..n).filter(|&j| j != i && q[[i, j]] > 0.0).collect())
        .collect();

    let comp = strongly_connected_components(n, &adj);
    let n_comp = comp.iter().copied().max().map_or(0, |m| m + 1);

    // A class is closed when no member has an edge leaving it.
    let mut closed = vec![true; n_comp];
    for i in 0..n {
        for &j in &adj[i] {
            if comp[j] != comp[i] {
                closed[comp[i]] = false;
            }
        }
    }
    let closed_classes: Vec<Vec<usize>> = (0..n_comp)
        .filter(|&c| closed[c])
        .map(|c| (0..n).filter(|&i| comp[i] == c).collect())
        .collect();
    if closed_classes.is_empty() {
        return Err(SolverError::Singular {
            reason: "no closed communicating class".to_string(),
        });
    }
    let transient: Vec<usize> = (0..n).filter(|&i| !closed[comp[i]]).collect();
    debug!(
        n_closed = closed_classes.len(),
        n_transient = transient.len(),
        "solving communicating classes"
    );

    let init = diagram.init_probs();
    let mut pi = Array1::zeros(n);

    // Absorption probabilities from the transient block, one RHS per class:
    // Q_TT · x_c = -(rates from T into class c).
    let nt = transient.len();
    let q_tt = Array2::from_shape_fn((nt, nt), |(a, b)| q[[transient[a], transient[b]]]);
    for members in &closed_classes {
        let mut share: f64 = members.iter().map(|&i| init[i]).sum();
        if nt > 0 {
            let rhs = Array1::from_shape_fn(nt, |a| {
                -members.iter().map(|&j| q[[transient[a], j]]).sum::<f64>()
            });
            let absorb = crate::linalg::solve_dense(q_tt.clone(), rhs, PIVOT_TOL)?;
            for (a, &i) in transient.iter().enumerate() {
                share += init[i] * absorb[a].clamp(0.0, 1.0);
            }
        }

        // Stationary distribution inside the class.
        let m = members.len();
        let local = if m == 1 {
            Array1::ones(1)
        } else {
            let sub = Array2::from_shape_fn((m, m), |(a, b)| q[[members[a], members[b]]]);
            stationary_unique(&sub)?
        };
        for (a, &i) in members.iter().enumerate() {
            pi[i] = share * local[a];
        }
    }

    Ok(normalise(pi))
}

/// Kosaraju's algorithm: returns a component id per node.
fn strongly_connected_components(n: usize, adj: &[Vec<usize>]) -> Vec<usize> {
    // Pass 1: finish order via iterative DFS.
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for root in 0..n {
        if visited[root] {
            continue;
        }
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        visited[root] = true;
        while let Some(top) = stack.len().checked_sub(1) {
            let (v, next) = stack[top];
            if next < adj[v].len() {
                stack[top].1 += 1;
                let w = adj[v][next];
                if !visited[w] {
                    visited[w] = true;
                    stack.push((w, 0));
                }
            } else {
                order.push(v);
                stack.pop();
            }
        }
    }

    // Pass 2: label components on the transposed graph in reverse finish order.
    let mut radj = vec![Vec::new(); n];
    for (i, row) in adj.iter().enumerate() {
        for &j in row {
            radj[j].push(i);
        }
    }
    let mut comp = vec![usize::MAX; n];
    let mut n_comp = 0;
    for &root in order.iter().rev() {
        if comp[root] != usize::MAX {
            continue;
        }
        let mut stack = vec![root];
        comp[root] = n_comp;
        while let Some(v) = stack.pop() {
            for &w in &radj[v] {
                if comp[w] == usize::MAX {
                    comp[w] = n_comp;
                    stack.push(w);
                }
            }
        }
        n_comp += 1;
    }
    comp
}
