//! Time-dependent occupancy by forward Kolmogorov integration.
//!
//! Integrates `dp/dt = Qᵀ p` with an embedded Dormand–Prince 5(4) pair and
//! per-step error control, recording the state distribution at the uniform
//! output grid. Transition frequency densities follow directly as
//! `h_e(t) = p_src(e)(t) · rate_e`.

use ndarray::{Array1, Array2};
use talos_diagram::{Solution, StateDiagram};
use tracing::debug;

use crate::config::SolveConfig;
use crate::error::SolverError;
use crate::generator::{generator_matrix, transition_rates};

/// Smallest step, as a fraction of the output step, before giving up.
const MIN_STEP_FRACTION: f64 = 1e-12;

pub(crate) fn solve_markov(
    diagram: &mut StateDiagram,
    config: &SolveConfig,
) -> Result<(), SolverError> {
    config.validate()?;
    diagram.validate()?;
    let q = generator_matrix(diagram)?;
    let qt = q.t().to_owned();
    let rates = transition_rates(diagram)?;

    let grid = config.grid();
    let n = diagram.n_states();
    let mut p = Array1::from_vec(diagram.init_probs());
    let mut probs: Vec<Vec<f64>> = vec![Vec::with_capacity(grid.len()); n];
    let record = |p: &Array1<f64>, probs: &mut Vec<Vec<f64>>| {
        for (i, row) in probs.iter_mut().enumerate() {
            row.push(p[i].clamp(0.0, 1.0));
        }
    };

    record(&p, &mut probs);
    for window in grid.windows(2) {
        p = integrate_interval(&qt, p, window[0], window[1], config)?;
        record(&p, &mut probs);
    }
    debug!(points = grid.len(), states = n, "markov integration complete");

    let freq = diagram
        .transitions()
        .iter()
        .zip(&rates)
        .map(|(t, &rate)| probs[t.from()].iter().map(|&p| p * rate).collect())
        .collect();
    diagram.set_solution(Solution::new(grid, probs, freq))?;
    Ok(())
}

/// Advances `p` from `t0` to `t1` with adaptive internal steps.
fn integrate_interval(
    qt: &Array2<f64>,
    mut p: Array1<f64>,
    t0: f64,
    t1: f64,
    config: &SolveConfig,
) -> Result<Array1<f64>, SolverError> {
    let tol = config.tolerance();
    let min_step = config.step_hours() * MIN_STEP_FRACTION;
    let mut t = t0;
    let mut h = (t1 - t0).min(config.step_hours());

    while t < t1 {
        // A remaining span below min_step is rounding residue from grid
        // points that are not exactly representable; we have arrived.
        if t1 - t < min_step {
            break;
        }
        h = h.min(t1 - t);
        if h < min_step {
            return Err(SolverError::StepUnderflow { t, step: h });
        }
        let (next, err) = dormand_prince_step(qt, &p, h);
        // Error relative to tol, with a mixed absolute/relative scale.
        let scale = tol + tol * p.iter().fold(0.0f64, |m, &v| m.max(v.abs()));
        let ratio = err / scale;
        if ratio <= 1.0 {
            t += h;
            p = next;
        }
        let factor = if ratio > 0.0 {
            0.9 * ratio.powf(-0.2)
        } else {
            5.0
        };
        h *= factor.clamp(0.2, 5.0);
    }
    Ok(p)
}

/// One embedded Dormand–Prince 5(4) step: returns the 5th-order solution and
/// the max-norm of the embedded error estimate.
fn dormand_prince_step(qt: &Array2<f64>, p: &Array1<f64>, h: f64) -> (Array1<f64>, f64) {
    let f = |y: &Array1<f64>| qt.dot(y);

    let k1 = f(p);
    let k2 = f(&(p + &(&k1 * (h / 5.0))));
    let k3 = f(&(p + &(&k1 * (3.0 * h / 40.0)) + &(&k2 * (9.0 * h / 40.0))));
    let k4 = f(&(p
        + &(&k1 * (44.0 * h / 45.0))
        + &(&k2 * (-56.0 * h / 15.0))
        + &(&k3 * (32.0 * h / 9.0))));
    let k5 = f(&(p
        + &(&k1 * (19372.0 * h / 6561.0))
        + &(&k2 * (-25360.0 * h / 2187.0))
        + &(&k3 * (64448.0 * h / 6561.0))
        + &(&k4 * (-212.0 * h / 729.0))));
    let k6 = f(&(p
        + &(&k1 * (9017.0 * h / 3168.0))
        + &(&k2 * (-355.0 * h / 33.0))
        + &(&k3 * (46732.0 * h / 5247.0))
        + &(&k4 * (49.0 * h / 176.0))
        + &(&k5 * (-5103.0 * h / 18656.0))));

    // 5th-order solution (b row; the b2 weight is zero).
    let y5 = p
        + &(&k1 * (35.0 * h / 384.0))
        + &(&k3 * (500.0 * h / 1113.0))
        + &(&k4 * (125.0 * h / 192.0))
        + &(&k5 * (-2187.0 * h / 6784.0))
        + &(&k6 * (11.0 * h / 84.0));
    let k7 = f(&y5);

    // Embedded 4th-order weights.
    let y4 = p
        + &(&k1 * (5179.0 * h / 57600.0))
        + &(&k3 * (7571.0 * h / 16695.0))
        + &(&k4 * (393.0 * h / 640.0))
        + &(&k5 * (-92097.0 * h / 339200.0))
        + &(&k6 * (187.0 * h / 2100.0))
        + &(&k7 * (h / 40.0));

    let err = y5
        .iter()
        .zip(y4.iter())
        .fold(0.0f64, |m, (a, b)| m.max((a - b).abs()));
    (y5, err)
}
