//! General holding times via the Markov renewal (Volterra) equations.
//!
//! Direct Kolmogorov integration is invalid when holding times are not
//! exponential. Instead the transition frequency densities satisfy
//!
//! ```text
//! h_e(t) = π0_src(e) · pdf_e(t) + Σ_{e' into src(e)} ∫₀ᵗ h_{e'}(τ) · pdf_e(t−τ) dτ
//! ```
//!
//! solved by an O(n²) forward recursion over a fixed grid with trapezoid
//! quadrature weights; the implicit endpoint term is settled with a short
//! predictor–corrector sweep. Occupancies then follow by convolving each
//! state's inflow densities with its own sojourn survival
//! `W_i(t) = max(0, 1 − Σ_{e out of i} cdf_e(t))`, plus initial occupancy
//! surviving in place. Trapping states have `W ≡ 1` and accumulate
//! monotonically.
//!
//! Rate-only transitions are lowered to exponential distributions before any
//! computation. Time-varying weights are evaluated at the entry time of the
//! holding interval.

use talos_diagram::{Solution, StateDiagram};
use talos_dist::Distribution;
use tracing::debug;

use crate::config::SolveConfig;
use crate::error::SolverError;

/// Corrector sweeps settling the implicit endpoint of the convolution.
const CORRECTOR_SWEEPS: usize = 2;

/// An active transition: arena index, endpoints, lowered distribution.
struct Channel {
    arena: usize,
    from: usize,
    to: usize,
    distr: Distribution,
}

pub(crate) fn solve_semi_markov(
    diagram: &mut StateDiagram,
    config: &SolveConfig,
) -> Result<(), SolverError> {
    config.validate()?;
    diagram.validate()?;

    let n = diagram.n_states();
    let grid = config.grid();
    let npts = grid.len();
    let dt = config.step_hours();

    // Lower every non-trapping exit to a distribution channel. A point mass
    // has no density for the quadrature to sample, so it is rejected rather
    // than left to freeze the recursion at the initial occupancy.
    let mut channels = Vec::new();
    for (arena, t) in diagram.transitions().iter().enumerate() {
        if diagram.states()[t.from()].is_trapping() {
            continue;
        }
        let distr = t.holding().as_distribution()?;
        if matches!(distr.kind(), talos_dist::Kind::Dirac { .. }) {
            return Err(SolverError::DegenerateHolding { transition: arena });
        }
        channels.push(Channel {
            arena,
            from: t.from(),
            to: t.to(),
            distr,
        });
    }
    let ne = channels.len();
    debug!(states = n, channels = ne, points = npts, "semi-markov recursion");

    // Sampled kernels on the elapsed-time axis s_j = j·dt.
    let pdfb: Vec<Vec<f64>> = channels
        .iter()
        .map(|c| (0..npts).map(|j| c.distr.pdf_base(j as f64 * dt)).collect())
        .collect();
    let cdfb: Vec<Vec<f64>> = channels
        .iter()
        .map(|c| (0..npts).map(|j| c.distr.cdf_base(j as f64 * dt)).collect())
        .collect();
    // Weights ride the wall clock, so they are sampled at the grid points
    // themselves rather than at elapsed time from zero.
    let weight: Vec<Vec<f64>> = channels
        .iter()
        .map(|c| grid.iter().map(|&t| c.distr.weight().at(t)).collect())
        .collect();

    let inflow: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            channels
                .iter()
                .enumerate()
                .filter(|(_, c)| c.to == i)
                .map(|(e, _)| e)
                .collect()
        })
        .collect();
    let outflow: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            channels
                .iter()
                .enumerate()
                .filter(|(_, c)| c.from == i)
                .map(|(e, _)| e)
                .collect()
        })
        .collect();

    let init = diagram.init_probs();

    // Trapezoid weight for sub-interval index m of k+1 points.
    let tw = |m: usize, k: usize| if m == 0 || m == k { 0.5 } else { 1.0 };

    // Forward recursion for the frequency densities.
    let mut h = vec![vec![0.0f64; npts]; ne];
    for k in 0..npts {
        for sweep in 0..=CORRECTOR_SWEEPS {
            for (e, c) in channels.iter().enumerate() {
                let seed = init[c.from] * weight[e][0] * pdfb[e][k];
                let mut conv = 0.0;
                if k > 0 {
                    for &ein in &inflow[c.from] {
                        let mut sum = 0.0;
                        for m in 0..=k {
                            sum += tw(m, k) * h[ein][m] * weight[e][m] * pdfb[e][k - m];
                        }
                        conv += dt * sum;
                    }
                }
                h[e][k] = seed + conv;
            }
            // First pass is the predictor with the endpoint still zero; a
            // sweep is only needed while some channel feeds back on itself.
            if sweep == 0 && k == 0 {
                break;
            }
        }
    }

    // Occupancy: survival of the initial mass plus convolved inflow survival.
    let survival = |i: usize, j: usize, m: usize| -> f64 {
        let exited: f64 = outflow[i].iter().map(|&e| weight[e][m] * cdfb[e][j]).sum();
        (1.0 - exited).max(0.0)
    };
    let mut probs = vec![vec![0.0f64; npts]; n];
    for i in 0..n {
        for k in 0..npts {
            let mut p = init[i] * survival(i, k, 0);
            if k > 0 {
                for &e in &inflow[i] {
                    let mut sum = 0.0;
                    for m in 0..=k {
                        sum += tw(m, k) * h[e][m] * survival(i, k - m, m);
                    }
                    p += dt * sum;
                }
            }
            probs[i][k] = p.clamp(0.0, 1.0);
        }
    }

    // Frequency rows in arena order; trapping exits stay zero.
    let mut freq = vec![vec![0.0f64; npts]; diagram.n_transitions()];
    for (e, c) in channels.iter().enumerate() {
        freq[c.arena] = std::mem::take(&mut h[e]);
    }

    diagram.set_solution(Solution::new(grid, probs, freq))?;
    Ok(())
}
