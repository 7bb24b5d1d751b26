//! The state-transition diagram container and its solved trajectories.

use talos_units::Quantity;

use crate::error::{DiagramError, PROB_TOL};
use crate::state::State;
use crate::transition::Transition;

/// Solved trajectories of a diagram, aligned to a shared time grid.
///
/// An empty time grid with a single probability slice per state represents a
/// steady-state-only result. Frequencies are transition frequency densities
/// `h_e(t)`, one trajectory per transition record, in the same order as the
/// diagram's transition arena.
#[derive(Debug, Clone)]
pub struct Solution {
    time: Vec<f64>,
    state_probs: Vec<Vec<f64>>,
    freq: Vec<Vec<f64>>,
}

impl Solution {
    /// Assembles a solution from its parts. Shape checks happen in
    /// [`StateDiagram::set_solution`], which is the only way to attach one.
    pub fn new(time: Vec<f64>, state_probs: Vec<Vec<f64>>, freq: Vec<Vec<f64>>) -> Self {
        Self {
            time,
            state_probs,
            freq,
        }
    }

    /// The time grid, in base hours. Empty for steady-state results.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Number of time slices (1 for steady-state results).
    pub fn n_slices(&self) -> usize {
        self.state_probs.first().map_or(0, Vec::len)
    }

    /// All per-state probability trajectories, `[state][slice]`.
    pub fn state_probs(&self) -> &[Vec<f64>] {
        &self.state_probs
    }

    /// The probability trajectory of one state.
    pub fn state_prob(&self, state: usize) -> Option<&[f64]> {
        self.state_probs.get(state).map(Vec::as_slice)
    }

    /// All per-transition frequency-density trajectories, `[transition][slice]`.
    pub fn freq(&self) -> &[Vec<f64>] {
        &self.freq
    }
}

/// A component's stochastic model: states, transitions, and (after solving)
/// occupancy and frequency trajectories.
///
/// The transition set is a directed multigraph held in an arena: records are
/// addressed by their insertion index, and parallel edges between the same
/// ordered state pair are distinct, meaningful entries. Cycles are expected
/// (repair-then-fail loops).
///
/// Lifecycle: created empty, populated through [`add_states`] and
/// [`add_transitions`], solved in place by a process solver, then treated as
/// immutable by the network layer.
///
/// [`add_states`]: StateDiagram::add_states
/// [`add_transitions`]: StateDiagram::add_transitions
#[derive(Debug, Clone, Default)]
pub struct StateDiagram {
    states: Vec<State>,
    transitions: Vec<Transition>,
    solution: Option<Solution>,
}

impl StateDiagram {
    /// Creates an empty diagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends states, validating each initial probability.
    ///
    /// Every probability must lie in `[0, 1]` and the running total over all
    /// states must never exceed `1 + 1e-9`. The total is only required to
    /// *reach* 1 once the diagram is complete, which [`validate`] checks at
    /// solve time, so states can arrive across several calls.
    ///
    /// [`validate`]: StateDiagram::validate
    pub fn add_states(
        &mut self,
        states: impl IntoIterator<Item = State>,
    ) -> Result<(), DiagramError> {
        let mut sum: f64 = self.states.iter().map(State::init_prob).sum();
        for state in states {
            let p = state.init_prob();
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(DiagramError::ProbabilityOutOfRange {
                    index: self.states.len(),
                    value: p,
                });
            }
            sum += p;
            if sum > 1.0 + PROB_TOL {
                return Err(DiagramError::ProbabilityMassExceeded { sum });
            }
            self.states.push(state);
        }
        Ok(())
    }

    /// Appends transitions, validating that both endpoints exist.
    pub fn add_transitions(
        &mut self,
        transitions: impl IntoIterator<Item = Transition>,
    ) -> Result<(), DiagramError> {
        for t in transitions {
            for idx in [t.from(), t.to()] {
                if idx >= self.states.len() {
                    return Err(DiagramError::UnknownState {
                        index: idx,
                        n_states: self.states.len(),
                    });
                }
            }
            self.transitions.push(t);
        }
        Ok(())
    }

    /// Checks that the diagram is complete: non-empty, with initial
    /// probabilities summing to 1 within `1e-9`.
    pub fn validate(&self) -> Result<(), DiagramError> {
        if self.states.is_empty() {
            return Err(DiagramError::Empty);
        }
        let sum: f64 = self.states.iter().map(State::init_prob).sum();
        if (sum - 1.0).abs() > PROB_TOL {
            return Err(DiagramError::ProbabilityMassIncomplete { sum });
        }
        Ok(())
    }

    /// Number of states.
    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// Number of transition records (parallel edges counted separately).
    pub fn n_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// All states, in index order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// One state by index.
    pub fn state(&self, index: usize) -> Option<&State> {
        self.states.get(index)
    }

    /// All transition records, in arena order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Transitions leaving `state`, with their arena indices.
    pub fn transitions_from(
        &self,
        state: usize,
    ) -> impl Iterator<Item = (usize, &Transition)> + '_ {
        self.transitions
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.from() == state)
    }

    /// Transitions entering `state`, with their arena indices.
    pub fn transitions_into(
        &self,
        state: usize,
    ) -> impl Iterator<Item = (usize, &Transition)> + '_ {
        self.transitions
            .iter()
            .enumerate()
            .filter(move |(_, t)| t.to() == state)
    }

    /// The initial occupancy distribution as a vector.
    pub fn init_probs(&self) -> Vec<f64> {
        self.states.iter().map(State::init_prob).collect()
    }

    /// Attaches solved trajectories after checking their shape.
    ///
    /// Requirements: one probability row per state, all rows of one shared
    /// slice count ≥ 1; one frequency row per transition with the same slice
    /// count; a time grid either empty (steady state, single slice) or of
    /// exactly the slice length; probabilities within `[0, 1]` up to a small
    /// numerical margin.
    pub fn set_solution(&mut self, solution: Solution) -> Result<(), DiagramError> {
        let slices = solution.n_slices();
        if solution.state_probs().len() != self.states.len() || slices == 0 {
            return Err(DiagramError::SolutionShape {
                reason: format!(
                    "expected {} non-empty probability rows, got {}",
                    self.states.len(),
                    solution.state_probs().len()
                ),
            });
        }
        for (i, row) in solution.state_probs().iter().enumerate() {
            if row.len() != slices {
                return Err(DiagramError::SolutionShape {
                    reason: format!(
                        "probability row {i} has {} slices, expected {slices}",
                        row.len()
                    ),
                });
            }
            for &p in row {
                if !p.is_finite() || !(-1e-6..=1.0 + 1e-6).contains(&p) {
                    return Err(DiagramError::ProbabilityOutOfRange { index: i, value: p });
                }
            }
        }
        if solution.freq().len() != self.transitions.len() {
            return Err(DiagramError::SolutionShape {
                reason: format!(
                    "expected {} frequency rows, got {}",
                    self.transitions.len(),
                    solution.freq().len()
                ),
            });
        }
        if solution.freq().iter().any(|row| row.len() != slices) {
            return Err(DiagramError::SolutionShape {
                reason: "frequency rows must match the slice count".to_string(),
            });
        }
        if !solution.time().is_empty() && solution.time().len() != slices {
            return Err(DiagramError::SolutionShape {
                reason: format!(
                    "time grid has {} points for {slices} slices",
                    solution.time().len()
                ),
            });
        }
        self.solution = Some(solution);
        Ok(())
    }

    /// The solved trajectories, if any.
    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// True once a solver has populated this diagram.
    pub fn is_solved(&self) -> bool {
        self.solution.is_some()
    }

    /// Builds an already-solved diagram from externally computed trajectories,
    /// bypassing the solvers.
    ///
    /// Each entry of `performance` describes one synthetic state; its initial
    /// probability is taken from the first slice of its trajectory. The
    /// diagram has no transitions, so the frequency block is empty. Used to
    /// splice precomputed results back into a network.
    pub fn from_solution(
        performance: Vec<Quantity>,
        time: Vec<f64>,
        state_probs: Vec<Vec<f64>>,
    ) -> Result<Self, DiagramError> {
        if performance.is_empty() {
            return Err(DiagramError::Empty);
        }
        if performance.len() != state_probs.len() {
            return Err(DiagramError::SolutionShape {
                reason: format!(
                    "{} performance values for {} probability rows",
                    performance.len(),
                    state_probs.len()
                ),
            });
        }
        let mut diagram = StateDiagram::new();
        for (perf, row) in performance.into_iter().zip(&state_probs) {
            let init = row.first().copied().unwrap_or(0.0);
            // Clamp tiny numerical excursions so the mass checks see clean values.
            diagram.add_states([State::new(perf, init.clamp(0.0, 1.0))])?;
        }
        diagram.set_solution(Solution::new(time, state_probs, Vec::new()))?;
        Ok(diagram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::Transition;
    use approx::assert_relative_eq;
    use talos_units::{Quantity, Unit};

    fn two_state() -> StateDiagram {
        let mut d = StateDiagram::new();
        d.add_states([
            State::new(Quantity::new(1.0, Unit::MegaWatt), 1.0).with_name("up"),
            State::new(Quantity::new(0.0, Unit::MegaWatt), 0.0).with_name("down"),
        ])
        .unwrap();
        d.add_transitions([
            Transition::rate(0, 1, 1.0, Unit::Year).unwrap(),
            Transition::rate(1, 0, 10.0, Unit::Year).unwrap(),
        ])
        .unwrap();
        d
    }

    #[test]
    fn build_and_validate() {
        let d = two_state();
        assert_eq!(d.n_states(), 2);
        assert_eq!(d.n_transitions(), 2);
        assert!(d.validate().is_ok());
        assert!(!d.is_solved());
    }

    #[test]
    fn add_states_rejects_excess_mass() {
        let mut d = StateDiagram::new();
        let err = d
            .add_states([
                State::new(Quantity::dimensionless(1.0), 0.7),
                State::new(Quantity::dimensionless(0.0), 0.4),
            ])
            .unwrap_err();
        assert!(matches!(err, DiagramError::ProbabilityMassExceeded { .. }));
        // The first state landed before the overflow was detected.
        assert_eq!(d.n_states(), 1);
    }

    #[test]
    fn add_states_rejects_out_of_range() {
        let mut d = StateDiagram::new();
        assert!(matches!(
            d.add_states([State::new(Quantity::dimensionless(1.0), -0.1)]),
            Err(DiagramError::ProbabilityOutOfRange { .. })
        ));
        assert!(matches!(
            d.add_states([State::new(Quantity::dimensionless(1.0), f64::NAN)]),
            Err(DiagramError::ProbabilityOutOfRange { .. })
        ));
    }

    #[test]
    fn validate_requires_full_mass() {
        let mut d = StateDiagram::new();
        d.add_states([State::new(Quantity::dimensionless(1.0), 0.5)])
            .unwrap();
        assert!(matches!(
            d.validate(),
            Err(DiagramError::ProbabilityMassIncomplete { .. })
        ));
        d.add_states([State::new(Quantity::dimensionless(0.0), 0.5)])
            .unwrap();
        assert!(d.validate().is_ok());
    }

    #[test]
    fn validate_empty() {
        assert!(matches!(
            StateDiagram::new().validate(),
            Err(DiagramError::Empty)
        ));
    }

    #[test]
    fn transitions_reject_unknown_state() {
        let mut d = two_state();
        let err = d
            .add_transitions([Transition::rate(0, 5, 1.0, Unit::Hour).unwrap()])
            .unwrap_err();
        assert!(matches!(
            err,
            DiagramError::UnknownState {
                index: 5,
                n_states: 2
            }
        ));
    }

    #[test]
    fn parallel_transitions_are_kept() {
        let mut d = two_state();
        // A second, competing failure cause on the same ordered pair.
        d.add_transitions([Transition::rate(0, 1, 0.5, Unit::Year).unwrap()])
            .unwrap();
        assert_eq!(d.n_transitions(), 3);
        assert_eq!(d.transitions_from(0).count(), 2);
        assert_eq!(d.transitions_into(1).count(), 2);
    }

    #[test]
    fn set_solution_accepts_consistent_shape() {
        let mut d = two_state();
        let sol = Solution::new(
            vec![0.0, 1.0, 2.0],
            vec![vec![1.0, 0.9, 0.85], vec![0.0, 0.1, 0.15]],
            vec![vec![0.0; 3], vec![0.0; 3]],
        );
        d.set_solution(sol).unwrap();
        assert!(d.is_solved());
        let s = d.solution().unwrap();
        assert_eq!(s.n_slices(), 3);
        assert_relative_eq!(s.state_prob(0).unwrap()[1], 0.9);
    }

    #[test]
    fn set_solution_rejects_ragged_rows() {
        let mut d = two_state();
        let sol = Solution::new(
            vec![0.0, 1.0],
            vec![vec![1.0, 0.9], vec![0.0]],
            vec![vec![0.0; 2], vec![0.0; 2]],
        );
        assert!(matches!(
            d.set_solution(sol),
            Err(DiagramError::SolutionShape { .. })
        ));
    }

    #[test]
    fn set_solution_rejects_wrong_freq_count() {
        let mut d = two_state();
        let sol = Solution::new(
            vec![0.0],
            vec![vec![1.0], vec![0.0]],
            vec![vec![0.0]], // two transitions expected
        );
        assert!(matches!(
            d.set_solution(sol),
            Err(DiagramError::SolutionShape { .. })
        ));
    }

    #[test]
    fn set_solution_rejects_bad_probability() {
        let mut d = two_state();
        let sol = Solution::new(
            vec![0.0],
            vec![vec![1.4], vec![0.0]],
            vec![vec![0.0], vec![0.0]],
        );
        assert!(matches!(
            d.set_solution(sol),
            Err(DiagramError::ProbabilityOutOfRange { .. })
        ));
    }

    #[test]
    fn steady_state_solution_has_empty_grid() {
        let mut d = two_state();
        let sol = Solution::new(
            Vec::new(),
            vec![vec![10.0 / 11.0], vec![1.0 / 11.0]],
            vec![vec![0.0], vec![0.0]],
        );
        d.set_solution(sol).unwrap();
        assert!(d.solution().unwrap().time().is_empty());
        assert_eq!(d.solution().unwrap().n_slices(), 1);
    }

    #[test]
    fn from_solution_grafts_precomputed_results() {
        let perf = vec![
            Quantity::new(1.0, Unit::MegaWatt),
            Quantity::new(0.0, Unit::MegaWatt),
        ];
        let time = vec![0.0, 1.0];
        let probs = vec![vec![1.0, 0.8], vec![0.0, 0.2]];
        let d = StateDiagram::from_solution(perf, time, probs.clone()).unwrap();
        assert!(d.is_solved());
        assert_eq!(d.n_states(), 2);
        assert_eq!(d.n_transitions(), 0);
        assert_eq!(d.solution().unwrap().state_probs(), probs.as_slice());
        assert!(d.validate().is_ok());
    }

    #[test]
    fn from_solution_rejects_mismatched_lengths() {
        let perf = vec![Quantity::dimensionless(1.0)];
        let res = StateDiagram::from_solution(perf, vec![0.0], vec![vec![1.0], vec![0.0]]);
        assert!(matches!(res, Err(DiagramError::SolutionShape { .. })));
    }

    #[test]
    fn from_solution_rejects_empty() {
        assert!(matches!(
            StateDiagram::from_solution(Vec::new(), Vec::new(), Vec::new()),
            Err(DiagramError::Empty)
        ));
    }
}
