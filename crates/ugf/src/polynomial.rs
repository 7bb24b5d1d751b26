//! The u-function itself: a discrete performance law and its composition
//! operators.

use talos_diagram::StateDiagram;
use talos_units::{Quantity, Unit, UnitError};

use crate::error::UgfError;

/// Two performance values closer than this (in base units, relative to their
/// magnitude) are treated as the same term and their masses merged.
const VALUE_TOL: f64 = 1e-9;

/// Slack allowed on a per-slice total mass before it counts as invalid.
const MASS_TOL: f64 = 1e-6;

/// A universal generating function: a finite set of performance values with a
/// probability mass for each, optionally indexed over a shared time grid.
///
/// Values are stored in the base unit of their dimension, ascending and
/// distinct. Masses are `[value][slice]`; a single-slice polynomial (a
/// steady-state law) broadcasts against any slice count when composed. Any
/// shortfall of a slice's total mass from 1 lives in an explicit zero-value
/// term, so totals are invariant under every operator.
#[derive(Debug, Clone)]
pub struct Ugf {
    unit: Unit,
    values: Vec<f64>,
    probs: Vec<Vec<f64>>,
}

impl Ugf {
    /// Extracts the performance law of a solved diagram.
    ///
    /// States sharing a performance value become one term whose mass is the
    /// sum of their occupancy trajectories. The result always carries a
    /// zero-value term holding whatever mass the diagram's states do not
    /// account for.
    ///
    /// # Errors
    ///
    /// [`UgfError::NotSolved`] if the diagram carries no solution;
    /// [`UgfError::Unit`] if the states' performance dimensions disagree.
    pub fn from_diagram(diagram: &StateDiagram) -> Result<Self, UgfError> {
        let solution = diagram.solution().ok_or(UgfError::NotSolved)?;
        let states = diagram.states();
        let first = states[0].performance();
        let slices = solution.n_slices();

        let mut terms: Vec<(f64, Vec<f64>)> = vec![(0.0, vec![0.0; slices])];
        for (state, row) in states.iter().zip(solution.state_probs()) {
            let perf = state.performance();
            perf.same_dimension(&first)?;
            terms.push((perf.to_base(), row.clone()));
        }
        let mut ugf = Self::collapse(first.unit().base_unit(), terms, slices)?;

        // Route the residual of each slice into the zero-value term. The term
        // exists by construction and collapsing never drops it.
        let zero = ugf
            .values
            .iter()
            .position(|&v| v.abs() <= VALUE_TOL)
            .unwrap_or(0);
        for k in 0..slices {
            let total: f64 = ugf.probs.iter().map(|row| row[k]).sum();
            if total > 1.0 + MASS_TOL {
                return Err(UgfError::InvalidProbability { value: total });
            }
            ugf.probs[zero][k] += (1.0 - total).max(0.0);
        }
        Ok(ugf)
    }

    /// Sorts raw terms by value, merges near-equal values, and checks masses.
    fn collapse(
        unit: Unit,
        mut terms: Vec<(f64, Vec<f64>)>,
        slices: usize,
    ) -> Result<Self, UgfError> {
        terms.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut values: Vec<f64> = Vec::with_capacity(terms.len());
        let mut probs: Vec<Vec<f64>> = Vec::with_capacity(terms.len());
        for (value, row) in terms {
            debug_assert_eq!(row.len(), slices);
            match (values.last().copied(), probs.last_mut()) {
                (Some(prev), Some(merged)) if same_value(prev, value) => {
                    for (acc, p) in merged.iter_mut().zip(&row) {
                        *acc += p;
                    }
                }
                _ => {
                    values.push(value);
                    probs.push(row);
                }
            }
        }
        for row in &probs {
            for &p in row {
                if !p.is_finite() || !(-MASS_TOL..=1.0 + MASS_TOL).contains(&p) {
                    return Err(UgfError::InvalidProbability { value: p });
                }
            }
        }
        Ok(Self { unit, values, probs })
    }

    /// Composition core: every value pair combined through `combine`, masses
    /// multiplied, result collapsed. Single-slice operands broadcast.
    fn compose_with(
        &self,
        other: &Ugf,
        combine: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, UgfError> {
        let expected = self.unit.dimension();
        let got = other.unit.dimension();
        if expected != got {
            return Err(UnitError::Mismatch { expected, got }.into());
        }
        let (n, m) = (self.n_slices(), other.n_slices());
        let slices = match (n, m) {
            _ if n == m => n,
            (1, _) => m,
            (_, 1) => n,
            _ => return Err(UgfError::SliceMismatch { left: n, right: m }),
        };

        let mut terms = Vec::with_capacity(self.values.len() * other.values.len());
        for (i, &a) in self.values.iter().enumerate() {
            for (j, &b) in other.values.iter().enumerate() {
                let row: Vec<f64> = (0..slices)
                    .map(|k| {
                        self.probs[i][if n == 1 { 0 } else { k }]
                            * other.probs[j][if m == 1 { 0 } else { k }]
                    })
                    .collect();
                terms.push((combine(a, b), row));
            }
        }
        Self::collapse(self.unit, terms, slices)
    }

    /// Series composition: the weaker element limits, value = min.
    pub fn series(&self, other: &Ugf) -> Result<Self, UgfError> {
        self.compose_with(other, f64::min)
    }

    /// Series composition under a caller-supplied combining rule on base
    /// values.
    pub fn series_by(
        &self,
        other: &Ugf,
        combine: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, UgfError> {
        self.compose_with(other, combine)
    }

    /// Parallel composition: capacities add, value = sum.
    pub fn parallel(&self, other: &Ugf) -> Result<Self, UgfError> {
        self.compose_with(other, |a, b| a + b)
    }

    /// Parallel composition of redundant elements whose combined delivery
    /// cannot exceed `cap`: value = min(sum, cap).
    pub fn parallel_capped(&self, other: &Ugf, cap: Quantity) -> Result<Self, UgfError> {
        cap.expect_dimension(self.unit.dimension())?;
        let c = cap.to_base();
        self.compose_with(other, move |a, b| (a + b).min(c))
    }

    /// The base unit the values are expressed in.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Number of distinct performance values.
    pub fn n_terms(&self) -> usize {
        self.values.len()
    }

    /// Number of time slices (1 for a steady-state law).
    pub fn n_slices(&self) -> usize {
        self.probs.first().map_or(0, Vec::len)
    }

    /// Performance values in base units, ascending.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Performance values as unit-tagged quantities.
    pub fn value_quantities(&self) -> Vec<Quantity> {
        self.values
            .iter()
            .map(|&v| Quantity::new(v, self.unit))
            .collect()
    }

    /// Probability masses, `[value][slice]`, ordered like [`values`].
    ///
    /// [`values`]: Ugf::values
    pub fn probs(&self) -> &[Vec<f64>] {
        &self.probs
    }

    /// The mass trajectory of one term.
    pub fn prob(&self, term: usize) -> Option<&[f64]> {
        self.probs.get(term).map(Vec::as_slice)
    }

    /// Total mass of one slice.
    pub fn mass(&self, slice: usize) -> f64 {
        self.probs.iter().map(|row| row[slice]).sum()
    }

    /// Expected performance of one slice, in base units.
    pub fn mean(&self, slice: usize) -> f64 {
        self.values
            .iter()
            .zip(&self.probs)
            .map(|(v, row)| v * row[slice])
            .sum()
    }

    /// Largest absolute mass difference between two laws, aligning terms by
    /// value and treating a term absent on one side as zero mass.
    ///
    /// Infinite when the slice counts differ; the fixed-point loop in the
    /// network solver uses this as its convergence measure.
    pub fn max_abs_diff(&self, other: &Ugf) -> f64 {
        if self.n_slices() != other.n_slices() {
            return f64::INFINITY;
        }
        let zeros = vec![0.0; self.n_slices()];
        let (mut i, mut j) = (0, 0);
        let mut worst: f64 = 0.0;
        while i < self.values.len() || j < other.values.len() {
            let (a, b): (&[f64], &[f64]) = match (self.values.get(i), other.values.get(j)) {
                (Some(&va), Some(&vb)) if same_value(va, vb) => {
                    let pair = (&self.probs[i][..], &other.probs[j][..]);
                    i += 1;
                    j += 1;
                    pair
                }
                (Some(&va), Some(&vb)) if va < vb => {
                    i += 1;
                    (&self.probs[i - 1][..], &zeros[..])
                }
                (Some(_), Some(_)) | (None, Some(_)) => {
                    j += 1;
                    (&zeros[..], &other.probs[j - 1][..])
                }
                (Some(_), None) => {
                    i += 1;
                    (&self.probs[i - 1][..], &zeros[..])
                }
                (None, None) => break,
            };
            for (pa, pb) in a.iter().zip(b) {
                worst = worst.max((pa - pb).abs());
            }
        }
        worst
    }
}

fn same_value(a: f64, b: f64) -> bool {
    (a - b).abs() <= VALUE_TOL * a.abs().max(b.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Steady-state law as a pre-solved diagram: one slice per state.
    fn solved(unit: Unit, pairs: &[(f64, f64)]) -> StateDiagram {
        let perf = pairs
            .iter()
            .map(|&(v, _)| Quantity::new(v, unit))
            .collect();
        let probs = pairs.iter().map(|&(_, p)| vec![p]).collect();
        StateDiagram::from_solution(perf, Vec::new(), probs).unwrap()
    }

    #[test]
    fn extraction_requires_solution() {
        let d = StateDiagram::new();
        assert!(matches!(Ugf::from_diagram(&d), Err(UgfError::NotSolved)));
    }

    #[test]
    fn extraction_groups_equal_values() {
        // Two distinct states delivering the same 5 MW.
        let d = solved(
            Unit::MegaWatt,
            &[(5.0, 0.3), (5.0, 0.4), (0.0, 0.3)],
        );
        let u = Ugf::from_diagram(&d).unwrap();
        assert_eq!(u.values(), &[0.0, 5000.0]);
        assert_relative_eq!(u.prob(1).unwrap()[0], 0.7);
        assert_relative_eq!(u.prob(0).unwrap()[0], 0.3);
        assert_eq!(u.unit(), Unit::KiloWatt);
    }

    #[test]
    fn extraction_adds_residual_to_zero_term() {
        let d = solved(Unit::KiloWatt, &[(5.0, 0.9)]);
        let u = Ugf::from_diagram(&d).unwrap();
        assert_eq!(u.values(), &[0.0, 5.0]);
        assert_relative_eq!(u.prob(0).unwrap()[0], 0.1);
        assert_relative_eq!(u.mass(0), 1.0);
    }

    #[test]
    fn series_takes_minimum_and_preserves_mass() {
        let a = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(10.0, 0.8), (0.0, 0.2)])).unwrap();
        let b = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(5.0, 0.9), (0.0, 0.1)])).unwrap();
        let s = a.series(&b).unwrap();
        assert_eq!(s.values(), &[0.0, 5.0]);
        assert_relative_eq!(s.prob(1).unwrap()[0], 0.8 * 0.9);
        assert_relative_eq!(s.prob(0).unwrap()[0], 1.0 - 0.72);
        assert_relative_eq!(s.mass(0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn series_is_associative() {
        let a = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(10.0, 0.8), (0.0, 0.2)])).unwrap();
        let b = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(5.0, 0.9), (0.0, 0.1)])).unwrap();
        let c = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(7.0, 0.6), (0.0, 0.4)])).unwrap();
        let left = a.series(&b).unwrap().series(&c).unwrap();
        let right = a.series(&b.series(&c).unwrap()).unwrap();
        assert_eq!(left.values(), right.values());
        for (lr, rr) in left.probs().iter().zip(right.probs()) {
            assert_relative_eq!(lr[0], rr[0], epsilon = 1e-12);
        }
    }

    #[test]
    fn parallel_is_commutative() {
        let a = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(10.0, 0.8), (0.0, 0.2)])).unwrap();
        let b = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(5.0, 0.9), (0.0, 0.1)])).unwrap();
        let ab = a.parallel(&b).unwrap();
        let ba = b.parallel(&a).unwrap();
        assert_eq!(ab.values(), &[0.0, 5.0, 10.0, 15.0]);
        assert_eq!(ab.values(), ba.values());
        for (l, r) in ab.probs().iter().zip(ba.probs()) {
            assert_relative_eq!(l[0], r[0], epsilon = 1e-12);
        }
    }

    #[test]
    fn capped_parallel_folds_redundant_capacity() {
        // Two independent 95% sources feeding a 1-unit delivery point.
        let a = Ugf::from_diagram(&solved(Unit::One, &[(1.0, 0.95), (0.0, 0.05)])).unwrap();
        let b = a.clone();
        let u = a
            .parallel_capped(&b, Quantity::dimensionless(1.0))
            .unwrap();
        assert_eq!(u.values(), &[0.0, 1.0]);
        assert_relative_eq!(u.prob(0).unwrap()[0], 0.0025, epsilon = 1e-12);
        assert_relative_eq!(u.prob(1).unwrap()[0], 0.9975, epsilon = 1e-12);
    }

    #[test]
    fn capped_parallel_checks_cap_dimension() {
        let a = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(1.0, 1.0)])).unwrap();
        let err = a
            .parallel_capped(&a.clone(), Quantity::new(1.0, Unit::Hour))
            .unwrap_err();
        assert!(matches!(err, UgfError::Unit(_)));
    }

    #[test]
    fn composition_rejects_mixed_dimensions() {
        let p = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(1.0, 1.0)])).unwrap();
        let t = Ugf::from_diagram(&solved(Unit::CubicMetrePerHour, &[(1.0, 1.0)])).unwrap();
        assert!(matches!(p.series(&t), Err(UgfError::Unit(_))));
    }

    #[test]
    fn single_slice_broadcasts_against_trajectory() {
        let steady = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(4.0, 0.5), (0.0, 0.5)])).unwrap();
        let moving = Ugf::from_diagram(
            &StateDiagram::from_solution(
                vec![
                    Quantity::new(4.0, Unit::KiloWatt),
                    Quantity::new(0.0, Unit::KiloWatt),
                ],
                vec![0.0, 1.0, 2.0],
                vec![vec![1.0, 0.9, 0.8], vec![0.0, 0.1, 0.2]],
            )
            .unwrap(),
        )
        .unwrap();
        let s = steady.series(&moving).unwrap();
        assert_eq!(s.n_slices(), 3);
        assert_relative_eq!(s.prob(1).unwrap()[2], 0.5 * 0.8);
        for k in 0..3 {
            assert_relative_eq!(s.mass(k), 1.0, epsilon = 1e-12);
        }
        // Two trajectories of different lengths cannot align.
        let other = Ugf::from_diagram(
            &StateDiagram::from_solution(
                vec![Quantity::new(4.0, Unit::KiloWatt)],
                vec![0.0, 1.0],
                vec![vec![1.0, 1.0]],
            )
            .unwrap(),
        )
        .unwrap();
        assert!(matches!(
            moving.series(&other),
            Err(UgfError::SliceMismatch { left: 3, right: 2 })
        ));
    }

    #[test]
    fn series_by_applies_custom_rule() {
        let a = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(3.0, 1.0)])).unwrap();
        let b = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(4.0, 1.0)])).unwrap();
        // Bottleneck rule that halves the weaker side.
        let s = a.series_by(&b, |x, y| x.min(y) / 2.0).unwrap();
        assert_eq!(s.values(), &[0.0, 1.5]);
    }

    #[test]
    fn round_trip_through_diagram_is_exact() {
        let u = Ugf::from_diagram(&solved(Unit::MegaWatt, &[(2.0, 0.6), (1.0, 0.3), (0.0, 0.1)]))
            .unwrap();
        let back = StateDiagram::from_solution(
            u.value_quantities(),
            Vec::new(),
            u.probs().to_vec(),
        )
        .unwrap();
        let again = Ugf::from_diagram(&back).unwrap();
        assert_eq!(again.values(), u.values());
        assert_eq!(again.probs(), u.probs());
    }

    #[test]
    fn max_abs_diff_aligns_terms_by_value() {
        let a = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(5.0, 0.9), (0.0, 0.1)])).unwrap();
        let b = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(5.0, 0.8), (0.0, 0.2)])).unwrap();
        assert_relative_eq!(a.max_abs_diff(&b), 0.1, epsilon = 1e-12);
        assert_relative_eq!(a.max_abs_diff(&a.clone()), 0.0);
        // A term only on one side counts at full mass.
        let c = Ugf::from_diagram(&solved(Unit::KiloWatt, &[(3.0, 0.9), (0.0, 0.1)])).unwrap();
        assert_relative_eq!(a.max_abs_diff(&c), 0.9, epsilon = 1e-12);
    }
}
