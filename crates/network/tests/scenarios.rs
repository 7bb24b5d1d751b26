//! End-to-end scenarios: diagrams solved by the process solvers, composed
//! through a network.

use approx::assert_relative_eq;
use talos_diagram::{State, StateDiagram, Transition, TransitionKind};
use talos_network::{Network, NetworkConfig};
use talos_solver::{solve, Process, SolveConfig};
use talos_units::{Quantity, Unit};

fn failure_repair(lambda_per_yr: f64, mu_per_yr: f64) -> StateDiagram {
    let mut d = StateDiagram::new();
    d.add_states([
        State::new(Quantity::dimensionless(1.0), 1.0).with_name("up"),
        State::new(Quantity::dimensionless(0.0), 0.0).with_name("down"),
    ])
    .unwrap();
    d.add_transitions([
        Transition::rate(0, 1, lambda_per_yr, Unit::Year)
            .unwrap()
            .kind(TransitionKind::Failure),
        Transition::rate(1, 0, mu_per_yr, Unit::Year)
            .unwrap()
            .kind(TransitionKind::Repair),
    ])
    .unwrap();
    d
}

fn always_on() -> StateDiagram {
    StateDiagram::from_solution(
        vec![Quantity::dimensionless(1.0)],
        Vec::new(),
        vec![vec![1.0]],
    )
    .unwrap()
}

#[test]
fn source_through_repairable_component() {
    // One perfect source feeding a user through a component failing once a
    // year and repaired ten times as fast.
    let mut component = failure_repair(1.0, 10.0);
    solve(&mut component, Process::SteadyState, &SolveConfig::new()).unwrap();

    let mut net = Network::new();
    net.add_source(0, Some("feed"), &always_on()).unwrap();
    net.add_component(0, 1, Some("line"), &component).unwrap();
    net.add_user(1, Some("plant"), None);
    net.solve(&NetworkConfig::new()).unwrap();

    let law = net.user_ugf(1).unwrap();
    assert_eq!(law.values(), &[0.0, 1.0]);
    assert_relative_eq!(law.prob(1).unwrap()[0], 10.0 / 11.0, epsilon = 1e-9);
    assert_relative_eq!(law.prob(0).unwrap()[0], 1.0 / 11.0, epsilon = 1e-9);
}

#[test]
fn redundant_sources_with_capped_delivery() {
    // Two independent 95%-available feeds into a user that can absorb one
    // unit: only the double outage is felt.
    let mut feed = StateDiagram::new();
    feed.add_states([
        State::new(Quantity::dimensionless(1.0), 1.0),
        State::new(Quantity::dimensionless(0.0), 0.0),
    ])
    .unwrap();
    // Rates chosen so the stationary availability is exactly 0.95.
    feed.add_transitions([
        Transition::rate(0, 1, 1.0, Unit::Year).unwrap(),
        Transition::rate(1, 0, 19.0, Unit::Year).unwrap(),
    ])
    .unwrap();
    solve(&mut feed, Process::SteadyState, &SolveConfig::new()).unwrap();

    let mut net = Network::new();
    net.add_sources(&[0, 1], Some("feeds"), &feed, false).unwrap();
    net.add_components(&[(0, 2), (1, 2)], None, &always_on())
        .unwrap();
    net.add_user(2, Some("plant"), Some(Quantity::dimensionless(1.0)));
    net.solve(&NetworkConfig::new()).unwrap();

    let law = net.user_ugf(2).unwrap();
    assert_eq!(law.values(), &[0.0, 1.0]);
    assert_relative_eq!(law.prob(0).unwrap()[0], 0.0025, epsilon = 1e-9);
    assert_relative_eq!(law.prob(1).unwrap()[0], 0.9975, epsilon = 1e-9);
}

#[test]
fn time_indexed_component_carries_its_trajectory_to_the_user() {
    // Transient Markov trajectories survive composition: the user's law is
    // time-indexed and starts fully available.
    let config = SolveConfig::new()
        .with_horizon(Quantity::new(0.2, Unit::Year))
        .with_step(Quantity::new(87.6, Unit::Hour));
    let mut component = failure_repair(1.0, 10.0);
    solve(&mut component, Process::Markov, &config).unwrap();

    let mut net = Network::new();
    net.add_source(0, None, &always_on()).unwrap();
    net.add_component(0, 1, None, &component).unwrap();
    net.add_user(1, None, None);
    net.solve(&NetworkConfig::new()).unwrap();

    let law = net.user_ugf(1).unwrap();
    assert!(law.n_slices() > 1);
    assert_relative_eq!(law.prob(1).unwrap()[0], 1.0, epsilon = 1e-9);
    let last = law.n_slices() - 1;
    // Already descending toward the stationary 10/11.
    assert!(law.prob(1).unwrap()[last] < 1.0);
    assert!(law.prob(1).unwrap()[last] > 10.0 / 11.0 - 1e-3);
    for k in 0..law.n_slices() {
        assert_relative_eq!(law.mass(k), 1.0, epsilon = 1e-6);
    }
}
