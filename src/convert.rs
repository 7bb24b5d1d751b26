//! Bridges between the TOML scenario schema and the library types.

use anyhow::{bail, Context, Result};

use talos_diagram::{State, StateDiagram, Transition, TransitionKind};
use talos_dist::{Distribution, Weight};
use talos_network::NetworkConfig;
use talos_solver::{Process, SolveConfig};
use talos_units::{Quantity, Unit};

use crate::config::{DistToml, ModelToml, NetworkToml, SolverToml};

/// Parses a unit name as written in scenario files.
pub fn parse_unit(name: &str) -> Result<Unit> {
    Ok(match name {
        "1" => Unit::One,
        "min" => Unit::Minute,
        "h" => Unit::Hour,
        "yr" => Unit::Year,
        "W" => Unit::Watt,
        "kW" => Unit::KiloWatt,
        "MW" => Unit::MegaWatt,
        "m3/h" => Unit::CubicMetrePerHour,
        other => bail!("unknown unit '{other}' (expected 1, min, h, yr, W, kW, MW or m3/h)"),
    })
}

pub fn build_process(name: &str) -> Result<Process> {
    Ok(match name {
        "steady-state" => Process::SteadyState,
        "markov" => Process::Markov,
        "semi-markov" => Process::SemiMarkov,
        other => bail!("unknown process '{other}' (expected steady-state, markov or semi-markov)"),
    })
}

pub fn build_solve_config(toml: &SolverToml) -> Result<SolveConfig> {
    let time_unit = parse_unit(&toml.time_unit)?;
    let step_unit = parse_unit(&toml.step_unit)?;
    let config = SolveConfig::new()
        .with_start(Quantity::new(toml.start, time_unit))
        .with_horizon(Quantity::new(toml.horizon, time_unit))
        .with_step(Quantity::new(toml.step, step_unit))
        .with_tolerance(toml.tolerance);
    config.validate().context("invalid [solver] section")?;
    Ok(config)
}

pub fn build_network_config(toml: &NetworkToml) -> Result<NetworkConfig> {
    let config = NetworkConfig::new()
        .with_tolerance(toml.tolerance)
        .with_max_iterations(toml.max_iterations);
    config.validate().context("invalid [network] section")?;
    Ok(config)
}

fn required(field: Option<f64>, kind: &str, name: &str) -> Result<f64> {
    field.with_context(|| format!("{kind} distribution requires '{name}'"))
}

pub fn build_distribution(toml: &DistToml) -> Result<Distribution> {
    let unit = parse_unit(&toml.unit)?;
    let distr = match toml.kind.as_str() {
        "exponential" => Distribution::exponential(Quantity::new(
            required(toml.scale, "exponential", "scale")?,
            unit,
        ))?,
        "weibull" => Distribution::weibull(
            Quantity::new(required(toml.scale, "weibull", "scale")?, unit),
            required(toml.shape, "weibull", "shape")?,
        )?,
        "lognormal" => Distribution::lognormal(
            Quantity::new(required(toml.median, "lognormal", "median")?, unit),
            required(toml.sigma, "lognormal", "sigma")?,
        )?,
        "dirac" => {
            Distribution::dirac(Quantity::new(required(toml.point, "dirac", "point")?, unit))?
        }
        other => {
            bail!("unknown distribution kind '{other}' (expected exponential, weibull, lognormal or dirac)")
        }
    };
    Ok(match toml.weight {
        Some(w) => distr.with_weight(Weight::constant(w)?),
        None => distr,
    })
}

fn build_transition(
    from: usize,
    to: usize,
    kind: TransitionKind,
    rate: Option<f64>,
    distr: &Option<DistToml>,
    direction: &str,
) -> Result<Option<Transition>> {
    match (rate, distr) {
        (Some(_), Some(_)) => {
            bail!("give either {direction}_rate or a [{direction}] distribution, not both")
        }
        (Some(r), None) => Ok(Some(Transition::rate(from, to, r, Unit::Year)?.kind(kind))),
        (None, Some(d)) => {
            let distribution =
                build_distribution(d).with_context(|| format!("invalid {direction} distribution"))?;
            Ok(Some(Transition::with_distribution(from, to, distribution).kind(kind)))
        }
        (None, None) => Ok(None),
    }
}

/// Builds the two-state failure/repair diagram of one model block.
///
/// State 0 is up and delivers `performance`; state 1 is down and delivers
/// nothing. A model without failure and repair entries is a static law.
pub fn build_model_diagram(toml: &ModelToml) -> Result<StateDiagram> {
    if !(0.0..=1.0).contains(&toml.init_up) {
        bail!("init_up must be in [0, 1], got {}", toml.init_up);
    }
    let unit = parse_unit(&toml.performance_unit)?;
    let mut diagram = StateDiagram::new();
    diagram.add_states([
        State::new(Quantity::new(toml.performance, unit), toml.init_up).with_name("up"),
        State::new(Quantity::new(0.0, unit), 1.0 - toml.init_up).with_name("down"),
    ])?;

    let transitions = [
        build_transition(
            0,
            1,
            TransitionKind::Failure,
            toml.failure_rate,
            &toml.failure,
            "failure",
        )?,
        build_transition(
            1,
            0,
            TransitionKind::Repair,
            toml.repair_rate,
            &toml.repair,
            "repair",
        )?,
    ];
    diagram.add_transitions(transitions.into_iter().flatten())?;
    Ok(diagram)
}
