use std::fs;

use anyhow::{bail, Context, Result};
use tracing::info;

use talos_network::Network;
use talos_units::Quantity;

use crate::cli::SolveArgs;
use crate::config::{ScenarioConfig, UserToml};
use crate::convert;

/// Run the full scenario pipeline: solve every component diagram, assemble
/// the network, solve it, and print each user's delivered-performance table.
pub fn run(args: SolveArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read scenario: {}", args.config.display()))?;
    let cfg: ScenarioConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse scenario: {}", args.config.display()))?;

    let net = build_and_solve(&cfg)?;

    for user in &cfg.users {
        for node in user_nodes(user)? {
            print_user(&net, node);
        }
    }
    Ok(())
}

/// Builds the network from a parsed scenario and runs both solver layers.
pub fn build_and_solve(cfg: &ScenarioConfig) -> Result<Network> {
    let process = convert::build_process(&cfg.solver.process)?;
    let solve_config = convert::build_solve_config(&cfg.solver)?;
    let network_config = convert::build_network_config(&cfg.network)?;

    let mut net = Network::new();
    for source in &cfg.sources {
        let name = source.name.as_deref();
        let mut model = convert::build_model_diagram(&source.model)
            .with_context(|| element_label("source", name))?;
        talos_solver::solve(&mut model, process, &solve_config)
            .with_context(|| element_label("source", name))?;
        match (source.node, &source.nodes) {
            (Some(node), None) => net.add_source(node, name, &model)?,
            (None, Some(nodes)) => net.add_sources(nodes, name, &model, source.dependent)?,
            _ => bail!("{}: set exactly one of node or nodes", element_label("source", name)),
        }
    }

    for component in &cfg.components {
        let name = component.name.as_deref();
        let mut model = convert::build_model_diagram(&component.model)
            .with_context(|| element_label("component", name))?;
        talos_solver::solve(&mut model, process, &solve_config)
            .with_context(|| element_label("component", name))?;
        match (component.edge, &component.edges, component.bidirectional) {
            (Some([from, to]), None, false) => {
                net.add_component(from, to, name, &model)?;
            }
            (Some([from, to]), None, true) => {
                net.add_bidirectional_component(from, to, name, &model)?;
            }
            (None, Some(edges), bidirectional) => {
                let pairs: Vec<(usize, usize)> = edges.iter().map(|&[f, t]| (f, t)).collect();
                if bidirectional {
                    net.add_bidirectional_components(&pairs, name, &model)?;
                } else {
                    net.add_components(&pairs, name, &model)?;
                }
            }
            _ => bail!(
                "{}: set exactly one of edge or edges",
                element_label("component", name)
            ),
        }
    }

    for user in &cfg.users {
        let capacity = user_capacity(user)?;
        let nodes = user_nodes(user)?;
        if nodes.len() == 1 {
            net.add_user(nodes[0], user.name.as_deref(), capacity);
        } else {
            net.add_users(&nodes, capacity);
        }
    }

    info!(
        sources = cfg.sources.len(),
        components = cfg.components.len(),
        users = cfg.users.len(),
        "scenario assembled"
    );
    net.solve(&network_config)?;
    Ok(net)
}

pub fn user_nodes(user: &UserToml) -> Result<Vec<usize>> {
    match (user.node, &user.nodes) {
        (Some(node), None) => Ok(vec![node]),
        (None, Some(nodes)) if !nodes.is_empty() => Ok(nodes.clone()),
        _ => bail!(
            "{}: set exactly one of node or nodes",
            element_label("user", user.name.as_deref())
        ),
    }
}

pub fn user_capacity(user: &UserToml) -> Result<Option<Quantity>> {
    user.capacity
        .map(|c| Ok(Quantity::new(c, convert::parse_unit(&user.capacity_unit)?)))
        .transpose()
}

fn element_label(kind: &str, name: Option<&str>) -> String {
    match name {
        Some(n) => format!("{kind} '{n}'"),
        None => kind.to_string(),
    }
}

fn print_user(net: &Network, node: usize) {
    let label = net
        .node_name(node)
        .map_or_else(|| format!("node {node}"), str::to_string);
    let Some(law) = net.user_ugf(node) else {
        println!("user {label}: no delivered performance");
        return;
    };
    let slice = law.n_slices() - 1;
    if law.n_slices() > 1 {
        println!("user {label} (final of {} time slices):", law.n_slices());
    } else {
        println!("user {label}:");
    }
    for (value, row) in law.values().iter().zip(law.probs()) {
        println!("  {:>12.4} {:<5} p = {:.6}", value, law.unit().to_string(), row[slice]);
    }
    println!("  mean delivered: {:.4} {}", law.mean(slice), law.unit());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_solves_end_to_end() {
        let cfg: ScenarioConfig = toml::from_str(
            r#"
            [[sources]]
            node = 0
            name = "feed"
            model = { performance = 1.0 }

            [[components]]
            edge = [0, 1]
            model = { performance = 1.0, failure_rate = 1.0, repair_rate = 10.0 }

            [[users]]
            node = 1
            name = "plant"
            "#,
        )
        .unwrap();
        let net = build_and_solve(&cfg).unwrap();
        let law = net.user_ugf(1).unwrap();
        assert_eq!(law.values(), &[0.0, 1.0]);
        assert!((law.prob(1).unwrap()[0] - 10.0 / 11.0).abs() < 1e-9);
        assert!((law.prob(0).unwrap()[0] - 1.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn ambiguous_node_spec_is_rejected() {
        let cfg: ScenarioConfig = toml::from_str(
            r#"
            [[sources]]
            node = 0
            nodes = [0, 1]
            model = { performance = 1.0 }
            "#,
        )
        .unwrap();
        let err = build_and_solve(&cfg).unwrap_err();
        assert!(err.to_string().contains("exactly one of node or nodes"));
    }
}
