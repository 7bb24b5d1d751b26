//! The network arena and its fixed-point solver.

use std::collections::VecDeque;
use std::sync::Arc;

use talos_diagram::StateDiagram;
use talos_ugf::{Ugf, UgfError};
use talos_units::Quantity;
use tracing::{debug, info};

use crate::config::NetworkConfig;
use crate::error::NetworkError;

/// A source's extracted law plus its provenance group.
///
/// Every source carries a group id; sources sharing one model a single
/// physical feed attached at several nodes. Paths tracing back to the same
/// group merge once, never as independent redundancy — which also stops a
/// bidirectional edge from echoing a source's own law back into it.
#[derive(Debug, Clone)]
struct SourceLaw {
    law: Arc<Ugf>,
    group: usize,
}

#[derive(Debug, Clone, Default)]
struct Node {
    name: Option<String>,
    source: Option<SourceLaw>,
    is_user: bool,
    capacity: Option<Quantity>,
    result: Option<Ugf>,
}

/// A transmission element between two nodes, carrying its own performance
/// law. Parallel edges between the same pair are distinct records.
#[derive(Debug, Clone)]
struct Edge {
    from: usize,
    to: usize,
    law: Arc<Ugf>,
    bidirectional: bool,
}

/// A flow network over component performance laws.
///
/// Nodes live in an arena addressed by integer id; referencing an id that
/// does not exist yet grows the arena. Sources inject a law, components sit
/// on edges and limit what passes through them, users are the delivery points
/// whose combined law the solver computes.
///
/// Attaching any element takes a reference to a *solved* diagram and extracts
/// its law on the spot; the diagram itself stays with the caller.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    next_group: usize,
}

impl Network {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_group(&mut self) -> usize {
        self.next_group += 1;
        self.next_group - 1
    }

    fn ensure_node(&mut self, id: usize) -> &mut Node {
        if id >= self.nodes.len() {
            self.nodes.resize_with(id + 1, Node::default);
        }
        &mut self.nodes[id]
    }

    fn extract(model: &StateDiagram, element: &str) -> Result<Ugf, NetworkError> {
        match Ugf::from_diagram(model) {
            Ok(law) => Ok(law),
            Err(UgfError::NotSolved) => Err(NetworkError::UnsolvedModel {
                element: element.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Attaches an independent source at `node`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::UnsolvedModel`] if `model` carries no solution.
    pub fn add_source(
        &mut self,
        node: usize,
        name: Option<&str>,
        model: &StateDiagram,
    ) -> Result<(), NetworkError> {
        let element = name.map_or_else(|| format!("source at node {node}"), str::to_string);
        let law = Arc::new(Self::extract(model, &element)?);
        let group = self.fresh_group();
        let entry = self.ensure_node(node);
        entry.source = Some(SourceLaw { law, group });
        if let Some(n) = name {
            entry.name = Some(n.to_string());
        }
        Ok(())
    }

    /// Attaches one law as a source at several nodes.
    ///
    /// With `dependent = true` the nodes share a single physical feed: the
    /// solver counts the shared law once wherever paths from these nodes
    /// reconverge. With `dependent = false` each node gets an independent
    /// instance of the same law.
    pub fn add_sources(
        &mut self,
        nodes: &[usize],
        name: Option<&str>,
        model: &StateDiagram,
        dependent: bool,
    ) -> Result<(), NetworkError> {
        let element = name.map_or_else(|| "source group".to_string(), str::to_string);
        let law = Arc::new(Self::extract(model, &element)?);
        let shared = dependent.then(|| self.fresh_group());
        for &node in nodes {
            let group = shared.unwrap_or_else(|| self.fresh_group());
            let entry = self.ensure_node(node);
            entry.source = Some(SourceLaw {
                law: Arc::clone(&law),
                group,
            });
            if let Some(n) = name {
                entry.name = Some(n.to_string());
            }
        }
        Ok(())
    }

    /// Marks `node` as a delivery point, optionally capping what it can
    /// accept.
    pub fn add_user(&mut self, node: usize, name: Option<&str>, capacity: Option<Quantity>) {
        let entry = self.ensure_node(node);
        entry.is_user = true;
        entry.capacity = capacity;
        if let Some(n) = name {
            entry.name = Some(n.to_string());
        }
    }

    /// Marks several nodes as delivery points sharing one capacity cap.
    pub fn add_users(&mut self, nodes: &[usize], capacity: Option<Quantity>) {
        for &node in nodes {
            self.add_user(node, None, capacity);
        }
    }

    /// Attaches a component on the directed edge `from → to` and returns the
    /// edge id.
    ///
    /// # Errors
    ///
    /// [`NetworkError::UnsolvedModel`] if `model` carries no solution.
    pub fn add_component(
        &mut self,
        from: usize,
        to: usize,
        name: Option<&str>,
        model: &StateDiagram,
    ) -> Result<usize, NetworkError> {
        self.attach_edge(from, to, name, model, false)
    }

    /// Attaches one component law on several directed edges.
    pub fn add_components(
        &mut self,
        edges: &[(usize, usize)],
        name: Option<&str>,
        model: &StateDiagram,
    ) -> Result<(), NetworkError> {
        for &(from, to) in edges {
            self.attach_edge(from, to, name, model, false)?;
        }
        Ok(())
    }

    /// Attaches a component usable in both orientations and returns the edge
    /// id.
    pub fn add_bidirectional_component(
        &mut self,
        from: usize,
        to: usize,
        name: Option<&str>,
        model: &StateDiagram,
    ) -> Result<usize, NetworkError> {
        self.attach_edge(from, to, name, model, true)
    }

    /// Attaches one component law on several bidirectional edges.
    pub fn add_bidirectional_components(
        &mut self,
        edges: &[(usize, usize)],
        name: Option<&str>,
        model: &StateDiagram,
    ) -> Result<(), NetworkError> {
        for &(from, to) in edges {
            self.attach_edge(from, to, name, model, true)?;
        }
        Ok(())
    }

    fn attach_edge(
        &mut self,
        from: usize,
        to: usize,
        name: Option<&str>,
        model: &StateDiagram,
        bidirectional: bool,
    ) -> Result<usize, NetworkError> {
        let element =
            name.map_or_else(|| format!("component on edge {from} \u{2192} {to}"), str::to_string);
        let law = Arc::new(Self::extract(model, &element)?);
        self.ensure_node(from.max(to));
        self.edges.push(Edge {
            from,
            to,
            law,
            bidirectional,
        });
        Ok(self.edges.len() - 1)
    }

    /// Number of nodes in the arena.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edge records.
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// The name attached to a node, if any.
    pub fn node_name(&self, node: usize) -> Option<&str> {
        self.nodes.get(node).and_then(|n| n.name.as_deref())
    }

    /// True if a source is attached at `node`.
    pub fn is_source(&self, node: usize) -> bool {
        self.nodes.get(node).is_some_and(|n| n.source.is_some())
    }

    /// True if `node` is a delivery point.
    pub fn is_user(&self, node: usize) -> bool {
        self.nodes.get(node).is_some_and(|n| n.is_user)
    }

    /// Ids of all delivery points, ascending.
    pub fn user_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_user)
            .map(|(i, _)| i)
    }

    /// The delivered-performance law computed for a user node, if solving
    /// has produced one.
    pub fn user_ugf(&self, node: usize) -> Option<&Ugf> {
        self.nodes.get(node).and_then(|n| n.result.as_ref())
    }

    /// Every user must be reachable from some source (an edge is traversable
    /// forward, plus backward when bidirectional).
    fn check_reachable(&self) -> Result<(), NetworkError> {
        let mut reached: Vec<bool> = self.nodes.iter().map(|n| n.source.is_some()).collect();
        let mut queue: VecDeque<usize> = reached
            .iter()
            .enumerate()
            .filter(|(_, &r)| r)
            .map(|(i, _)| i)
            .collect();
        while let Some(v) = queue.pop_front() {
            for edge in &self.edges {
                let next = if edge.from == v {
                    Some(edge.to)
                } else if edge.bidirectional && edge.to == v {
                    Some(edge.from)
                } else {
                    None
                };
                if let Some(w) = next {
                    if !reached[w] {
                        reached[w] = true;
                        queue.push_back(w);
                    }
                }
            }
        }
        match self.user_nodes().find(|&i| !reached[i]) {
            Some(node) => Err(NetworkError::Unreachable { node }),
            None => Ok(()),
        }
    }

    /// Recomputes one node's law from the current slot values.
    ///
    /// Contributions are the node's own source law plus, for every usable
    /// incoming edge, the predecessor's law pushed through the edge law in
    /// series. Contributions tracing back to the same provenance group count
    /// once. A user node's capacity cap applies to the merge.
    fn recompute(
        &self,
        node: usize,
        slots: &[Option<(Option<usize>, Ugf)>],
    ) -> Result<Option<(Option<usize>, Ugf)>, NetworkError> {
        let mut contributions: Vec<(Option<usize>, Ugf)> = Vec::new();
        if let Some(src) = &self.nodes[node].source {
            contributions.push((Some(src.group), (*src.law).clone()));
        }
        for edge in &self.edges {
            let pred = if edge.to == node {
                edge.from
            } else if edge.bidirectional && edge.from == node {
                edge.to
            } else {
                continue;
            };
            if pred == node {
                continue;
            }
            if let Some((origin, law)) = &slots[pred] {
                contributions.push((*origin, law.series(&edge.law)?));
            }
        }

        let cap = if self.nodes[node].is_user {
            self.nodes[node].capacity
        } else {
            None
        };
        let mut seen_groups: Vec<usize> = Vec::new();
        let mut merged: Option<(Option<usize>, Ugf)> = None;
        for (origin, law) in contributions {
            if let Some(group) = origin {
                if seen_groups.contains(&group) {
                    continue;
                }
                seen_groups.push(group);
            }
            merged = Some(match merged {
                None => (origin, law),
                Some((acc_origin, acc)) => {
                    let combined = match cap {
                        Some(c) => acc.parallel_capped(&law, c)?,
                        None => acc.parallel(&law)?,
                    };
                    let tag = if acc_origin == origin { origin } else { None };
                    (tag, combined)
                }
            });
        }
        Ok(merged)
    }

    /// Runs the fixed-point sweep until every user's law stops moving.
    ///
    /// Each sweep recomputes every node in id order from the freshest slot
    /// values; a tree wired in flow order therefore fills on the first sweep
    /// and confirms (zero residual) on the second. On a blown sweep budget
    /// the last iterate is still stored on the user nodes before
    /// [`NetworkError::NonConvergent`] is returned.
    ///
    /// # Errors
    ///
    /// [`NetworkError::Unreachable`] for a user no source can feed, checked
    /// up front; [`NetworkError::NonConvergent`] when the residual never
    /// drops below the tolerance; u-function errors from incompatible laws.
    #[tracing::instrument(skip(self, config), fields(nodes = self.nodes.len(), edges = self.edges.len()))]
    pub fn solve(&mut self, config: &NetworkConfig) -> Result<(), NetworkError> {
        config.validate()?;
        self.check_reachable()?;

        let n = self.nodes.len();
        let mut slots: Vec<Option<(Option<usize>, Ugf)>> = vec![None; n];
        let mut residual = f64::INFINITY;
        let mut sweeps = 0;
        while sweeps < config.max_iterations() {
            sweeps += 1;
            residual = 0.0;
            for node in 0..n {
                let fresh = self.recompute(node, &slots)?;
                if self.nodes[node].is_user {
                    let delta = match (&slots[node], &fresh) {
                        (Some((_, old)), Some((_, new))) => new.max_abs_diff(old),
                        _ => f64::INFINITY,
                    };
                    residual = residual.max(delta);
                }
                slots[node] = fresh;
            }
            debug!(sweep = sweeps, residual, "network sweep");
            if residual <= config.tolerance() {
                break;
            }
        }

        for (node, slot) in slots.into_iter().enumerate() {
            if self.nodes[node].is_user {
                self.nodes[node].result = slot.map(|(_, law)| law);
            }
        }
        if residual > config.tolerance() {
            return Err(NetworkError::NonConvergent {
                iterations: sweeps,
                residual,
            });
        }
        info!(sweeps, users = self.user_nodes().count(), "network solved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use talos_units::Unit;

    /// Steady-state law as a pre-solved diagram.
    fn solved(unit: Unit, pairs: &[(f64, f64)]) -> StateDiagram {
        let perf = pairs
            .iter()
            .map(|&(v, _)| Quantity::new(v, unit))
            .collect();
        let probs = pairs.iter().map(|&(_, p)| vec![p]).collect();
        StateDiagram::from_solution(perf, Vec::new(), probs).unwrap()
    }

    fn perfect_unit() -> StateDiagram {
        solved(Unit::One, &[(1.0, 1.0)])
    }

    #[test]
    fn arena_grows_to_referenced_ids() {
        let mut net = Network::new();
        net.add_user(7, Some("plant"), None);
        assert_eq!(net.n_nodes(), 8);
        assert!(net.is_user(7));
        assert_eq!(net.node_name(7), Some("plant"));
        assert!(!net.is_source(7));
    }

    #[test]
    fn unsolved_model_is_rejected_with_its_name() {
        let mut net = Network::new();
        let mut raw = StateDiagram::new();
        raw.add_states([talos_diagram::State::new(Quantity::dimensionless(1.0), 1.0)])
            .unwrap();
        let err = net.add_source(0, Some("grid feed"), &raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot attach grid feed: its diagram has not been solved"
        );
        assert!(matches!(err, NetworkError::UnsolvedModel { .. }));
    }

    #[test]
    fn chain_delivers_source_through_component() {
        let mut net = Network::new();
        net.add_source(0, None, &solved(Unit::One, &[(1.0, 0.9), (0.0, 0.1)]))
            .unwrap();
        net.add_component(0, 1, None, &solved(Unit::One, &[(1.0, 0.95), (0.0, 0.05)]))
            .unwrap();
        net.add_user(1, None, None);
        net.solve(&NetworkConfig::new()).unwrap();
        let law = net.user_ugf(1).unwrap();
        assert_eq!(law.values(), &[0.0, 1.0]);
        assert_relative_eq!(law.prob(1).unwrap()[0], 0.9 * 0.95, epsilon = 1e-12);
        assert_relative_eq!(law.mass(0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn tree_converges_on_the_second_sweep() {
        let mut net = Network::new();
        net.add_source(0, None, &solved(Unit::One, &[(1.0, 0.9), (0.0, 0.1)]))
            .unwrap();
        net.add_component(0, 1, None, &perfect_unit()).unwrap();
        net.add_component(1, 2, None, &perfect_unit()).unwrap();
        net.add_user(2, None, None);
        // A budget of exactly 2 must suffice for a tree in flow order.
        net.solve(&NetworkConfig::new().with_max_iterations(2))
            .unwrap();
        assert!(net.user_ugf(2).is_some());
    }

    #[test]
    fn unreachable_user_is_detected_before_solving() {
        let mut net = Network::new();
        net.add_source(0, None, &perfect_unit()).unwrap();
        net.add_component(0, 1, None, &perfect_unit()).unwrap();
        net.add_user(3, None, None);
        let err = net.solve(&NetworkConfig::new()).unwrap_err();
        assert!(matches!(err, NetworkError::Unreachable { node: 3 }));
    }

    #[test]
    fn directed_edge_does_not_feed_backwards() {
        let mut net = Network::new();
        net.add_source(1, None, &perfect_unit()).unwrap();
        net.add_component(0, 1, None, &perfect_unit()).unwrap();
        net.add_user(0, None, None);
        assert!(matches!(
            net.solve(&NetworkConfig::new()),
            Err(NetworkError::Unreachable { node: 0 })
        ));
    }

    #[test]
    fn bidirectional_edge_feeds_both_ways() {
        let mut net = Network::new();
        net.add_source(1, None, &solved(Unit::One, &[(1.0, 0.9), (0.0, 0.1)]))
            .unwrap();
        net.add_bidirectional_component(0, 1, None, &perfect_unit())
            .unwrap();
        net.add_user(0, None, None);
        net.solve(&NetworkConfig::new()).unwrap();
        let law = net.user_ugf(0).unwrap();
        assert_relative_eq!(law.prob(1).unwrap()[0], 0.9, epsilon = 1e-9);
        assert_relative_eq!(law.mass(0), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn bidirectional_echo_does_not_duplicate_a_source() {
        // The source's own law crosses the edge, lands on the neighbour and
        // flows back on the next sweep; provenance must stop it from being
        // merged with itself as fictitious redundancy.
        let mut net = Network::new();
        net.add_source(0, None, &solved(Unit::One, &[(1.0, 0.9), (0.0, 0.1)]))
            .unwrap();
        net.add_bidirectional_component(0, 1, None, &perfect_unit())
            .unwrap();
        net.add_user(0, None, None);
        net.add_user(1, None, None);
        net.solve(&NetworkConfig::new()).unwrap();
        for node in [0, 1] {
            let law = net.user_ugf(node).unwrap();
            assert_relative_eq!(law.prob(1).unwrap()[0], 0.9, epsilon = 1e-9);
            assert_relative_eq!(law.prob(0).unwrap()[0], 0.1, epsilon = 1e-9);
        }
    }

    #[test]
    fn independent_sources_compound_as_redundancy() {
        let src = solved(Unit::One, &[(1.0, 0.95), (0.0, 0.05)]);
        let mut net = Network::new();
        net.add_sources(&[0, 1], None, &src, false).unwrap();
        net.add_component(0, 2, None, &perfect_unit()).unwrap();
        net.add_component(1, 2, None, &perfect_unit()).unwrap();
        net.add_user(2, None, Some(Quantity::dimensionless(1.0)));
        net.solve(&NetworkConfig::new()).unwrap();
        let law = net.user_ugf(2).unwrap();
        assert_eq!(law.values(), &[0.0, 1.0]);
        assert_relative_eq!(law.prob(0).unwrap()[0], 0.0025, epsilon = 1e-12);
        assert_relative_eq!(law.prob(1).unwrap()[0], 0.9975, epsilon = 1e-12);
    }

    #[test]
    fn dependent_sources_count_once_at_reconvergence() {
        let src = solved(Unit::One, &[(1.0, 0.95), (0.0, 0.05)]);
        let mut net = Network::new();
        net.add_sources(&[0, 1], Some("shared feed"), &src, true).unwrap();
        net.add_component(0, 2, None, &perfect_unit()).unwrap();
        net.add_component(1, 2, None, &perfect_unit()).unwrap();
        net.add_user(2, None, None);
        net.solve(&NetworkConfig::new()).unwrap();
        let law = net.user_ugf(2).unwrap();
        // One physical feed: no fictitious redundancy, unavailability stays 5%.
        assert_eq!(law.values(), &[0.0, 1.0]);
        assert_relative_eq!(law.prob(0).unwrap()[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(law.prob(1).unwrap()[0], 0.95, epsilon = 1e-12);
    }

    #[test]
    fn blown_sweep_budget_keeps_the_last_iterate() {
        // Two independent sources on a bidirectional loop: each sweep merges
        // the neighbour's already-merged law back in, so the user's law keeps
        // shifting mass to ever higher values and the sweep never settles.
        let mut net = Network::new();
        net.add_sources(
            &[0, 1],
            None,
            &solved(Unit::One, &[(1.0, 0.9), (0.0, 0.1)]),
            false,
        )
        .unwrap();
        net.add_bidirectional_component(0, 1, None, &perfect_unit())
            .unwrap();
        net.add_user(1, None, None);
        let err = net
            .solve(&NetworkConfig::new().with_max_iterations(5))
            .unwrap_err();
        match err {
            NetworkError::NonConvergent { iterations, residual } => {
                assert_eq!(iterations, 5);
                assert!(residual > 1e-9);
            }
            other => panic!("unexpected error: {other}"),
        }
        // The last iterate is still inspectable.
        let law = net.user_ugf(1).unwrap();
        assert_relative_eq!(law.mass(0), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn user_that_is_its_own_source_solves() {
        let mut net = Network::new();
        net.add_source(0, None, &solved(Unit::One, &[(1.0, 0.8), (0.0, 0.2)]))
            .unwrap();
        net.add_user(0, None, None);
        net.solve(&NetworkConfig::new()).unwrap();
        let law = net.user_ugf(0).unwrap();
        assert_relative_eq!(law.prob(1).unwrap()[0], 0.8);
    }
}
