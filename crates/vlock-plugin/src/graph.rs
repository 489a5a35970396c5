//! Directed graph primitives and topological sorting.
//!
//! Nothing in here knows about plugins. Nodes are any hashable value and
//! edges are ordered `(predecessor, successor)` pairs.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

/// A precedence constraint: `predecessor` must be ordered before `successor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge<T> {
    /// The node that comes first.
    pub predecessor: T,
    /// The node that comes after.
    pub successor: T,
}

impl<T> Edge<T> {
    /// Creates an edge from `predecessor` to `successor`.
    pub fn new(predecessor: T, successor: T) -> Self {
        Self {
            predecessor,
            successor,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Edge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}'\tmust come before\t'{}'",
            self.predecessor, self.successor
        )
    }
}

/// Sorts `nodes` so that every edge points forward (Kahn's algorithm).
///
/// The result is deterministic: nodes without pending predecessors are
/// emitted in the order they appear in `nodes`, and a node released by
/// removing an edge queues behind those already waiting.
///
/// On failure the edges that could not be removed are returned. They
/// always include every edge of every cycle, plus any edge whose
/// predecessor is not one of `nodes` or is only reachable through a cycle.
pub fn tsort<T>(nodes: &[T], edges: &[Edge<T>]) -> Result<Vec<T>, Vec<Edge<T>>>
where
    T: Clone + Eq + Hash,
{
    let known: HashSet<&T> = nodes.iter().collect();

    let mut in_degree: HashMap<&T, usize> = HashMap::new();
    for edge in edges {
        *in_degree.entry(&edge.successor).or_insert(0) += 1;
    }

    let mut queue: VecDeque<&T> = nodes
        .iter()
        .filter(|node| !in_degree.contains_key(node))
        .collect();

    let mut remaining: Vec<Option<&Edge<T>>> = edges.iter().map(Some).collect();
    let mut sorted = Vec::with_capacity(nodes.len());

    while let Some(node) = queue.pop_front() {
        sorted.push(node.clone());

        for slot in remaining.iter_mut() {
            let Some(edge) = *slot else { continue };
            if edge.predecessor != *node {
                continue;
            }
            *slot = None;

            if let Some(count) = in_degree.get_mut(&edge.successor) {
                *count -= 1;
                if *count == 0 && known.contains(&edge.successor) {
                    queue.push_back(&edge.successor);
                }
            }
        }
    }

    let residual: Vec<Edge<T>> = remaining.into_iter().flatten().cloned().collect();

    if residual.is_empty() {
        Ok(sorted)
    } else {
        Err(residual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: &'static str, b: &'static str) -> Edge<&'static str> {
        Edge::new(a, b)
    }

    fn position(sorted: &[&str], node: &str) -> usize {
        sorted
            .iter()
            .position(|n| *n == node)
            .expect("node present in sort output")
    }

    #[test]
    fn empty_graph_sorts_to_nothing() {
        let sorted = tsort::<&str>(&[], &[]).expect("sort");
        assert!(sorted.is_empty());
    }

    #[test]
    fn unconstrained_nodes_keep_input_order() {
        let sorted = tsort(&["c", "a", "b"], &[]).expect("sort");
        assert_eq!(sorted, vec!["c", "a", "b"]);
    }

    #[test]
    fn every_edge_is_respected() {
        let nodes = ["e", "d", "c", "b", "a"];
        let edges = [
            edge("a", "b"),
            edge("b", "c"),
            edge("a", "d"),
            edge("d", "c"),
            edge("c", "e"),
        ];

        let sorted = tsort(&nodes, &edges).expect("sort");

        assert_eq!(sorted.len(), nodes.len());
        for node in nodes {
            assert_eq!(sorted.iter().filter(|n| **n == node).count(), 1);
        }
        for e in &edges {
            assert!(position(&sorted, e.predecessor) < position(&sorted, e.successor));
        }
    }

    #[test]
    fn duplicate_edges_are_harmless() {
        let sorted = tsort(&["b", "a"], &[edge("a", "b"), edge("a", "b")]).expect("sort");
        assert_eq!(sorted, vec!["a", "b"]);
    }

    #[test]
    fn released_nodes_queue_behind_waiting_roots() {
        // "x" becomes free only after "a" is emitted; "z" was free from the start.
        let sorted = tsort(&["a", "x", "z"], &[edge("a", "x")]).expect("sort");
        assert_eq!(sorted, vec!["a", "z", "x"]);
    }

    #[test]
    fn cycle_reports_its_edges() {
        let nodes = ["a", "b", "c", "d"];
        let edges = [
            edge("d", "a"),
            edge("a", "b"),
            edge("b", "c"),
            edge("c", "a"),
        ];

        let residual = tsort(&nodes, &edges).expect_err("cycle must fail");

        assert!(residual.contains(&edge("a", "b")));
        assert!(residual.contains(&edge("b", "c")));
        assert!(residual.contains(&edge("c", "a")));
        assert!(!residual.contains(&edge("d", "a")));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let residual = tsort(&["a"], &[edge("a", "a")]).expect_err("self loop");
        assert_eq!(residual, vec![edge("a", "a")]);
    }

    #[test]
    fn edge_from_unknown_node_is_left_over() {
        let residual = tsort(&["b"], &[edge("ghost", "b")]).expect_err("dangling edge");
        assert_eq!(residual, vec![edge("ghost", "b")]);
    }

    #[test]
    fn edges_render_as_ordering_constraints() {
        assert_eq!(
            edge("a", "b").to_string(),
            "'a'\tmust come before\t'b'"
        );
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        /// Nodes `0..n` and edges that all agree with one random order of them.
        fn acyclic_graph() -> impl Strategy<Value = (Vec<u32>, Vec<Edge<u32>>)> {
            (1u32..12)
                .prop_flat_map(|n| {
                    (
                        Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
                        prop::collection::vec((0..n, 0..n), 0..2 * n as usize),
                    )
                })
                .prop_map(|(order, pairs)| {
                    let edges = pairs
                        .into_iter()
                        .filter(|(a, b)| a != b)
                        .map(|(a, b)| Edge::new(order[a.min(b) as usize], order[a.max(b) as usize]))
                        .collect();
                    let mut nodes = order;
                    nodes.sort_unstable();
                    (nodes, edges)
                })
        }

        /// An acyclic graph with one extra cycle through some of its nodes.
        /// The cycle's edges are returned separately.
        fn cyclic_graph() -> impl Strategy<Value = (Vec<u32>, Vec<Edge<u32>>, Vec<Edge<u32>>)> {
            acyclic_graph()
                .prop_flat_map(|(nodes, edges)| {
                    let members = prop::sample::subsequence(nodes.clone(), 1..=nodes.len());
                    (Just(nodes), Just(edges), members.prop_shuffle())
                })
                .prop_map(|(nodes, mut edges, members)| {
                    let cycle: Vec<_> = members
                        .iter()
                        .zip(members.iter().cycle().skip(1))
                        .map(|(a, b)| Edge::new(*a, *b))
                        .collect();
                    edges.extend(cycle.iter().cloned());
                    (nodes, edges, cycle)
                })
        }

        proptest! {
            #[test]
            fn acyclic_graphs_sort_every_node_once((nodes, edges) in acyclic_graph()) {
                let sorted = tsort(&nodes, &edges).expect("acyclic graph sorts");

                prop_assert_eq!(sorted.len(), nodes.len());
                for node in &nodes {
                    prop_assert_eq!(sorted.iter().filter(|n| *n == node).count(), 1);
                }
            }

            #[test]
            fn acyclic_graphs_point_every_edge_forward((nodes, edges) in acyclic_graph()) {
                let sorted = tsort(&nodes, &edges).expect("acyclic graph sorts");
                let position = |node: &u32| sorted.iter().position(|n| n == node);

                for edge in &edges {
                    prop_assert!(position(&edge.predecessor) < position(&edge.successor));
                }
            }

            #[test]
            fn cycles_always_fail_and_are_reported((nodes, edges, cycle) in cyclic_graph()) {
                let residual = tsort(&nodes, &edges).expect_err("cycle must fail");

                for edge in &cycle {
                    prop_assert!(residual.contains(edge), "missing {:?}", edge);
                }
            }
        }
    }
}
