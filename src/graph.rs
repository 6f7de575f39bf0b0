//! Weighted graph with Dijkstra shortest paths
//!
//! Nodes are opaque values (table names in practice). Edge weights live in a
//! two-level [`Table`] that is mirrored for every edge, so `get_edge(a, b)`
//! and `get_edge(b, a)` agree. Traversal honours direction: an edge is
//! walked forwards always and backwards only when it is undirected.

use crate::collections::{OrderedMap, PriorityQueue, Table};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Weight given to edges declared without one
pub const DEFAULT_EDGE_WEIGHT: u32 = 10;

/// A logical edge as it was inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge<N> {
    pub from: N,
    pub to: N,
    pub weight: u32,
    pub directed: bool,
}

impl<N> Edge<N> {
    pub fn undirected(from: N, to: N, weight: u32) -> Self {
        Self {
            from,
            to,
            weight,
            directed: false,
        }
    }

    pub fn directed(from: N, to: N, weight: u32) -> Self {
        Self {
            from,
            to,
            weight,
            directed: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Graph<N> {
    nodes: OrderedMap<N, ()>,
    /// node1 → node2 → weight, mirrored
    weights: Table<N, N, u32>,
    /// from → to → directed, one entry per unordered pair
    edges: Table<N, N, bool>,
}

impl<N> Default for Graph<N> {
    fn default() -> Self {
        Self {
            nodes: OrderedMap::default(),
            weights: Table::default(),
            edges: Table::default(),
        }
    }
}

impl<N: Eq + Hash + Clone> Graph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: N) {
        if !self.nodes.contains_key(&node) {
            self.nodes.insert(node, ());
        }
    }

    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = N>) {
        for node in nodes {
            self.add_node(node);
        }
    }

    pub fn has_node(&self, node: &N) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.keys()
    }

    /// Insert or overwrite an undirected edge
    pub fn add_edge(&mut self, n1: N, n2: N, weight: u32) {
        self.insert_edge(Edge::undirected(n1, n2, weight));
    }

    /// Insert or overwrite an edge traversable only from `from` to `to`
    pub fn add_directed_edge(&mut self, from: N, to: N, weight: u32) {
        self.insert_edge(Edge::directed(from, to, weight));
    }

    pub fn insert_edge(&mut self, edge: Edge<N>) {
        let Edge {
            from,
            to,
            weight,
            directed,
        } = edge;

        self.add_node(from.clone());
        self.add_node(to.clone());

        // One logical edge per pair, whichever way round it was first added
        if from != to {
            self.edges.remove(&to, &from);
        }
        self.edges.set(from.clone(), to.clone(), directed);
        self.weights.set(from.clone(), to.clone(), weight);
        self.weights.set(to, from, weight);
    }

    /// Weight stored for the pair, in either direction
    pub fn get_edge(&self, n1: &N, n2: &N) -> Option<u32> {
        self.weights.get(n1, n2).copied()
    }

    pub fn remove_edge(&mut self, n1: &N, n2: &N) -> Option<u32> {
        self.edges.remove(n1, n2);
        self.edges.remove(n2, n1);
        self.weights.remove(n2, n1);
        self.weights.remove(n1, n2)
    }

    /// Remove `node` and every edge touching it. No-op for unknown nodes.
    pub fn remove_node(&mut self, node: &N) {
        if self.nodes.remove(node).is_none() {
            return;
        }

        if let Some(row) = self.weights.remove_row(node) {
            for other in row.keys() {
                self.weights.remove(other, node);
                self.edges.remove(other, node);
            }
        }
        self.edges.remove_row(node);
    }

    /// Logical edges in insertion order
    pub fn edges(&self) -> Vec<Edge<N>> {
        self.edges
            .iter()
            .filter_map(|(from, to, &directed)| {
                let weight = self.get_edge(from, to)?;
                Some(Edge {
                    from: from.clone(),
                    to: to.clone(),
                    weight,
                    directed,
                })
            })
            .collect()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.iter().count()
    }

    /// Nodes reachable from `node` over a single edge, in insertion order
    pub fn neighboring_nodes(&self, node: &N) -> Vec<N> {
        self.adjacent(node).map(|(other, _)| other.clone()).collect()
    }

    /// Minimum-cost path from `start` to `end`, both inclusive.
    ///
    /// `cost` maps a stored weight to a traversal cost; `None` makes the edge
    /// impassable. Returns an empty path when `end` cannot be reached or
    /// either endpoint is unknown. Among equal-cost paths the one settled
    /// first wins.
    pub fn get_path<F>(&self, start: &N, end: &N, cost: F) -> Vec<N>
    where
        F: Fn(u32) -> Option<u64>,
    {
        if !self.has_node(start) || !self.has_node(end) {
            return Vec::new();
        }
        if start == end {
            return vec![start.clone()];
        }

        let mut distances: HashMap<N, u64> = HashMap::new();
        let mut previous: HashMap<N, N> = HashMap::new();
        let mut settled: HashSet<N> = HashSet::new();
        let mut queue = PriorityQueue::new();

        distances.insert(start.clone(), 0);
        queue.insert(0u64, start.clone());

        while let Ok((distance, node)) = queue.extract_top() {
            if &node == end {
                break;
            }
            settled.insert(node.clone());

            for (neighbor, weight) in self.adjacent(&node) {
                if settled.contains(neighbor) {
                    continue;
                }
                let Some(step) = cost(weight) else {
                    continue;
                };
                let candidate = distance.saturating_add(step);
                if distances
                    .get(neighbor)
                    .map_or(true, |&known| candidate < known)
                {
                    distances.insert(neighbor.clone(), candidate);
                    previous.insert(neighbor.clone(), node.clone());
                    queue.upsert(candidate, neighbor.clone());
                }
            }
        }

        if !previous.contains_key(end) {
            return Vec::new();
        }

        let mut path = vec![end.clone()];
        let mut current = end;
        while let Some(prev) = previous.get(current) {
            path.push(prev.clone());
            current = prev;
        }
        path.reverse();
        path
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.weights.clear();
        self.edges.clear();
    }

    fn adjacent<'a>(&'a self, node: &'a N) -> impl Iterator<Item = (&'a N, u32)> + 'a {
        self.weights
            .row(node)
            .into_iter()
            .flat_map(|row| row.iter())
            .filter(move |(other, _)| self.traversable(node, other))
            .map(|(other, &weight)| (other, weight))
    }

    fn traversable(&self, from: &N, to: &N) -> bool {
        self.edges.contains(from, to)
            || self
                .edges
                .get(to, from)
                .is_some_and(|&directed| !directed)
    }
}

/// Cost function treating every stored weight as its own cost
pub fn weight_as_cost(weight: u32) -> Option<u64> {
    Some(u64::from(weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WORKED_EXAMPLE: [(&str, &str, u32); 14] = [
        ("a", "b", 4),
        ("a", "h", 8),
        ("b", "c", 8),
        ("b", "h", 11),
        ("c", "d", 7),
        ("c", "i", 2),
        ("c", "f", 4),
        ("d", "e", 9),
        ("d", "f", 14),
        ("e", "f", 10),
        ("f", "g", 2),
        ("g", "h", 1),
        ("g", "i", 6),
        ("h", "i", 7),
    ];

    fn worked_example_graph() -> Graph<&'static str> {
        let mut graph = Graph::new();
        for (from, to, weight) in WORKED_EXAMPLE {
            graph.add_directed_edge(from, to, weight);
        }
        graph
    }

    #[test]
    fn test_add_edge_creates_nodes_and_weight() {
        let mut graph = Graph::new();
        graph.add_edge("taxa", "projects", 100);

        assert_eq!(graph.get_edge(&"taxa", &"projects"), Some(100));
        assert_eq!(graph.get_edge(&"projects", &"taxa"), Some(100));
        assert!(graph.has_node(&"taxa"));
        assert!(graph.has_node(&"projects"));
        assert_eq!(graph.num_nodes(), 2);
    }

    #[test]
    fn test_add_edge_overwrites_weight() {
        let mut graph = Graph::new();
        graph.add_edge("a", "b", DEFAULT_EDGE_WEIGHT);
        graph.add_edge("b", "a", 3);

        assert_eq!(graph.get_edge(&"a", &"b"), Some(3));
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn test_add_nodes_deduplicates() {
        let mut graph: Graph<&str> = Graph::new();
        graph.add_nodes(["a", "b", "a", "c", "b"]);

        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.nodes().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_node_drops_incident_edges() {
        let mut graph = worked_example_graph();
        graph.remove_node(&"c");

        assert!(!graph.has_node(&"c"));
        for edge in graph.edges() {
            assert!(edge.from != "c" && edge.to != "c");
        }
        for node in ["b", "d", "i", "f"] {
            assert_eq!(graph.get_edge(&node, &"c"), None);
            assert!(!graph.neighboring_nodes(&node).contains(&"c"));
        }

        // Removing again is a no-op
        graph.remove_node(&"c");
        assert_eq!(graph.num_nodes(), 8);
    }

    #[test]
    fn test_get_edge_missing_is_none() {
        let graph = worked_example_graph();
        assert_eq!(graph.get_edge(&"a", &"e"), None);
        assert_eq!(graph.get_edge(&"zz", &"a"), None);
    }

    #[test]
    fn test_neighbors_follow_direction() {
        let graph = worked_example_graph();
        assert_eq!(graph.neighboring_nodes(&"b"), vec!["c", "h"]);
        assert!(graph.neighboring_nodes(&"i").is_empty());
        assert!(graph.neighboring_nodes(&"unknown").is_empty());
    }

    #[test]
    fn test_neighbors_of_undirected_edges_are_symmetric() {
        let mut graph = Graph::new();
        graph.add_edge("taxa", "taxa_x_partitions", 10);
        graph.add_edge("partitions", "taxa_x_partitions", 10);

        assert_eq!(
            graph.neighboring_nodes(&"taxa_x_partitions"),
            vec!["taxa", "partitions"]
        );
    }

    #[test]
    fn test_worked_example_paths() {
        let graph = worked_example_graph();

        assert_eq!(graph.get_path(&"a", &"c", weight_as_cost), vec!["a", "b", "c"]);
        assert_eq!(
            graph.get_path(&"b", &"g", weight_as_cost),
            vec!["b", "c", "f", "g"]
        );
    }

    #[test]
    fn test_undirected_path_may_go_backwards() {
        let mut graph = Graph::new();
        for (from, to, weight) in WORKED_EXAMPLE {
            graph.add_edge(from, to, weight);
        }

        assert_eq!(graph.get_path(&"b", &"g", weight_as_cost), vec!["b", "h", "g"]);
        assert_eq!(graph.get_path(&"i", &"a", weight_as_cost), vec!["i", "c", "b", "a"]);
    }

    #[test]
    fn test_path_to_self() {
        let graph = worked_example_graph();
        assert_eq!(graph.get_path(&"e", &"e", weight_as_cost), vec!["e"]);
    }

    #[test]
    fn test_disconnected_path_is_empty() {
        let mut graph = worked_example_graph();
        graph.add_node("island");

        assert!(graph.get_path(&"a", &"island", weight_as_cost).is_empty());
        assert!(graph.get_path(&"i", &"a", weight_as_cost).is_empty());
        assert!(graph.get_path(&"a", &"nowhere", weight_as_cost).is_empty());
    }

    #[test]
    fn test_impassable_edges_are_skipped() {
        let mut graph = Graph::new();
        graph.add_edge("taxa", "users", 0);
        graph.add_edge("users", "media_files", 0);
        graph.add_edge("taxa", "taxa_x_media", 10);
        graph.add_edge("taxa_x_media", "media_files", 10);

        let path = graph.get_path(&"taxa", &"media_files", |w| {
            (w > 0).then_some(u64::from(w))
        });
        assert_eq!(path, vec!["taxa", "taxa_x_media", "media_files"]);

        graph.remove_node(&"taxa_x_media");
        let path = graph.get_path(&"taxa", &"media_files", |w| {
            (w > 0).then_some(u64::from(w))
        });
        assert!(path.is_empty());
    }

    #[test]
    fn test_clear_resets_graph() {
        let mut graph = worked_example_graph();
        graph.clear();

        assert_eq!(graph.num_nodes(), 0);
        assert_eq!(graph.num_edges(), 0);
        assert_eq!(graph.get_edge(&"a", &"b"), None);
    }
}
