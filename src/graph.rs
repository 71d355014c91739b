// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::hash_map::{Entry, HashMap};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::{Edge, Node, NodeId, RouteError, TransverseMercator};

/// Selects which edge attribute is minimized during route search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weight {
    /// Physical length of a road segment, in meters.
    Length,

    /// Cumulative PM2.5 exposure along a road segment.
    Pm25Expo,
}

impl Weight {
    /// All weight attributes declared on every [Edge].
    pub const ALL: [Weight; 2] = [Weight::Length, Weight::Pm25Expo];

    /// Returns the attribute name, as used in network files and requests.
    pub fn name(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Pm25Expo => "PM25_expo",
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weight {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.name() == s)
            .ok_or_else(|| RouteError::InvalidWeight(s.to_string()))
    }
}

/// Non-negative costs of traversing an [Edge], one per [Weight].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Weights {
    pub length: f64,
    pub pm25_expo: f64,
}

impl Weights {
    pub fn get(&self, weight: Weight) -> f64 {
        match weight {
            Weight::Length => self.length,
            Weight::Pm25Expo => self.pm25_expo,
        }
    }

    fn is_valid(&self) -> bool {
        Weight::ALL.into_iter().all(|w| {
            let v = self.get(w);
            v.is_finite() && v >= 0.0
        })
    }
}

/// Bit-exact key of a coordinate pair, usable in hash maps.
type CoordKey = (u64, u64);

fn coord_key(a: f64, b: f64) -> CoordKey {
    // Normalize negative zero, so that `-0.0` and `0.0` map to the same key
    ((a + 0.0).to_bits(), (b + 0.0).to_bits())
}

/// Represents a road network as a set of [Nodes](Node) and undirected,
/// doubly-weighted [Edges](Edge) between them.
///
/// A Graph can only be created through a [GraphBuilder], and is immutable afterwards.
/// Nodes are identified by their index in the graph, which is also the order
/// of [Graph::nodes_geographic] and [Graph::projected_points].
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Vec<Edge>>,
    geographic: Vec<(f64, f64)>,
    by_geographic: HashMap<CoordKey, NodeId>,
    by_projected: HashMap<CoordKey, NodeId>,
}

impl Graph {
    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of undirected edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Retrieves a [Node] with the provided id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Gets all [Edges](Edge) incident to a node with the given id.
    pub fn neighbors(&self, id: NodeId) -> &[Edge] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Gets the cost of traveling directly between two nodes under the given [Weight].
    /// If multiple edges connect the nodes, the cheapest one is used.
    /// If no such edge exists, returns [f64::INFINITY].
    pub fn edge_weight(&self, from: NodeId, to: NodeId, weight: Weight) -> f64 {
        self.neighbors(from)
            .iter()
            .filter(|e| e.to == to)
            .map(|e| e.weights.get(weight))
            .fold(f64::INFINITY, f64::min)
    }

    /// Checks whether there exists a sequence of edges connecting `a` and `b`.
    /// Returns `false` if any of the nodes doesn't exist.
    pub fn has_path(&self, a: NodeId, b: NodeId) -> bool {
        if a >= self.len() || b >= self.len() {
            return false;
        }
        if a == b {
            return true;
        }

        let mut seen = vec![false; self.len()];
        let mut queue = VecDeque::from([a]);
        seen[a] = true;

        while let Some(at) = queue.pop_front() {
            for edge in self.neighbors(at) {
                if edge.to == b {
                    return true;
                }
                if !seen[edge.to] {
                    seen[edge.to] = true;
                    queue.push_back(edge.to);
                }
            }
        }

        false
    }

    /// Returns the geographic `(lat, lon)` positions of all nodes, in index order.
    pub fn nodes_geographic(&self) -> &[(f64, f64)] {
        &self.geographic
    }

    /// Returns the projected `(x, y)` positions of all nodes, in index order.
    pub fn projected_points(&self) -> Vec<(f64, f64)> {
        self.nodes.iter().map(|n| (n.x, n.y)).collect()
    }

    /// Finds the node whose cached geographic position is exactly `(lat, lon)`.
    ///
    /// If multiple nodes share a geographic position, the one with the lowest id is returned.
    pub fn lookup_by_geographic(&self, lat: f64, lon: f64) -> Result<NodeId, RouteError> {
        self.by_geographic
            .get(&coord_key(lat, lon))
            .copied()
            .ok_or(RouteError::NodeNotFound)
    }

    /// Finds the node with exactly the provided projected position.
    pub fn find_node(&self, x: f64, y: f64) -> Option<NodeId> {
        self.by_projected.get(&coord_key(x, y)).copied()
    }
}

/// Helper object for assembling a [Graph].
///
/// Nodes are identified by their projected position; adding the same position twice
/// yields the same node.
#[derive(Debug, Default, Clone)]
pub struct GraphBuilder {
    points: Vec<(f64, f64)>,
    edges: Vec<Vec<Edge>>,
    by_projected: HashMap<CoordKey, NodeId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes added so far.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if no nodes were added.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Adds a node at the given projected position, returning its id.
    /// If a node with the same position already exists, its id is returned instead.
    pub fn add_node(&mut self, x: f64, y: f64) -> Result<NodeId, RouteError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(RouteError::InvalidCoordinate(x, y));
        }

        match self.by_projected.entry(coord_key(x, y)) {
            Entry::Occupied(e) => Ok(*e.get()),
            Entry::Vacant(e) => {
                let id = self.points.len();
                e.insert(id);
                self.points.push((x, y));
                self.edges.push(Vec::default());
                Ok(id)
            }
        }
    }

    /// Adds an undirected edge between two existing nodes.
    ///
    /// Fails with [RouteError::NodeNotFound] if any of the nodes doesn't exist,
    /// or with [RouteError::InvalidWeight] if any of the weights is negative or not finite.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weights: Weights) -> Result<(), RouteError> {
        if a >= self.points.len() || b >= self.points.len() {
            return Err(RouteError::NodeNotFound);
        }
        if !weights.is_valid() {
            return Err(RouteError::InvalidWeight(format!(
                "{}={}, {}={}",
                Weight::Length,
                weights.length,
                Weight::Pm25Expo,
                weights.pm25_expo,
            )));
        }

        self.edges[a].push(Edge { to: b, weights });
        if a != b {
            self.edges[b].push(Edge { to: a, weights });
        }
        Ok(())
    }

    /// Finalizes the graph, computing the geographic position of every node
    /// with the provided projection.
    pub fn build(self, projection: &TransverseMercator) -> Result<Graph, RouteError> {
        let mut nodes = Vec::with_capacity(self.points.len());
        let mut geographic = Vec::with_capacity(self.points.len());
        let mut by_geographic = HashMap::with_capacity(self.points.len());

        for (id, &(x, y)) in self.points.iter().enumerate() {
            let (lat, lon) = projection.to_geographic(x, y)?;
            nodes.push(Node { x, y, lat, lon });
            geographic.push((lat, lon));
            by_geographic.entry(coord_key(lat, lon)).or_insert(id);
        }

        if by_geographic.len() < nodes.len() {
            log::warn!(
                "{} nodes share geographic positions with other nodes",
                nodes.len() - by_geographic.len(),
            );
        }

        Ok(Graph {
            nodes,
            edges: self.edges,
            geographic,
            by_geographic,
            by_projected: self.by_projected,
        })
    }
}
