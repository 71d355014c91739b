// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::{Edge, Graph, NodeId, RouteError, Weight};

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: NodeId,
    cost: f64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // NOTE: We revert the order of comparison,
        // as lower costs are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        // Ties are broken by node id, for deterministic results.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.at.cmp(&self.at))
    }
}

fn reconstruct_path(came_from: &HashMap<NodeId, NodeId>, mut last: NodeId) -> Vec<NodeId> {
    let mut path = vec![last];

    while let Some(&nd) = came_from.get(&last) {
        path.push(nd);
        last = nd;
    }

    path.reverse();
    path
}

/// Uses [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
/// to find the path between two nodes minimizing the total of the selected [Weight].
///
/// Connectivity is checked with [Graph::has_path] before the search starts,
/// and unreachable targets result in [RouteError::NoPathExists].
/// If `from_id == to_id`, the result is a single-node path.
pub fn shortest_path(
    g: &Graph,
    from_id: NodeId,
    to_id: NodeId,
    weight: Weight,
) -> Result<Vec<NodeId>, RouteError> {
    if g.node(from_id).is_none() || g.node(to_id).is_none() {
        return Err(RouteError::NodeNotFound);
    }
    if from_id == to_id {
        return Ok(vec![from_id]);
    }
    if !g.has_path(from_id, to_id) {
        return Err(RouteError::NoPathExists {
            from: from_id,
            to: to_id,
        });
    }

    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::default();
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::default();
    let mut known_costs: HashMap<NodeId, f64> = HashMap::default();

    queue.push(QueueItem {
        at: from_id,
        cost: 0.0,
    });
    known_costs.insert(from_id, 0.0);

    while let Some(item) = queue.pop() {
        if item.at == to_id {
            let path = reconstruct_path(&came_from, to_id);
            log::debug!(
                "found {} path {} -> {}: {} nodes, total {}",
                weight,
                from_id,
                to_id,
                path.len(),
                item.cost
            );
            return Ok(path);
        }

        // We might keep multiple items in the queue for the same node.
        if item.cost > known_costs.get(&item.at).copied().unwrap_or(f64::INFINITY) {
            continue;
        }

        for &Edge {
            to: neighbor_id,
            weights,
        } in g.neighbors(item.at)
        {
            // Check if this is the cheapest way to the neighbor
            let neighbor_cost = item.cost + weights.get(weight);
            if neighbor_cost
                >= known_costs
                    .get(&neighbor_id)
                    .copied()
                    .unwrap_or(f64::INFINITY)
            {
                continue;
            }

            came_from.insert(neighbor_id, item.at);
            known_costs.insert(neighbor_id, neighbor_cost);
            queue.push(QueueItem {
                at: neighbor_id,
                cost: neighbor_cost,
            });
        }
    }

    // Unreachable after a successful has_path check.
    Err(RouteError::NoPathExists {
        from: from_id,
        to: to_id,
    })
}

/// Computes the total of the selected [Weight] along a path.
/// Returns `None` if two consecutive nodes of the path are not connected by an edge.
pub fn path_cost(g: &Graph, path: &[NodeId], weight: Weight) -> Option<f64> {
    path.windows(2)
        .map(|pair| {
            let cost = g.edge_weight(pair[0], pair[1], weight);
            cost.is_finite().then_some(cost)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphBuilder, TransverseMercator, Weights};
    use std::collections::HashSet;

    const X0: f64 = 180_000.0;
    const Y0: f64 = 2_500_000.0;

    fn build(points: &[(f64, f64)], edges: &[(NodeId, NodeId, f64, f64)]) -> Graph {
        let mut b = GraphBuilder::new();
        for &(x, y) in points {
            b.add_node(X0 + x, Y0 + y).unwrap();
        }
        for &(a, c, length, pm25_expo) in edges {
            b.add_edge(a, c, Weights { length, pm25_expo }).unwrap();
        }
        b.build(&TransverseMercator::TWD97_TM2).unwrap()
    }

    fn square() -> Graph {
        // 3 ── 2
        // │    │
        // 0 ── 1
        build(
            &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)],
            &[
                (0, 1, 100.0, 1.0),
                (1, 2, 100.0, 1.0),
                (2, 3, 100.0, 10.0),
                (3, 0, 100.0, 10.0),
            ],
        )
    }

    /// Enumerates all simple paths between two nodes, returning the minimal cost.
    fn brute_force_cost(g: &Graph, from: NodeId, to: NodeId, weight: Weight) -> f64 {
        fn visit(
            g: &Graph,
            at: NodeId,
            to: NodeId,
            weight: Weight,
            cost: f64,
            visited: &mut Vec<bool>,
            best: &mut f64,
        ) {
            if at == to {
                *best = best.min(cost);
                return;
            }
            for e in g.neighbors(at) {
                if !visited[e.to] {
                    visited[e.to] = true;
                    visit(g, e.to, to, weight, cost + e.weights.get(weight), visited, best);
                    visited[e.to] = false;
                }
            }
        }

        let mut visited = vec![false; g.len()];
        visited[from] = true;
        let mut best = f64::INFINITY;
        visit(g, from, to, weight, 0.0, &mut visited, &mut best);
        best
    }

    fn assert_valid_path(g: &Graph, path: &[NodeId]) {
        for pair in path.windows(2) {
            assert!(
                g.edge_weight(pair[0], pair[1], Weight::Length).is_finite(),
                "no edge {} - {}",
                pair[0],
                pair[1]
            );
        }
        let unique = path.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), path.len(), "path {:?} repeats nodes", path);
    }

    #[test]
    fn square_by_length() {
        let g = square();
        let path = shortest_path(&g, 0, 2, Weight::Length).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], 0);
        assert_eq!(path[2], 2);
        assert!(path[1] == 1 || path[1] == 3);
        assert_eq!(path_cost(&g, &path, Weight::Length), Some(200.0));
    }

    #[test]
    fn square_by_exposure() {
        let g = square();
        let path = shortest_path(&g, 0, 2, Weight::Pm25Expo).unwrap();
        assert_eq!(path, vec![0, 1, 2]);
        assert_eq!(path_cost(&g, &path, Weight::Pm25Expo), Some(2.0));
    }

    #[test]
    fn single_node_path() {
        let g = square();
        assert_eq!(shortest_path(&g, 3, 3, Weight::Length), Ok(vec![3]));
    }

    #[test]
    fn disconnected() {
        let g = build(
            &[(0.0, 0.0), (100.0, 0.0), (500.0, 0.0), (600.0, 0.0)],
            &[(0, 1, 100.0, 1.0), (2, 3, 100.0, 1.0)],
        );
        assert!(!g.has_path(0, 3));
        assert_eq!(
            shortest_path(&g, 0, 3, Weight::Length),
            Err(RouteError::NoPathExists { from: 0, to: 3 })
        );
    }

    #[test]
    fn invalid_reference() {
        let g = square();
        assert_eq!(
            shortest_path(&g, 0, 17, Weight::Length),
            Err(RouteError::NodeNotFound)
        );
    }

    #[test]
    fn optimal_against_enumeration() {
        //  0 ── 1 ── 2
        //  │ \  │    │
        //  3 ── 4 ── 5
        //       │    │
        //       6 ── 7
        let g = build(
            &[
                (0.0, 200.0),
                (100.0, 200.0),
                (200.0, 200.0),
                (0.0, 100.0),
                (100.0, 100.0),
                (200.0, 100.0),
                (100.0, 0.0),
                (200.0, 0.0),
            ],
            &[
                (0, 1, 100.0, 9.0),
                (1, 2, 100.0, 2.0),
                (0, 3, 100.0, 1.0),
                (0, 4, 141.0, 30.0),
                (1, 4, 100.0, 4.0),
                (2, 5, 100.0, 3.0),
                (3, 4, 100.0, 1.5),
                (4, 5, 100.0, 12.0),
                (4, 6, 100.0, 0.5),
                (5, 7, 100.0, 6.0),
                (6, 7, 100.0, 0.5),
            ],
        );

        for weight in Weight::ALL {
            for from in 0..g.len() {
                for to in 0..g.len() {
                    let path = shortest_path(&g, from, to, weight).unwrap();
                    assert_eq!(path.first(), Some(&from));
                    assert_eq!(path.last(), Some(&to));
                    assert_valid_path(&g, &path);

                    let cost = path_cost(&g, &path, weight).unwrap();
                    let expected = if from == to {
                        0.0
                    } else {
                        brute_force_cost(&g, from, to, weight)
                    };
                    assert!(
                        (cost - expected).abs() < 1e-9,
                        "{} {} -> {}: got {}, expected {}",
                        weight,
                        from,
                        to,
                        cost,
                        expected
                    );
                }
            }
        }
    }

    #[test]
    fn path_cost_of_disconnected_nodes() {
        let g = square();
        assert_eq!(path_cost(&g, &[0, 2], Weight::Length), None);
        assert_eq!(path_cost(&g, &[0], Weight::Length), Some(0.0));
    }
}
