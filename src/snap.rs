// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{Graph, KDTree, NodeId, RouteError, TransverseMercator};

/// Recommended number of nearest candidates examined by [Snapper::snap].
/// More than one candidate is needed to honor the `exclude` argument without re-querying.
pub const DEFAULT_CANDIDATES: usize = 5;

/// Result of snapping a geographic position to a [Graph] node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub node: NodeId,

    /// Distance between the query position and the node, in meters.
    pub distance: f64,
}

/// Snapper resolves arbitrary geographic positions to the nearest [Graph] nodes.
///
/// The [KDTree] must be built over [Graph::projected_points], so that tree indices
/// line up with [Graph::nodes_geographic].
#[derive(Debug, Clone, Copy)]
pub struct Snapper<'a> {
    graph: &'a Graph,
    index: &'a KDTree,
    projection: &'a TransverseMercator,
    candidates: usize,
}

impl<'a> Snapper<'a> {
    /// Creates a new Snapper. At least one candidate is always examined.
    pub fn new(
        graph: &'a Graph,
        index: &'a KDTree,
        projection: &'a TransverseMercator,
        candidates: usize,
    ) -> Self {
        Self {
            graph,
            index,
            projection,
            candidates: candidates.max(1),
        }
    }

    /// Finds the node closest to the provided position, other than `exclude`.
    ///
    /// If every one of the nearest candidates resolves to `exclude`,
    /// the nearest candidate is returned regardless.
    ///
    /// [RouteError::IndexExhausted] is only returned if the index yields no points at all.
    pub fn snap(&self, lat: f64, lon: f64, exclude: Option<NodeId>) -> Result<Snap, RouteError> {
        let (x, y) = self.projection.to_projected(lat, lon)?;

        let mut fallback: Option<Snap> = None;
        for (distance, index) in self.index.query_nearest(x, y, self.candidates) {
            let &(node_lat, node_lon) = self
                .graph
                .nodes_geographic()
                .get(index)
                .ok_or(RouteError::NodeNotFound)?;
            let node = self.graph.lookup_by_geographic(node_lat, node_lon)?;
            let snap = Snap { node, distance };

            if Some(node) != exclude {
                log::debug!(
                    "snapped ({}, {}) to node {} at {:.2} m",
                    lat,
                    lon,
                    node,
                    distance
                );
                return Ok(snap);
            }

            fallback.get_or_insert(snap);
        }

        match fallback {
            Some(snap) => {
                log::warn!(
                    "all {} candidates near ({}, {}) resolve to excluded node {}",
                    self.candidates,
                    lat,
                    lon,
                    snap.node
                );
                Ok(snap)
            }
            None => Err(RouteError::IndexExhausted),
        }
    }
}
