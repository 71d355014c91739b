// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::NodeId;

/// Error conditions which may occur while answering a single routing request,
/// or while building the request-serving structures.
///
/// None of these are fatal once a [Graph](crate::Graph) has been loaded; every
/// request can be retried by the caller with identical inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// The requested weight is not one of the declared edge attributes.
    #[error("invalid weight: {0:?} (expected \"length\" or \"PM25_expo\")")]
    InvalidWeight(String),

    /// A coordinate is not finite or lies outside of the projection's domain.
    #[error("invalid coordinate: ({0}, {1})")]
    InvalidCoordinate(f64, f64),

    /// A [KDTree](crate::KDTree) was requested over zero points.
    #[error("cannot build a spatial index over zero points")]
    EmptyIndex,

    /// The spatial index produced no candidates for a query.
    #[error("spatial index has no candidates")]
    IndexExhausted,

    /// No node matches the requested id or coordinate.
    #[error("node not found")]
    NodeNotFound,

    /// The start and end nodes lie in disconnected components of the graph.
    #[error("no path exists between nodes {from} and {to}")]
    NoPathExists { from: NodeId, to: NodeId },
}
