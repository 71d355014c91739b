// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Health-oriented routing over a precomputed road network.
//!
//! Road segments carry two costs: their physical `length` and the cumulative
//! PM2.5 exposure (`PM25_expo`) of traveling along them. Routes can minimize either one.
//! Node positions live in a projected (planar) frame, by default
//! [TWD97 / TM2](TransverseMercator::TWD97_TM2); requests and responses use
//! geographic (latitude, longitude) positions.
//!
//! # Example
//!
//! ```no_run
//! let options = healthroute::network::Options::default();
//! let g = healthroute::network::load_graph(&options, "path/to/network.xml.gz")
//!     .expect("failed to load network");
//!
//! let service = healthroute::RouteService::new(g, healthroute::ServiceOptions::default())
//!     .expect("network must not be empty");
//!
//! let route = service
//!     .plan_route(22.6273, 120.3014, 22.6390, 120.3020, "PM25_expo")
//!     .expect("failed to find route");
//!
//! println!("{}", route.to_json().unwrap());
//! ```

mod dijkstra;
mod distance;
mod error;
mod graph;
mod kd;
pub mod network;
mod projection;
mod route;
mod service;
mod snap;

pub use dijkstra::{path_cost, shortest_path};
pub use distance::planar_distance;
pub use error::RouteError;
pub use graph::{Graph, GraphBuilder, Weight, Weights};
pub use kd::KDTree;
pub use projection::{TransverseMercator, MAX_MERIDIAN_OFFSET};
pub use route::{assemble, path_distance, LineString, RouteFeature, RouteProperties};
pub use service::{RouteService, ServiceOptions};
pub use snap::{Snap, Snapper, DEFAULT_CANDIDATES};

/// Identifies a [Node] within a [Graph]: the index of the node.
pub type NodeId = usize;

/// Represents an element of the [Graph].
///
/// A node is identified by its position in the projected frame (`x`, `y`).
/// Its geographic position (`lat`, `lon`) is computed once, when the [Graph] is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub lat: f64,
    pub lon: f64,
}

/// Represents one direction of an undirected road segment incident to a specific [Node].
///
/// Every segment is stored twice, once for each of its ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: NodeId,
    pub weights: Weights,
}
