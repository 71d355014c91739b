// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use super::LoadError;
use crate::{Graph, GraphBuilder, NodeId, TransverseMercator, Weight, Weights};

/// Node of a road network file, positioned in the projected frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawNode {
    pub id: i64,
    pub x: f64,
    pub y: f64,
}

/// Undirected road segment of a network file.
///
/// Some exports nest (part of) the edge attributes under an `attr_dict` container.
/// [RawNetwork::into_graph] flattens those into `attributes`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawEdge {
    pub from: i64,
    pub to: i64,
    pub attributes: HashMap<String, String>,
    pub attr_dict: Option<HashMap<String, String>>,
}

impl RawEdge {
    /// Moves all attributes from the nested `attr_dict` container to `attributes`.
    /// Nested values override direct ones.
    pub fn flatten(&mut self) {
        if let Some(nested) = self.attr_dict.take() {
            self.attributes.extend(nested);
        }
    }

    fn weight(&self, weight: Weight) -> Result<f64, LoadError> {
        let raw = self
            .attributes
            .get(weight.name())
            .ok_or(LoadError::MissingWeight {
                from: self.from,
                to: self.to,
                weight,
            })?;

        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(LoadError::InvalidWeightValue {
                from: self.from,
                to: self.to,
                weight,
                value: raw.clone(),
            }),
        }
    }

    fn weights(&self) -> Result<Weights, LoadError> {
        Ok(Weights {
            length: self.weight(Weight::Length)?,
            pm25_expo: self.weight(Weight::Pm25Expo)?,
        })
    }
}

/// Union over all elements of a network file.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Node(RawNode),
    Edge(RawEdge),
}

/// Contents of a network file, before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawNetwork {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

impl RawNetwork {
    pub(super) fn add_feature(&mut self, f: Feature) {
        match f {
            Feature::Node(n) => self.nodes.push(n),
            Feature::Edge(e) => self.edges.push(e),
        }
    }

    /// Normalizes the network and converts it into a [Graph]:
    /// nested edge attributes are flattened, weights are parsed and validated,
    /// and the geographic position of every node is computed.
    pub fn into_graph(mut self, projection: &TransverseMercator) -> Result<Graph, LoadError> {
        if self.nodes.is_empty() {
            return Err(LoadError::EmptyNetwork);
        }

        let nested = self.edges.iter().filter(|e| e.attr_dict.is_some()).count();
        if nested > 0 {
            log::debug!("flattening attr_dict of {} edges", nested);
        }
        self.edges.iter_mut().for_each(RawEdge::flatten);

        let mut b = GraphBuilder::new();
        let mut ids: HashMap<i64, NodeId> = HashMap::with_capacity(self.nodes.len());

        for n in &self.nodes {
            let id = b.add_node(n.x, n.y)?;
            if ids.insert(n.id, id).is_some() {
                return Err(LoadError::DuplicateNode(n.id));
            }
        }

        if b.len() < ids.len() {
            log::warn!(
                "{} nodes share positions with other nodes and were merged",
                ids.len() - b.len()
            );
        }

        for e in &self.edges {
            let from = *ids.get(&e.from).ok_or(LoadError::UnknownNode(e.from))?;
            let to = *ids.get(&e.to).ok_or(LoadError::UnknownNode(e.to))?;
            b.add_edge(from, to, e.weights()?)?;
        }

        Ok(b.build(projection)?)
    }
}
