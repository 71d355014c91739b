// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{RouteError, Weight};

/// Error conditions which may occur while loading a road network.
///
/// Unlike [RouteError], these are fatal: a network that failed to load
/// must not be used to serve requests.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error("network has no nodes")]
    EmptyNetwork,

    #[error("duplicate node id: {0}")]
    DuplicateNode(i64),

    #[error("edge references unknown node: {0}")]
    UnknownNode(i64),

    #[error("edge {from} - {to} has no {weight} attribute")]
    MissingWeight { from: i64, to: i64, weight: Weight },

    #[error("edge {from} - {to} has an invalid {weight} value: {value:?}")]
    InvalidWeightValue {
        from: i64,
        to: i64,
        weight: Weight,
        value: String,
    },

    #[error(transparent)]
    Graph(#[from] RouteError),
}
