// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::{planar_distance, Graph, NodeId, Weight};

/// A found route, as a [GeoJSON](https://datatracker.ietf.org/doc/html/rfc7946)
/// `Feature` with a `LineString` geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteFeature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: LineString,
    pub properties: RouteProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: String,

    /// `[longitude, latitude]` pairs, in path order.
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteProperties {
    /// Name of the [Weight] which was minimized.
    pub weight: String,
    pub node_count: usize,
    pub distance_meters: f64,
}

impl RouteFeature {
    /// Serializes the feature into a GeoJSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serializes the feature into an indented GeoJSON string.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Sums the projected-frame distance between consecutive nodes of a path, in meters.
///
/// Ids not present in the graph are skipped.
pub fn path_distance(g: &Graph, path: &[NodeId]) -> f64 {
    path.iter()
        .filter_map(|&id| g.node(id))
        .collect::<Vec<_>>()
        .windows(2)
        .map(|pair| planar_distance(pair[0].x, pair[0].y, pair[1].x, pair[1].y))
        .sum()
}

/// Converts a path into a [RouteFeature].
pub fn assemble(g: &Graph, path: &[NodeId], weight: Weight) -> RouteFeature {
    let coordinates = path
        .iter()
        .filter_map(|&id| g.node(id))
        .map(|node| [node.lon, node.lat])
        .collect::<Vec<_>>();

    RouteFeature {
        kind: "Feature".to_string(),
        properties: RouteProperties {
            weight: weight.to_string(),
            node_count: coordinates.len(),
            distance_meters: path_distance(g, path),
        },
        geometry: LineString {
            kind: "LineString".to_string(),
            coordinates,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphBuilder, TransverseMercator, Weights};

    const TM2: TransverseMercator = TransverseMercator::TWD97_TM2;

    fn graph() -> Graph {
        let mut b = GraphBuilder::new();
        let a = b.add_node(180_000.0, 2_500_000.0).unwrap();
        let c = b.add_node(180_030.0, 2_500_040.0).unwrap();
        let d = b.add_node(180_030.0, 2_500_140.0).unwrap();
        let w = Weights {
            length: 1.0,
            pm25_expo: 1.0,
        };
        b.add_edge(a, c, w).unwrap();
        b.add_edge(c, d, w).unwrap();
        b.build(&TM2).unwrap()
    }

    #[test]
    fn distance_of_path() {
        let g = graph();
        assert!((path_distance(&g, &[0, 1, 2]) - 150.0).abs() < 1e-9);
        assert!((path_distance(&g, &[2, 1]) - 100.0).abs() < 1e-9);
        assert_eq!(path_distance(&g, &[1]), 0.0);
        assert_eq!(path_distance(&g, &[]), 0.0);
    }

    #[test]
    fn distance_agrees_with_geographic_positions() {
        let g = graph();
        let reprojected = g
            .nodes_geographic()
            .iter()
            .map(|&(lat, lon)| TM2.to_projected(lat, lon).unwrap())
            .collect::<Vec<_>>();
        let d = reprojected
            .windows(2)
            .map(|p| planar_distance(p[0].0, p[0].1, p[1].0, p[1].1))
            .sum::<f64>();
        assert!((d - path_distance(&g, &[0, 1, 2])).abs() < 1e-6);
    }

    #[test]
    fn assemble_feature() {
        let g = graph();
        let f = assemble(&g, &[0, 1, 2], Weight::Pm25Expo);

        assert_eq!(f.kind, "Feature");
        assert_eq!(f.geometry.kind, "LineString");
        assert_eq!(f.properties.weight, "PM25_expo");
        assert_eq!(f.properties.node_count, 3);
        assert!((f.properties.distance_meters - 150.0).abs() < 1e-9);

        for (coord, node) in f.geometry.coordinates.iter().zip(g.iter()) {
            assert_eq!(*coord, [node.lon, node.lat]);
        }
    }

    #[test]
    fn feature_as_geojson() {
        let g = graph();
        let f = assemble(&g, &[1], Weight::Length);
        let v: serde_json::Value = serde_json::from_str(&f.to_json().unwrap()).unwrap();

        assert_eq!(v["type"], "Feature");
        assert_eq!(v["geometry"]["type"], "LineString");
        let lon = v["geometry"]["coordinates"][0][0].as_f64().unwrap();
        let lat = v["geometry"]["coordinates"][0][1].as_f64().unwrap();
        assert!((lon - g.node(1).unwrap().lon).abs() < 1e-12);
        assert!((lat - g.node(1).unwrap().lat).abs() < 1e-12);
        assert_eq!(v["properties"]["weight"], "length");
        assert_eq!(v["properties"]["node_count"], 1);
        assert_eq!(v["properties"]["distance_meters"], 0.0);

        let back: RouteFeature = serde_json::from_str(&f.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back.properties, f.properties);
        assert_eq!(back.geometry.coordinates.len(), 1);
    }
}
