// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::snap::DEFAULT_CANDIDATES;
use crate::{
    assemble, shortest_path, Graph, KDTree, RouteError, RouteFeature, Snapper, TransverseMercator,
    Weight,
};

/// Additional controls for answering route requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceOptions {
    /// How many nearest nodes are considered when snapping a position.
    /// See [Snapper::snap].
    pub candidates: usize,

    /// Projection between request positions and the frame of the [Graph].
    pub projection: TransverseMercator,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES,
            projection: TransverseMercator::TWD97_TM2,
        }
    }
}

/// RouteService answers route requests over a loaded [Graph].
///
/// The spatial index is built once, in [RouteService::new]. Afterwards the service is
/// never mutated, and can be shared between any number of threads (e.g. through an
/// [Arc](std::sync::Arc)) without locking.
#[derive(Debug, Clone)]
pub struct RouteService {
    graph: Graph,
    index: KDTree,
    options: ServiceOptions,
}

impl RouteService {
    /// Builds the spatial index over the graph nodes.
    /// Fails with [RouteError::EmptyIndex] if the graph has no nodes.
    pub fn new(graph: Graph, options: ServiceOptions) -> Result<Self, RouteError> {
        let index = KDTree::build(&graph.projected_points())?;
        log::info!(
            "route service ready: {} nodes, {} edges",
            graph.len(),
            graph.edge_count()
        );
        Ok(Self {
            graph,
            index,
            options,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn index(&self) -> &KDTree {
        &self.index
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    pub fn snapper(&self) -> Snapper<'_> {
        Snapper::new(
            &self.graph,
            &self.index,
            &self.options.projection,
            self.options.candidates,
        )
    }

    /// Finds a route between two geographic positions, minimizing the `weight`
    /// edge attribute (`"length"` or `"PM25_expo"`).
    ///
    /// The end position is snapped to a node different from the start node,
    /// unless both positions are identical.
    pub fn plan_route(
        &self,
        start_lat: f64,
        start_lon: f64,
        end_lat: f64,
        end_lon: f64,
        weight: &str,
    ) -> Result<RouteFeature, RouteError> {
        let weight: Weight = weight.parse()?;

        let projection = &self.options.projection;
        projection.to_projected(start_lat, start_lon)?;
        projection.to_projected(end_lat, end_lon)?;

        let snapper = self.snapper();
        let start = snapper.snap(start_lat, start_lon, None)?;
        let exclude = if (start_lat, start_lon) == (end_lat, end_lon) {
            None
        } else {
            Some(start.node)
        };
        let end = snapper.snap(end_lat, end_lon, exclude)?;

        log::debug!(
            "start node: {}, dist={:.2}; end node: {}, dist={:.2}",
            start.node,
            start.distance,
            end.node,
            end.distance
        );

        // shortest_path checks connectivity before searching
        let path = shortest_path(&self.graph, start.node, end.node, weight)?;
        Ok(assemble(&self.graph, &path, weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphBuilder, Weights};

    const TM2: TransverseMercator = TransverseMercator::TWD97_TM2;
    const X0: f64 = 180_000.0;
    const Y0: f64 = 2_500_000.0;

    fn geo(x: f64, y: f64) -> (f64, f64) {
        TM2.to_geographic(X0 + x, Y0 + y).unwrap()
    }

    /// Square with nodes at (0,0), (100,0), (100,100), (0,100),
    /// and a separate pair of nodes far to the east.
    fn service() -> RouteService {
        let mut b = GraphBuilder::new();
        for (x, y) in [
            (0.0, 0.0),
            (100.0, 0.0),
            (100.0, 100.0),
            (0.0, 100.0),
            (5_000.0, 0.0),
            (5_100.0, 0.0),
        ] {
            b.add_node(X0 + x, Y0 + y).unwrap();
        }
        for (a, c, pm25_expo) in [(0, 1, 1.0), (1, 2, 1.0), (2, 3, 10.0), (3, 0, 10.0)] {
            b.add_edge(
                a,
                c,
                Weights {
                    length: 100.0,
                    pm25_expo,
                },
            )
            .unwrap();
        }
        b.add_edge(
            4,
            5,
            Weights {
                length: 100.0,
                pm25_expo: 1.0,
            },
        )
        .unwrap();

        RouteService::new(b.build(&TM2).unwrap(), ServiceOptions::default()).unwrap()
    }

    fn node_at(s: &RouteService, coord: [f64; 2]) -> usize {
        s.graph().lookup_by_geographic(coord[1], coord[0]).unwrap()
    }

    #[test]
    fn square_by_length() {
        let s = service();
        let (slat, slon) = geo(2.0, 3.0);
        let (elat, elon) = geo(98.0, 101.0);

        let f = s.plan_route(slat, slon, elat, elon, "length").unwrap();
        assert_eq!(f.properties.weight, "length");
        assert_eq!(f.properties.node_count, 3);
        assert!((f.properties.distance_meters - 200.0).abs() < 1e-6);

        let nodes = f
            .geometry
            .coordinates
            .iter()
            .map(|&c| node_at(&s, c))
            .collect::<Vec<_>>();
        assert_eq!(nodes[0], 0);
        assert_eq!(nodes[2], 2);
        assert!(nodes[1] == 1 || nodes[1] == 3);
    }

    #[test]
    fn square_by_exposure() {
        let s = service();
        let (slat, slon) = geo(2.0, 3.0);
        let (elat, elon) = geo(98.0, 101.0);

        let f = s.plan_route(slat, slon, elat, elon, "PM25_expo").unwrap();
        let nodes = f
            .geometry
            .coordinates
            .iter()
            .map(|&c| node_at(&s, c))
            .collect::<Vec<_>>();
        assert_eq!(nodes, vec![0, 1, 2]);
        assert_eq!(f.properties.weight, "PM25_expo");
        assert_eq!(
            crate::path_cost(s.graph(), &nodes, Weight::Pm25Expo),
            Some(2.0)
        );
    }

    #[test]
    fn invalid_weight() {
        let s = service();
        let (lat, lon) = geo(0.0, 0.0);
        assert_eq!(
            s.plan_route(lat, lon, lat, lon, "time"),
            Err(RouteError::InvalidWeight("time".to_string()))
        );
    }

    #[test]
    fn invalid_coordinates() {
        let s = service();
        let (lat, lon) = geo(0.0, 0.0);
        assert!(matches!(
            s.plan_route(lat, lon, f64::NAN, lon, "length"),
            Err(RouteError::InvalidCoordinate(_, _))
        ));
        assert!(matches!(
            s.plan_route(120.0, lon, lat, lon, "length"),
            Err(RouteError::InvalidCoordinate(_, _))
        ));
    }

    #[test]
    fn disconnected() {
        let s = service();
        let (slat, slon) = geo(0.0, 0.0);
        let (elat, elon) = geo(5_000.0, 0.0);
        assert_eq!(
            s.plan_route(slat, slon, elat, elon, "length"),
            Err(RouteError::NoPathExists { from: 0, to: 4 })
        );
        assert!(!s.graph().has_path(0, 4));
    }

    #[test]
    fn identical_positions() {
        let s = service();
        let (lat, lon) = geo(1.0, 1.0);
        let f = s.plan_route(lat, lon, lat, lon, "length").unwrap();
        assert_eq!(f.properties.node_count, 1);
        assert_eq!(f.properties.distance_meters, 0.0);
        assert_eq!(f.geometry.coordinates.len(), 1);
    }

    #[test]
    fn close_positions_do_not_collapse() {
        let s = service();
        let (slat, slon) = geo(1.0, 1.0);
        let (elat, elon) = geo(2.0, 1.0);
        let f = s.plan_route(slat, slon, elat, elon, "length").unwrap();
        assert_eq!(f.properties.node_count, 2);
        assert!((f.properties.distance_meters - 100.0).abs() < 1e-6);
    }

    #[test]
    fn empty_graph() {
        let g = GraphBuilder::new().build(&TM2).unwrap();
        assert_eq!(
            RouteService::new(g, ServiceOptions::default()).unwrap_err(),
            RouteError::EmptyIndex
        );
    }

    #[test]
    fn concurrent_requests() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RouteService>();

        let s = service();
        let (slat, slon) = geo(2.0, 3.0);
        let (elat, elon) = geo(98.0, 101.0);
        let expected = s.plan_route(slat, slon, elat, elon, "PM25_expo").unwrap();

        std::thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| s.plan_route(slat, slon, elat, elon, "PM25_expo")))
                .collect::<Vec<_>>();
            for h in handles {
                assert_eq!(h.join().unwrap().unwrap(), expected);
            }
        });
    }
}
