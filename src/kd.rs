// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{planar_distance, RouteError};

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree)
/// over points of a projected (planar) frame, and answers k-nearest-neighbor queries.
///
/// Every point is identified by its position in the slice the tree was built from.
/// Query results are ordered by ascending euclidean distance; points at equal distance
/// are ordered by ascending index.
#[derive(Debug, Clone)]
pub struct KDTree {
    root: Option<Box<KDNode>>,
    len: usize,
}

#[derive(Debug, Clone)]
struct KDNode {
    pivot: Point,
    left: Option<Box<KDNode>>,
    right: Option<Box<KDNode>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
    index: usize,
}

impl KDTree {
    /// Builds a k-d tree over the provided `(x, y)` points.
    /// Fails with [RouteError::EmptyIndex] if no points are provided.
    pub fn build(points: &[(f64, f64)]) -> Result<Self, RouteError> {
        let mut points = points
            .iter()
            .enumerate()
            .map(|(index, &(x, y))| Point { x, y, index })
            .collect::<Vec<_>>();

        let len = points.len();
        match KDNode::build(points.as_mut_slice(), false) {
            Some(root) => Ok(Self {
                root: Some(Box::new(root)),
                len,
            }),
            None => Err(RouteError::EmptyIndex),
        }
    }

    /// Returns the number of points in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finds up to `k` points closest to `(x, y)`, returning `(distance, index)` pairs.
    ///
    /// If `k` exceeds the number of points in the tree, all points are returned.
    pub fn query_nearest(&self, x: f64, y: f64, k: usize) -> Vec<(f64, usize)> {
        let mut best = Vec::with_capacity(k.min(self.len) + 1);
        if k > 0 {
            if let Some(ref root) = self.root {
                root.query(x, y, k, false, &mut best);
            }
        }
        best
    }
}

impl KDNode {
    fn build(points: &mut [Point], x_divides: bool) -> Option<Self> {
        match points.len() {
            0 => None,
            1 => Some(Self {
                pivot: points[0],
                left: None,
                right: None,
            }),
            _ => {
                if x_divides {
                    points.sort_by(|a, b| a.x.total_cmp(&b.x));
                } else {
                    points.sort_by(|a, b| a.y.total_cmp(&b.y));
                }
                let median = points.len() / 2;
                let pivot = points[median];
                let (left, right_and_pivot) = points.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: Self::build(left, !x_divides).map(Box::new),
                    right: Self::build(right, !x_divides).map(Box::new),
                })
            }
        }
    }

    fn query(&self, x: f64, y: f64, k: usize, x_divides: bool, best: &mut Vec<(f64, usize)>) {
        insert_candidate(
            best,
            k,
            (
                planar_distance(x, y, self.pivot.x, self.pivot.y),
                self.pivot.index,
            ),
        );

        // Select which branch to recurse into first
        let (query_axis, pivot_axis) = if x_divides {
            (x, self.pivot.x)
        } else {
            (y, self.pivot.y)
        };
        let (first, second) = if query_axis < pivot_axis {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(ref branch) = first {
            branch.query(x, y, k, !x_divides, best);
        }

        // The second branch can only hold a candidate if the splitting axis is
        // not farther than the worst candidate. Equal distances are still explored,
        // as they may hold a tie with a lower index.
        if let Some(ref branch) = second {
            let dist_to_axis = (query_axis - pivot_axis).abs();
            let worst = if best.len() < k {
                f64::INFINITY
            } else {
                best.last().map(|&(d, _)| d).unwrap_or(f64::INFINITY)
            };

            if dist_to_axis <= worst {
                branch.query(x, y, k, !x_divides, best);
            }
        }
    }
}

/// Inserts a `(distance, index)` candidate into a sorted list of at most `k` best candidates.
fn insert_candidate(best: &mut Vec<(f64, usize)>, k: usize, candidate: (f64, usize)) {
    let position = best.partition_point(|&(d, i)| {
        d.total_cmp(&candidate.0)
            .then(i.cmp(&candidate.1))
            .is_lt()
    });

    if position < k {
        best.insert(position, candidate);
        best.truncate(k);
    }
}
