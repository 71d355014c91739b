// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Calculates the straight-line distance between two points of a projected
/// (planar) coordinate system. Returns the result in projection units,
/// which are meters for all [projections](crate::TransverseMercator) shipped with this crate.
#[inline]
pub fn planar_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x2 - x1).hypot(y2 - y1)
}
