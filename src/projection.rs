// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::RouteError;

/// Maximum allowed distance (in degrees of longitude) between a geographic
/// position and the central meridian of a [TransverseMercator] projection.
pub const MAX_MERIDIAN_OFFSET: f64 = 30.0;

/// Largest mismatch (in meters) tolerated between a projected position and the
/// re-projection of its inverse. Anything above signals a position outside of
/// the projection's image.
const INVERSE_TOLERANCE: f64 = 1e-4;

/// Slack (in degrees) allowed beyond [MAX_MERIDIAN_OFFSET] in both directions,
/// so that inverses of positions on the domain edge can be projected again.
const MERIDIAN_OFFSET_SLACK: f64 = 1e-9;

const NEWTON_ITERATIONS: usize = 4;
const NEWTON_STEP: f64 = 1e-8;

/// Semi-major axis of the GRS80 ellipsoid, in meters.
const GRS80_A: f64 = 6_378_137.0;

/// Flattening of the GRS80 ellipsoid.
const GRS80_F: f64 = 1.0 / 298.257_222_101;

/// TransverseMercator converts between geographic (latitude, longitude) positions
/// and a planar, locally euclidean, projected frame, using the
/// [Krüger series](https://en.wikipedia.org/wiki/Transverse_Mercator:_Redfearn_series).
///
/// The inverse mapping is refined with Newton's method against the forward mapping,
/// so that `to_projected(to_geographic(p))` reproduces `p` to a fraction of a millimeter.
///
/// Angles are expressed in degrees, distances in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub semi_major_axis: f64,
    pub flattening: f64,
    pub central_meridian: f64,
    pub latitude_of_origin: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

impl TransverseMercator {
    /// [TWD97 / TM2 zone 121](https://epsg.io/3826) (EPSG:3826),
    /// the projected frame used by Taiwanese road network datasets.
    pub const TWD97_TM2: Self = Self {
        semi_major_axis: GRS80_A,
        flattening: GRS80_F,
        central_meridian: 121.0,
        latitude_of_origin: 0.0,
        scale_factor: 0.9999,
        false_easting: 250_000.0,
        false_northing: 0.0,
    };

    /// Converts a geographic position into the projected frame, returning `(x, y)`.
    pub fn to_projected(&self, lat: f64, lon: f64) -> Result<(f64, f64), RouteError> {
        let dlon = self.meridian_offset(lat, lon)?;
        let s = Series::new(self);

        let (east, north) = self.forward(&s, lat.to_radians(), dlon.to_radians());
        let (_, origin_north) = self.forward(&s, self.latitude_of_origin.to_radians(), 0.0);

        Ok((
            self.false_easting + east,
            self.false_northing + north - origin_north,
        ))
    }

    /// Converts a position from the projected frame into a geographic position,
    /// returning `(lat, lon)`.
    pub fn to_geographic(&self, x: f64, y: f64) -> Result<(f64, f64), RouteError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(RouteError::InvalidCoordinate(x, y));
        }

        let s = Series::new(self);
        let (_, origin_north) = self.forward(&s, self.latitude_of_origin.to_radians(), 0.0);
        let east = x - self.false_easting;
        let north = y - self.false_northing + origin_north;

        let (mut phi, mut dlam) = self.inverse_estimate(&s, east, north);
        if !phi.is_finite()
            || !dlam.is_finite()
            || dlam.to_degrees().abs() > MAX_MERIDIAN_OFFSET + MERIDIAN_OFFSET_SLACK
        {
            return Err(RouteError::InvalidCoordinate(x, y));
        }

        let mut residual = f64::INFINITY;
        for _ in 0..NEWTON_ITERATIONS {
            let (fe, fn_) = self.forward(&s, phi, dlam);
            let (re, rn) = (east - fe, north - fn_);
            residual = re.hypot(rn);
            if residual < 1e-9 {
                break;
            }

            // Jacobian of the forward mapping, by finite differences
            let (pe, pn) = self.forward(&s, phi + NEWTON_STEP, dlam);
            let (le, ln) = self.forward(&s, phi, dlam + NEWTON_STEP);
            let (de_dphi, dn_dphi) = ((pe - fe) / NEWTON_STEP, (pn - fn_) / NEWTON_STEP);
            let (de_dlam, dn_dlam) = ((le - fe) / NEWTON_STEP, (ln - fn_) / NEWTON_STEP);

            let det = de_dphi * dn_dlam - de_dlam * dn_dphi;
            if det == 0.0 || !det.is_finite() {
                break;
            }

            phi += (dn_dlam * re - de_dlam * rn) / det;
            dlam += (de_dphi * rn - dn_dphi * re) / det;

            let (fe, fn_) = self.forward(&s, phi, dlam);
            residual = (east - fe).hypot(north - fn_);
        }

        if !(residual <= INVERSE_TOLERANCE) {
            return Err(RouteError::InvalidCoordinate(x, y));
        }

        let lat = phi.to_degrees();
        let lon = normalize_longitude(self.central_meridian + dlam.to_degrees());
        if lat.abs() > 90.0 {
            return Err(RouteError::InvalidCoordinate(x, y));
        }
        Ok((lat, lon))
    }

    /// Validates a geographic position and returns its longitude offset
    /// from the central meridian, in degrees.
    fn meridian_offset(&self, lat: f64, lon: f64) -> Result<f64, RouteError> {
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(RouteError::InvalidCoordinate(lat, lon));
        }

        let dlon = normalize_longitude(lon - self.central_meridian);
        if dlon.abs() > MAX_MERIDIAN_OFFSET + MERIDIAN_OFFSET_SLACK {
            return Err(RouteError::InvalidCoordinate(lat, lon));
        }
        Ok(dlon)
    }

    /// Forward Krüger series, without false easting/northing.
    /// Returns `(east, north)` offsets from the (equator, central meridian) point.
    fn forward(&self, s: &Series, phi: f64, dlam: f64) -> (f64, f64) {
        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - s.e * (s.e * sin_phi).atanh()).sinh();
        let xi_p = t.atan2(dlam.cos());
        let eta_p = (dlam.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, alpha) in s.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        let scale = self.scale_factor * s.a_hat;
        (scale * eta, scale * xi)
    }

    /// Inverse Krüger series; returns `(phi, dlam)` in radians.
    fn inverse_estimate(&self, s: &Series, east: f64, north: f64) -> (f64, f64) {
        let scale = self.scale_factor * s.a_hat;
        let xi = north / scale;
        let eta = east / scale;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, beta) in s.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let mut phi = chi;
        for (j, delta) in s.delta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            phi += delta * (k * chi).sin();
        }

        (phi, eta_p.sinh().atan2(xi_p.cos()))
    }
}

impl Default for TransverseMercator {
    fn default() -> Self {
        Self::TWD97_TM2
    }
}

/// Ellipsoid-dependent coefficients of the Krüger series, up to the third order of `n`.
struct Series {
    e: f64,
    a_hat: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl Series {
    fn new(p: &TransverseMercator) -> Self {
        let f = p.flattening;
        let n = f / (2.0 - f);
        let n2 = n * n;
        let n3 = n2 * n;

        Self {
            e: (f * (2.0 - f)).sqrt(),
            a_hat: p.semi_major_axis / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        }
    }
}

/// Wraps a longitude into the `[-180, 180)` range.
fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
