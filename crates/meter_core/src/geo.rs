//! Geodesic distance between GPS fixes.
//!
//! Distances come from Vincenty's inverse formula on the WGS84 ellipsoid. When
//! the iteration does not converge (near-antipodal points) the haversine
//! great-circle distance is used instead. Both paths are scaled by
//! [GPS_CORRECTION_FACTOR] to offset the systematic under-measurement of
//! sparse consumer GPS sampling.

use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;
use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis in meters.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 semi-minor axis in meters.
pub const WGS84_B: f64 = 6_356_752.314245;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Earth's mean radius in meters, used by the spherical fallback.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Multiplier applied to every measured distance.
pub const GPS_CORRECTION_FACTOR: f64 = 1.15;

const CONVERGENCE_EPSILON: f64 = 1e-12;
const MAX_ITERATIONS: u32 = 100;

static CONVERGENCE_FALLBACKS: AtomicU64 = AtomicU64::new(0);

/// One GPS fix. Timestamp is milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: u64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, timestamp: u64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    /// True when both coordinates are finite and inside their valid ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Corrected distance in meters between two fixes.
///
/// Coincident points return exactly `0.0`. Callers must reject fixes that fail
/// [Position::is_valid] before measuring.
pub fn geodesic_distance_m(from: &Position, to: &Position) -> f64 {
    let meters = match vincenty_distance_m(from, to) {
        Some(meters) => meters,
        None => {
            CONVERGENCE_FALLBACKS.fetch_add(1, Ordering::Relaxed);
            warn!(
                "vincenty did not converge for ({}, {}) -> ({}, {}); using haversine",
                from.latitude, from.longitude, to.latitude, to.longitude
            );
            haversine_distance_m(from, to)
        }
    };
    meters * GPS_CORRECTION_FACTOR
}

/// Number of measurements that fell back to the spherical formula since process start.
pub fn convergence_fallbacks() -> u64 {
    CONVERGENCE_FALLBACKS.load(Ordering::Relaxed)
}

/// Uncorrected ellipsoidal distance, or `None` if the lambda iteration does not converge.
pub fn vincenty_distance_m(from: &Position, to: &Position) -> Option<f64> {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let l = (to.longitude - from.longitude).to_radians();

    let u1 = ((1.0 - WGS84_F) * lat1.tan()).atan();
    let u2 = ((1.0 - WGS84_F) * lat2.tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut iterations = 0;
    loop {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let cross = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2) + cross.powi(2)).sqrt();
        if sin_sigma == 0.0 {
            return Some(0.0);
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial line: cos²α is zero and cos 2σm is undefined.
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };

        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        iterations += 1;
        if (lambda - previous).abs() <= CONVERGENCE_EPSILON {
            return Some(ellipsoid_arc(cos_sq_alpha, sin_sigma, cos_sigma, sigma, cos_2sigma_m));
        }
        if iterations >= MAX_ITERATIONS {
            return None;
        }
    }
}

fn ellipsoid_arc(
    cos_sq_alpha: f64,
    sin_sigma: f64,
    cos_sigma: f64,
    sigma: f64,
    cos_2sigma_m: f64,
) -> f64 {
    let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
    let a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let c2 = cos_2sigma_m * cos_2sigma_m;
    let delta_sigma = b
        * sin_sigma
        * (cos_2sigma_m
            + b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * c2)
                    - b / 6.0 * cos_2sigma_m * (-3.0 + 4.0 * sin_sigma * sin_sigma) * (-3.0 + 4.0 * c2)));
    WGS84_B * a * (sigma - delta_sigma)
}

/// Uncorrected great-circle distance on a sphere of radius [EARTH_RADIUS_M].
pub fn haversine_distance_m(from: &Position, to: &Position) -> f64 {
    let (lat1, lon1) = (from.latitude.to_radians(), from.longitude.to_radians());
    let (lat2, lon2) = (to.latitude.to_radians(), to.longitude.to_radians());
    let sin_dlat = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon = ((lon2 - lon1) * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Point reached by travelling `meters` from `origin` along `bearing_deg` on the sphere.
pub fn destination(origin: &Position, bearing_deg: f64, meters: f64, timestamp: u64) -> Position {
    let delta = meters / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    Position::new(lat2.to_degrees(), lon2.to_degrees(), timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon, 0)
    }

    #[test]
    fn coincident_points_are_exactly_zero() {
        let p = at(19.7050, -103.4617);
        assert_eq!(geodesic_distance_m(&p, &p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_matches_reference_with_correction() {
        // Meridian arc between 0° and 1° N is 110574.389 m on WGS84.
        let d = geodesic_distance_m(&at(0.0, 0.0), &at(1.0, 0.0));
        let expected = 110_574.389 * GPS_CORRECTION_FACTOR;
        assert!((d - expected).abs() < 0.5, "got {d}, expected {expected}");
    }

    #[test]
    fn equatorial_line_converges() {
        let d = vincenty_distance_m(&at(0.0, 0.0), &at(0.0, 1.0)).expect("converges");
        // One degree of longitude on the equator: a * π / 180.
        assert!((d - 111_319.491).abs() < 0.01, "got {d}");
    }

    #[test]
    fn nearly_antipodal_points_fall_back_to_haversine() {
        let from = at(0.0, 0.0);
        let to = at(0.5, 179.7);
        assert!(vincenty_distance_m(&from, &to).is_none());

        let before = convergence_fallbacks();
        let d = geodesic_distance_m(&from, &to);
        let expected = haversine_distance_m(&from, &to) * GPS_CORRECTION_FACTOR;
        assert!((d - expected).abs() < 1e-6);
        assert!(convergence_fallbacks() > before);
    }

    #[test]
    fn distance_is_symmetric_and_non_negative() {
        let a = at(19.7050, -103.4617);
        let b = at(19.7120, -103.4700);
        let ab = geodesic_distance_m(&a, &b);
        let ba = geodesic_distance_m(&b, &a);
        assert!(ab > 0.0);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn destination_round_trips_through_haversine() {
        let origin = at(19.7050, -103.4617);
        let target = destination(&origin, 45.0, 1_000.0, 0);
        let d = haversine_distance_m(&origin, &target);
        assert!((d - 1_000.0).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn out_of_range_coordinates_are_invalid() {
        assert!(at(19.0, -103.0).is_valid());
        assert!(!at(91.0, 0.0).is_valid());
        assert!(!at(0.0, f64::NAN).is_valid());
    }
}
