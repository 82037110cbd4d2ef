//! Geodesic math for geographic rings and distances.
//!
//! Contract: given an ordered ring of geographic coordinates, return the
//! unsigned area in square meters, accounting for the curvature of the
//! earth rather than flat-plane assumptions.

use crate::map::LatLng;

/// WGS84 equatorial radius in meters, the reference sphere used by the
/// web-mapping stacks this tool interoperates with.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Unsigned geodesic area of a ring, in square meters.
///
/// Spherical-excess accumulation over the ring's edges. Rings with fewer
/// than 3 points have no enclosed surface and return 0.
pub fn geodesic_area(ring: &[LatLng]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let mut total = 0.0;
    for i in 0..ring.len() {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % ring.len()];
        total += (p2.lng - p1.lng).to_radians()
            * (2.0 + p1.lat.to_radians().sin() + p2.lat.to_radians().sin());
    }

    (total * EARTH_RADIUS * EARTH_RADIUS / 2.0).abs()
}

/// Great-circle distance between two coordinates, in meters (haversine).
pub fn haversine_distance(a: LatLng, b: LatLng) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_rings_have_zero_area() {
        assert_eq!(geodesic_area(&[]), 0.0);
        assert_eq!(geodesic_area(&[LatLng::new(1.0, 1.0)]), 0.0);
        assert_eq!(
            geodesic_area(&[LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)]),
            0.0
        );
    }

    #[test]
    fn test_equatorial_degree_cell() {
        // 1°x1° cell at the equator: spherical-excess area on the
        // R=6378137 sphere is ~1.2391e10 m².
        let ring = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(1.0, 0.0),
        ];
        let area = geodesic_area(&ring);
        let expected = 1.2391e10;
        assert!(
            (area - expected).abs() / expected < 1e-3,
            "area was {area}"
        );
    }

    #[test]
    fn test_winding_order_is_unsigned() {
        let ccw = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(1.0, 0.0),
        ];
        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        let a1 = geodesic_area(&ccw);
        let a2 = geodesic_area(&cw);
        assert!((a1 - a2).abs() < 1e-6);
        assert!(a1 > 0.0);
    }

    #[test]
    fn test_haversine_equatorial_degree() {
        // One degree of longitude at the equator is ~111.3 km.
        let d = haversine_distance(LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0));
        assert!((d - 111_319.0).abs() < 100.0, "distance was {d}");
    }

    #[test]
    fn test_haversine_zero() {
        let p = LatLng::new(35.0, 139.0);
        assert_eq!(haversine_distance(p, p), 0.0);
    }
}
