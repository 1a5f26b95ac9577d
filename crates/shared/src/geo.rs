//! Great-circle distance on the spherical Earth approximation.

use geo::{point, HaversineDistance};

/// Computes the haversine distance in meters between two WGS84 coordinates.
///
/// Pure and deterministic; callers are expected to have validated the
/// coordinate ranges beforehand (see [`crate::validation`]).
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let from = point!(x: lon1, y: lat1);
    let to = point!(x: lon2, y: lat2);
    from.haversine_distance(&to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(distance_meters(48.2082, 16.3738, 48.2082, 16.3738), 0.0);
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        // One degree of longitude at the equator is ~111.2 km
        let d = distance_meters(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }

    #[test]
    fn test_paris_to_london() {
        // Notre-Dame to Big Ben, roughly 340 km
        let d = distance_meters(48.8530, 2.3499, 51.5007, -0.1246);
        assert!(d > 330_000.0 && d < 350_000.0, "got {d}");
    }

    #[test]
    fn test_short_urban_distance() {
        // Two points ~111 m apart (0.001 degrees of latitude)
        let d = distance_meters(52.5200, 13.4050, 52.5210, 13.4050);
        assert!((d - 111.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn test_symmetry() {
        let a = distance_meters(40.7128, -74.0060, 34.0522, -118.2437);
        let b = distance_meters(34.0522, -118.2437, 40.7128, -74.0060);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_crossing_antimeridian() {
        // Points either side of the 180th meridian are close, not half a world apart
        let d = distance_meters(0.0, 179.9, 0.0, -179.9);
        assert!(d < 30_000.0, "got {d}");
    }
}
