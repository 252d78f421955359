//! Planar and spherical measurements over coordinate rings.
//!
//! All functions are pure. Rings are implicitly closed: the last vertex
//! connects back to the first, so callers never repeat the start point.
//!
//! # Accuracy
//!
//! Width, height and area use a local flat-earth approximation
//! (111 000 m per degree of latitude, scaled by `cos(lat)` for
//! longitude). That is only trustworthy for extents of a few kilometers
//! at most; facilities are expected to be sub-kilometer. Perimeter uses
//! the haversine great-circle distance on a spherical earth. Neither is a
//! geodesic (ellipsoidal) computation.

use serde::{Deserialize, Serialize};

use crate::model::LatLng;

/// Meters per degree of latitude, and per degree of longitude at the equator.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Mean earth radius used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Axis-aligned bounding box of a ring, with its extent in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingDimensions {
    pub width: f64,
    pub height: f64,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Arithmetic mean of the vertices. Not area-weighted, so for concave
/// rings the result may fall outside the shape.
///
/// Returns `None` for an empty ring.
pub fn centroid(points: &[LatLng]) -> Option<LatLng> {
    if points.is_empty() {
        return None;
    }
    let n = count_as_f64(points.len());
    let (lat_sum, lng_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Some(LatLng::new(lat_sum / n, lng_sum / n))
}

/// Bounding box and its flat-earth size, evaluated at the box's mean latitude.
///
/// Returns `None` for an empty ring.
pub fn bounding_dimensions(points: &[LatLng]) -> Option<BoundingDimensions> {
    let first = points.first()?;
    let mut dims = BoundingDimensions {
        width: 0.0,
        height: 0.0,
        min_lat: first.lat,
        max_lat: first.lat,
        min_lng: first.lng,
        max_lng: first.lng,
    };

    for p in &points[1..] {
        dims.min_lat = dims.min_lat.min(p.lat);
        dims.max_lat = dims.max_lat.max(p.lat);
        dims.min_lng = dims.min_lng.min(p.lng);
        dims.max_lng = dims.max_lng.max(p.lng);
    }

    let mean_lat = (dims.min_lat + dims.max_lat) / 2.0;
    dims.height = (dims.max_lat - dims.min_lat) * METERS_PER_DEGREE;
    dims.width =
        (dims.max_lng - dims.min_lng) * METERS_PER_DEGREE * mean_lat.to_radians().cos();
    Some(dims)
}

/// Unsigned shoelace area in square degrees.
pub fn shoelace_area_degrees(points: &[LatLng]) -> f64 {
    let doubled: f64 = ring_edges(points)
        .map(|(a, b)| a.lng * b.lat - b.lng * a.lat)
        .sum();
    doubled.abs() / 2.0
}

/// Area in square meters: shoelace area scaled by the meters-per-degree
/// factors at the centroid latitude.
pub fn area(points: &[LatLng]) -> f64 {
    let Some(center) = centroid(points) else {
        return 0.0;
    };
    let meters_per_deg_lng = METERS_PER_DEGREE * center.lat.to_radians().cos();
    shoelace_area_degrees(points) * METERS_PER_DEGREE * meters_per_deg_lng
}

/// Great-circle distance in meters between two points.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Ring-closed sum of haversine distances, in meters.
pub fn perimeter(points: &[LatLng]) -> f64 {
    ring_edges(points)
        .map(|(a, b)| haversine_distance(a.lat, a.lng, b.lat, b.lng))
        .sum()
}

/// Consecutive vertex pairs, wrapping the last vertex back to the first.
fn ring_edges(points: &[LatLng]) -> impl Iterator<Item = (&LatLng, &LatLng)> {
    points.iter().zip(points.iter().cycle().skip(1))
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn count_as_f64(n: usize) -> f64 {
    n as f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn rect(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> Vec<LatLng> {
        vec![
            LatLng::new(lat2, lng1),
            LatLng::new(lat2, lng2),
            LatLng::new(lat1, lng2),
            LatLng::new(lat1, lng1),
        ]
    }

    #[test]
    fn centroid_is_vertex_mean() {
        let ring = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 3.0),
            LatLng::new(3.0, 0.0),
        ];
        let c = centroid(&ring).expect("non-empty ring");
        assert_close(c.lat, 1.0, 1e-12);
        assert_close(c.lng, 1.0, 1e-12);
    }

    #[test]
    fn centroid_of_empty_ring_is_none() {
        assert!(centroid(&[]).is_none());
        assert!(bounding_dimensions(&[]).is_none());
    }

    #[test]
    fn bounding_dimensions_match_reference_rectangle() {
        let ring = rect(24.7140, 46.6780, 24.7150, 46.6800);
        let dims = bounding_dimensions(&ring).expect("non-empty ring");
        assert_close(dims.height, 111.0, 1e-6);
        assert_close(dims.width, 201.7, 0.2);
        assert_close(dims.min_lat, 24.7140, 1e-12);
        assert_close(dims.max_lng, 46.6800, 1e-12);
    }

    #[test]
    fn rectangle_area_is_width_times_height() {
        let ring = rect(24.7140, 46.6780, 24.7150, 46.6800);
        let dims = bounding_dimensions(&ring).expect("non-empty ring");
        let a = area(&ring);
        assert!(a > 0.0);
        assert_close(a, dims.width * dims.height, a * 1e-6);
    }

    #[test]
    fn triangle_area_matches_half_base_height() {
        let ring = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 0.001),
            LatLng::new(0.001, 0.0),
        ];
        let center_lat = 0.001_f64 / 3.0;
        let base = 0.001 * METERS_PER_DEGREE * center_lat.to_radians().cos();
        let height = 0.001 * METERS_PER_DEGREE;
        let expected = 0.5 * base * height;
        assert_close(area(&ring), expected, expected * 0.01);
    }

    #[test]
    fn shoelace_ignores_winding() {
        let mut ring = rect(1.0, 1.0, 2.0, 2.0);
        let forward = shoelace_area_degrees(&ring);
        ring.reverse();
        assert_close(shoelace_area_degrees(&ring), forward, 1e-12);
        assert_close(forward, 1.0, 1e-12);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let d = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert_close(d, EARTH_RADIUS_M * 1.0_f64.to_radians(), 1e-6);
    }

    #[test]
    fn haversine_identical_points_is_zero() {
        assert_close(haversine_distance(24.7, 46.6, 24.7, 46.6), 0.0, 1e-12);
    }

    #[test]
    fn haversine_antipodes_is_finite() {
        let d = haversine_distance(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert_close(d, std::f64::consts::PI * EARTH_RADIUS_M, 1.0);
    }

    #[test]
    fn perimeter_invariant_under_rotation_and_reversal() {
        let ring = vec![
            LatLng::new(24.7100, 46.6750),
            LatLng::new(24.7115, 46.6752),
            LatLng::new(24.7118, 46.6771),
            LatLng::new(24.7103, 46.6779),
            LatLng::new(24.7096, 46.6763),
        ];
        let base = perimeter(&ring);
        assert!(base > 0.0);

        for shift in 1..ring.len() {
            let mut rotated = ring.clone();
            rotated.rotate_left(shift);
            assert_close(perimeter(&rotated), base, 1e-6);
        }

        let mut reversed = ring;
        reversed.reverse();
        assert_close(perimeter(&reversed), base, 1e-6);
    }

    #[test]
    fn degenerate_rings_are_finite() {
        let collinear = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(0.0, 2.0),
        ];
        assert_close(area(&collinear), 0.0, 1e-9);
        assert!(perimeter(&collinear).is_finite());

        let duplicate = [LatLng::new(5.0, 5.0); 3];
        assert_close(area(&duplicate), 0.0, 1e-12);
        assert_close(perimeter(&duplicate), 0.0, 1e-12);

        assert_close(area(&[]), 0.0, 0.0);
        assert_close(perimeter(&[]), 0.0, 0.0);
        assert_close(perimeter(&[LatLng::new(1.0, 1.0)]), 0.0, 0.0);
    }
}
