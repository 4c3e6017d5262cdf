//! # Geographic Utilities
//!
//! Core geographic computation used throughout the crate.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two coordinates |
//! | [`polyline_length`] | Total length of an ordered coordinate sequence |
//! | [`compute_bounds`] | Bounding box of a coordinate sequence |
//! | [`meters_to_degrees`] | Convert metres to approximate degrees at a latitude |
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).
//! Distances are great-circle metres via the haversine formula — trails are
//! measured along the Earth's surface, never in projected plane coordinates.

use geo::{Distance, Haversine, Point};

use crate::{Bounds, Coordinate};

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two coordinates in metres.
///
/// # Example
///
/// ```rust
/// use trail_tracker::{Coordinate, geo_utils};
///
/// let london = Coordinate::new(51.5074, -0.1278);
/// let paris = Coordinate::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &Coordinate, p2: &Coordinate) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Total length of an ordered coordinate sequence in metres.
///
/// Sums the haversine distance between consecutive vertices. Empty or
/// single-vertex sequences have length 0.
///
/// # Example
///
/// ```rust
/// use trail_tracker::{Coordinate, geo_utils};
///
/// let path = vec![
///     Coordinate::new(51.5074, -0.1278),
///     Coordinate::new(51.5080, -0.1290),
///     Coordinate::new(51.5090, -0.1300),
/// ];
/// assert!(geo_utils::polyline_length(&path) > 0.0);
/// ```
pub fn polyline_length(coords: &[Coordinate]) -> f64 {
    if coords.len() < 2 {
        return 0.0;
    }

    coords
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Convert metres to approximate degrees at a given latitude.
///
/// Used to buffer bounding boxes for the spatial prefilter. At the equator,
/// 1 degree is ~111,320m; the figure shrinks with cos(latitude) for
/// longitude, so the conversion uses the given latitude.
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = 111_320.0 * lat_rad.cos().max(0.1);
    meters / meters_per_degree
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a coordinate sequence.
///
/// For empty input, returns a bounds with MIN/MAX sentinels that fails any
/// overlap check.
pub fn compute_bounds(coords: &[Coordinate]) -> Bounds {
    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for c in coords {
        min_lat = min_lat.min(c.latitude);
        max_lat = max_lat.max(c.latitude);
        min_lng = min_lng.min(c.longitude);
        max_lng = max_lng.max(c.longitude);
    }

    Bounds { min_lat, max_lat, min_lng, max_lng }
}

// =============================================================================
// Unit Tests
// =============================================================================
