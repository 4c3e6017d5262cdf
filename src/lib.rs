//! # Trail Tracker
//!
//! Section selection and completion tracking for long-distance walking trails.
//!
//! This library models each trail as an ordered sequence of coordinates and
//! provides:
//! - Nearest-vertex snapping of a tapped location onto a trail
//! - Extraction of the sub-route between two snapped endpoints
//! - Per-trail "completed coverage" bookkeeping: which vertices have been
//!   walked, decomposed into contiguous runs for rendering, with a one-shot
//!   "trail completed" event
//!
//! ## Features
//!
//! - **`parallel`** - Parallel nearest-vertex search across trails with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use trail_tracker::{Coordinate, Country, Coverage, Trail, TrailMetadata, extract_section};
//!
//! let meta = TrailMetadata {
//!     id: 1,
//!     name: "Test Way".to_string(),
//!     start: "Alton".to_string(),
//!     end: "Buriton".to_string(),
//!     metres: 1000.0,
//!     ascent: 20.0,
//!     descent: 20.0,
//!     country: Country::England,
//!     cycleway: false,
//! };
//! let coords: Vec<Coordinate> = (0..10)
//!     .map(|i| Coordinate::new(51.0 + i as f64 * 0.001, -1.0))
//!     .collect();
//! let trail = Trail::new(meta, coords);
//!
//! // Extract the sub-route between two vertices (order-independent)
//! let section = extract_section(&trail, trail.coords[5], trail.coords[2]).unwrap();
//! assert_eq!(section.coords.len(), 4);
//!
//! // Mark it as walked
//! let mut coverage = Coverage::new(trail.id);
//! coverage.add(&section, &trail);
//! assert_eq!(coverage.runs().len(), 1);
//! assert!(coverage.metres() > 0.0);
//! ```

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

pub mod coverage;
pub mod geo_utils;
pub mod load;
pub mod locate;
pub mod model;
pub mod section;
pub mod selection;
pub mod sort;
pub mod store;
pub mod units;

pub use coverage::{Coverage, COMPLETION_RATIO};
pub use load::{load_trails, LoadError, TrailMetadata};
pub use locate::{closest_vertex, closest_vertex_on, Snap, TrailIndex};
pub use model::{ModelEvent, TrailModel};
pub use section::{extract_section, Section, SectionError};
pub use selection::{SectionSelector, SelectionState, TapOutcome};
pub use sort::{TrailFilter, TrailSort};
pub use store::{CoverageStore, Preferences};
pub use units::MeasurementSystem;

// ============================================================================
// Core Types
// ============================================================================

/// Decimal places that coordinates are rounded to on construction.
///
/// Trail geometry and persisted coverage geometry are produced by independent
/// code paths; rounding both to the same precision is what makes their
/// vertices compare equal by value. 5 decimal places is ~1.1m at the equator.
pub const COORD_DECIMAL_PLACES: u32 = 5;

const COORD_SCALE: f64 = 100_000.0; // 10^COORD_DECIMAL_PLACES

/// A geographic coordinate, rounded to [`COORD_DECIMAL_PLACES`] on construction.
///
/// Equality and hashing use an exact scaled-integer representation of the
/// rounded values, so coordinates can be stored in hash sets and compared
/// across sources without floating-point surprises.
///
/// # Example
/// ```
/// use trail_tracker::Coordinate;
/// let a = Coordinate::new(51.507412, -0.127843);
/// let b = Coordinate::new(51.5074121, -0.1278434);
/// assert_eq!(a, b); // both round to (51.50741, -0.12784)
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rounding both components to [`COORD_DECIMAL_PLACES`].
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: (latitude * COORD_SCALE).round() / COORD_SCALE,
            longitude: (longitude * COORD_SCALE).round() / COORD_SCALE,
        }
    }

    /// Check if the coordinate is a plausible WGS84 position.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    fn scaled(&self) -> (i64, i64) {
        (
            (self.latitude * COORD_SCALE).round() as i64,
            (self.longitude * COORD_SCALE).round() as i64,
        )
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.scaled() == other.scaled()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scaled().hash(state);
    }
}

/// Identifier of a trail, matching the ids in the bundled metadata.
pub type TrailId = u16;

/// Country a trail runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    England,
    Scotland,
    Wales,
    #[serde(rename = "Northern Ireland")]
    NorthernIreland,
}

impl Country {
    pub fn name(&self) -> &'static str {
        match self {
            Country::England => "England",
            Country::Scotland => "Scotland",
            Country::Wales => "Wales",
            Country::NorthernIreland => "Northern Ireland",
        }
    }
}

/// A long-distance trail: immutable metadata plus its ordered geometry.
///
/// `coords` is the master vertex list; insertion order is geographic order
/// along the path. All section extraction and coverage bookkeeping is defined
/// in terms of this ordering.
#[derive(Debug, Clone)]
pub struct Trail {
    pub id: TrailId,
    pub name: String,
    /// Place name where the trail starts.
    pub start: String,
    /// Place name where the trail ends.
    pub end: String,
    /// Advertised length from the metadata file, in metres.
    pub metres: f64,
    pub ascent: f64,
    pub descent: f64,
    pub country: Country,
    /// Whether the trail is also a signed cycle route.
    pub cycleway: bool,
    pub coords: Vec<Coordinate>,
    measured_metres: f64,
}

impl Trail {
    /// Build a trail from its metadata record and loaded geometry.
    ///
    /// The cumulative great-circle length of the geometry is computed once
    /// here; it is the reference length for completion tracking (the
    /// advertised `metres` can disagree with the shipped geometry).
    pub fn new(meta: TrailMetadata, coords: Vec<Coordinate>) -> Self {
        let measured_metres = geo_utils::polyline_length(&coords);
        Self {
            id: meta.id,
            name: meta.name,
            start: meta.start,
            end: meta.end,
            metres: meta.metres,
            ascent: meta.ascent,
            descent: meta.descent,
            country: meta.country,
            cycleway: meta.cycleway,
            coords,
            measured_metres,
        }
    }

    /// Cumulative great-circle length of the loaded geometry, in metres.
    pub fn measured_metres(&self) -> f64 {
        self.measured_metres
    }

    /// Bounding box of the trail geometry.
    pub fn bounds(&self) -> Bounds {
        geo_utils::compute_bounds(&self.coords)
    }
}

/// Bounding box for a trail's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

// ============================================================================
// Tests
// ============================================================================
