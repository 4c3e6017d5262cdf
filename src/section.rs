//! Section extraction.
//!
//! Given two snapped endpoints on the same trail, returns the inclusive
//! sub-sequence of the trail's master vertex list between them, in trail
//! order regardless of which endpoint the user tapped first. Both endpoints
//! must be vertex values of the trail — rounded-coordinate equality is the
//! lookup, so a vertex that came from persisted coverage geometry still
//! matches the original trail geometry.

use thiserror::Error;

use crate::geo_utils::polyline_length;
use crate::{Coordinate, Trail, TrailId};

/// A contiguous sub-route of a trail between two user-chosen endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub trail_id: TrailId,
    /// Vertices in trail order, inclusive of both endpoints.
    pub coords: Vec<Coordinate>,
    /// Great-circle length of the section in metres.
    pub metres: f64,
}

/// Why a section could not be extracted. All variants are recoverable; the
/// caller clears the selection and lets the user try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SectionError {
    /// An endpoint is not a vertex of the trail — a rounding mismatch, or a
    /// point snapped on a different trail.
    #[error("endpoint is not a vertex of trail {0}")]
    EndpointNotOnTrail(TrailId),
    /// The extracted sub-sequence cannot form a line.
    #[error("section has {0} points, need at least 2")]
    TooShort(usize),
}

/// Extract the sub-route of `trail` between vertices `a` and `b`.
///
/// Order-independent: `extract_section(t, a, b)` and `extract_section(t, b, a)`
/// return the same section, always in trail order.
pub fn extract_section(
    trail: &Trail,
    a: Coordinate,
    b: Coordinate,
) -> Result<Section, SectionError> {
    let index_a = trail
        .coords
        .iter()
        .position(|c| *c == a)
        .ok_or(SectionError::EndpointNotOnTrail(trail.id))?;
    let index_b = trail
        .coords
        .iter()
        .position(|c| *c == b)
        .ok_or(SectionError::EndpointNotOnTrail(trail.id))?;

    let lo = index_a.min(index_b);
    let hi = index_a.max(index_b);
    let coords = trail.coords[lo..=hi].to_vec();

    if coords.len() < 2 {
        return Err(SectionError::TooShort(coords.len()));
    }

    let metres = polyline_length(&coords);
    Ok(Section { trail_id: trail.id, coords, metres })
}
