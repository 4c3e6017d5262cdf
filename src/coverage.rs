//! Completed-coverage bookkeeping.
//!
//! A [`Coverage`] records which vertices of a trail have been walked. Edits
//! union or subtract a section's vertices; after every edit the run
//! decomposition and total distance are recomputed in full from the set and
//! the trail's master vertex order. Full recomputation keeps the run list
//! consistent with the set by construction, at linear cost per edit — trail
//! vertex counts are in the low thousands, so this is cheap.

use std::collections::HashSet;

use crate::geo_utils::polyline_length;
use crate::section::Section;
use crate::{Coordinate, Trail, TrailId};

/// A trail is fully completed once its covered distance reaches this share
/// of the measured trail length. Relative rather than absolute: f64
/// accumulation error over a few thousand segments is ~1e-12 of the total,
/// six orders of magnitude below this threshold.
pub const COMPLETION_RATIO: f64 = 0.9999;

/// The set of vertices of one trail marked as walked, with its derived run
/// decomposition and total distance.
///
/// A *run* is a maximal sub-sequence of consecutive trail vertices that are
/// all in the completed set — the unit the UI renders as one polyline.
#[derive(Debug, Clone, Default)]
pub struct Coverage {
    trail_id: TrailId,
    completed: HashSet<Coordinate>,
    runs: Vec<Vec<Coordinate>>,
    metres: f64,
}

impl Coverage {
    /// Empty coverage for a trail.
    pub fn new(trail_id: TrailId) -> Self {
        Self { trail_id, ..Self::default() }
    }

    /// Rebuild coverage from persisted runs. The vertex set is the union of
    /// the stored runs; the run list itself is recomputed against the trail's
    /// current vertex order rather than trusted from storage.
    pub fn from_runs(trail_id: TrailId, stored: Vec<Vec<Coordinate>>, trail: &Trail) -> Self {
        let mut coverage = Self::new(trail_id);
        coverage.completed = stored.into_iter().flatten().collect();
        coverage.rebuild(trail);
        coverage
    }

    pub fn trail_id(&self) -> TrailId {
        self.trail_id
    }

    /// Mark a section's vertices as walked.
    pub fn add(&mut self, section: &Section, trail: &Trail) {
        self.completed.extend(section.coords.iter().copied());
        self.rebuild(trail);
    }

    /// Unmark a section's vertices.
    pub fn remove(&mut self, section: &Section, trail: &Trail) {
        for coord in &section.coords {
            self.completed.remove(coord);
        }
        self.rebuild(trail);
    }

    /// Contiguous completed runs, in trail order.
    pub fn runs(&self) -> &[Vec<Coordinate>] {
        &self.runs
    }

    /// Total completed distance in metres, summed within runs. Gaps between
    /// runs contribute nothing.
    pub fn metres(&self) -> f64 {
        self.metres
    }

    pub fn contains(&self, coord: &Coordinate) -> bool {
        self.completed.contains(coord)
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Whether the covered distance has reached [`COMPLETION_RATIO`] of the
    /// trail's measured length. Always false for a trail with no geometry.
    pub fn is_complete(&self, trail: &Trail) -> bool {
        trail.measured_metres() > 0.0 && self.metres >= COMPLETION_RATIO * trail.measured_metres()
    }

    /// Whether `section` would add at least one new vertex.
    pub fn can_add(&self, section: &Section) -> bool {
        section.coords.iter().any(|c| !self.completed.contains(c))
    }

    /// Whether `section` overlaps at least one completed vertex.
    pub fn can_remove(&self, section: &Section) -> bool {
        section.coords.iter().any(|c| self.completed.contains(c))
    }

    /// Recompute the run decomposition and total distance from the completed
    /// set: one walk over the trail's master vertex list, closing the current
    /// run at every vertex that is not in the set.
    fn rebuild(&mut self, trail: &Trail) {
        let mut runs = Vec::new();
        let mut run = Vec::new();

        for coord in &trail.coords {
            if self.completed.contains(coord) {
                run.push(*coord);
            } else if !run.is_empty() {
                runs.push(std::mem::take(&mut run));
            }
        }
        if !run.is_empty() {
            runs.push(run);
        }

        self.metres = runs.iter().map(|r| polyline_length(r)).sum();
        self.runs = runs;
    }
}
