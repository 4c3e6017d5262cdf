//! Nearest-vertex search.
//!
//! Resolves a tapped location to the closest trail vertex, scanning every
//! vertex of every candidate trail and keeping the one with the strictly
//! smallest great-circle distance. The scan is deterministic: trails are
//! visited in the order given, vertices in trail order, and only a strictly
//! smaller distance replaces the current best, so the first vertex at the
//! minimum wins.
//!
//! [`TrailIndex`] is an R-tree over trail bounding boxes used to skip trails
//! whose buffered bounds cannot contain a match. It is a prefilter only —
//! the exact haversine scan still decides the result, so the planar R-tree
//! metric never leaks into the contract.

use std::collections::HashSet;

use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::{haversine_distance, meters_to_degrees};
use crate::{Coordinate, Trail, TrailId};

/// A tap resolved to the nearest trail vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snap {
    pub trail_id: TrailId,
    /// The winning vertex, a value from the trail's master vertex list.
    pub vertex: Coordinate,
    /// Great-circle distance from the target to the vertex, in metres.
    pub metres: f64,
}

/// Find the closest vertex to `target` on a single trail.
///
/// Returns `None` if the trail has no vertices or no vertex is strictly
/// closer than `max_delta` metres.
pub fn closest_vertex_on(trail: &Trail, target: Coordinate, max_delta: f64) -> Option<Snap> {
    let mut shortest = f64::INFINITY;
    let mut best: Option<Coordinate> = None;

    for vertex in &trail.coords {
        let delta = haversine_distance(vertex, &target);
        if delta < shortest && delta < max_delta {
            shortest = delta;
            best = Some(*vertex);
        }
    }

    best.map(|vertex| Snap {
        trail_id: trail.id,
        vertex,
        metres: shortest,
    })
}

/// Find the closest vertex to `target` across a set of trails.
///
/// Trails are scanned in slice order; the first vertex at the strictly
/// smallest distance wins. An empty trail list yields `None`.
///
/// # Example
/// ```
/// use trail_tracker::{Coordinate, Country, Trail, TrailMetadata, closest_vertex};
///
/// let meta = TrailMetadata {
///     id: 3,
///     name: "Ridge Way".to_string(),
///     start: "A".to_string(),
///     end: "B".to_string(),
///     metres: 250.0,
///     ascent: 0.0,
///     descent: 0.0,
///     country: Country::England,
///     cycleway: false,
/// };
/// let trail = Trail::new(meta, vec![
///     Coordinate::new(51.0, -1.0),
///     Coordinate::new(51.001, -1.0),
/// ]);
///
/// let snap = closest_vertex(Coordinate::new(51.0002, -1.0), &[trail], 500.0).unwrap();
/// assert_eq!(snap.vertex, Coordinate::new(51.0, -1.0));
/// ```
pub fn closest_vertex(target: Coordinate, trails: &[Trail], max_delta: f64) -> Option<Snap> {
    let mut shortest = f64::INFINITY;
    let mut best: Option<Snap> = None;

    for trail in trails {
        for vertex in &trail.coords {
            let delta = haversine_distance(vertex, &target);
            if delta < shortest && delta < max_delta {
                shortest = delta;
                best = Some(Snap {
                    trail_id: trail.id,
                    vertex: *vertex,
                    metres: delta,
                });
            }
        }
    }

    best
}

/// Parallel variant of [`closest_vertex`]: one scan task per trail, reduced
/// to the same winner as the sequential scan (smallest distance, earlier
/// trail on an exact tie).
#[cfg(feature = "parallel")]
pub fn closest_vertex_parallel(
    target: Coordinate,
    trails: &[Trail],
    max_delta: f64,
) -> Option<Snap> {
    use rayon::prelude::*;

    trails
        .par_iter()
        .enumerate()
        .filter_map(|(idx, trail)| closest_vertex_on(trail, target, max_delta).map(|s| (idx, s)))
        .min_by(|(idx_a, a), (idx_b, b)| {
            a.metres
                .partial_cmp(&b.metres)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(idx_a.cmp(idx_b))
        })
        .map(|(_, snap)| snap)
}

// ============================================================================
// Spatial prefilter
// ============================================================================

struct TrailEnvelope {
    trail_id: TrailId,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl RTreeObject for TrailEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_lng, self.min_lat], [self.max_lng, self.max_lat])
    }
}

/// R-tree over trail bounding boxes, for skipping trails that cannot contain
/// a vertex within the search radius.
pub struct TrailIndex {
    tree: RTree<TrailEnvelope>,
}

impl TrailIndex {
    /// Bulk-load the index from a trail list. Trails with empty geometry are
    /// not indexed (their sentinel bounds would poison the tree).
    pub fn build(trails: &[Trail]) -> Self {
        let envelopes: Vec<TrailEnvelope> = trails
            .iter()
            .filter(|t| !t.coords.is_empty())
            .map(|t| {
                let b = t.bounds();
                TrailEnvelope {
                    trail_id: t.id,
                    min_lat: b.min_lat,
                    max_lat: b.max_lat,
                    min_lng: b.min_lng,
                    max_lng: b.max_lng,
                }
            })
            .collect();
        Self { tree: RTree::bulk_load(envelopes) }
    }

    /// Trail ids whose bounds, buffered by `max_delta` metres, contain the
    /// target. With an infinite radius every indexed trail is a candidate.
    pub fn candidates(&self, target: Coordinate, max_delta: f64) -> HashSet<TrailId> {
        if !max_delta.is_finite() {
            return self.tree.iter().map(|e| e.trail_id).collect();
        }

        let buffer = meters_to_degrees(max_delta, target.latitude);
        let search = AABB::from_corners(
            [target.longitude - buffer, target.latitude - buffer],
            [target.longitude + buffer, target.latitude + buffer],
        );

        self.tree
            .locate_in_envelope_intersecting(&search)
            .map(|e| e.trail_id)
            .collect()
    }
}

/// [`closest_vertex`] with an index prefilter: trails outside the buffered
/// search envelope are skipped without touching their vertices. Iteration
/// stays in slice order, so the tie-break matches the unindexed scan.
pub fn closest_vertex_indexed(
    target: Coordinate,
    trails: &[Trail],
    index: &TrailIndex,
    max_delta: f64,
) -> Option<Snap> {
    let candidates = index.candidates(target, max_delta);

    let mut shortest = f64::INFINITY;
    let mut best: Option<Snap> = None;

    for trail in trails {
        if !candidates.contains(&trail.id) {
            continue;
        }
        for vertex in &trail.coords {
            let delta = haversine_distance(vertex, &target);
            if delta < shortest && delta < max_delta {
                shortest = delta;
                best = Some(Snap {
                    trail_id: trail.id,
                    vertex: *vertex,
                    metres: delta,
                });
            }
        }
    }

    best
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_trail;

    #[test]
    fn test_exact_vertex_snaps_at_zero_distance() {
        let trail = test_trail(1, 10);
        let target = trail.coords[4];

        let snap = closest_vertex(target, std::slice::from_ref(&trail), 1.0).unwrap();
        assert_eq!(snap.vertex, trail.coords[4]);
        assert_eq!(snap.metres, 0.0);
    }

    #[test]
    fn test_snaps_to_nearest_vertex() {
        let trail = test_trail(1, 10);
        // Just north of vertex 2, well south of vertex 3
        let target = Coordinate::new(54.0021, -2.0);

        let snap = closest_vertex_on(&trail, target, f64::INFINITY).unwrap();
        assert_eq!(snap.vertex, trail.coords[2]);
        assert!(snap.metres < 60.0);
    }

    #[test]
    fn test_radius_excludes_distant_vertices() {
        let trail = test_trail(1, 10);
        // ~1.1km west of the trail
        let target = Coordinate::new(54.0, -2.017);

        assert!(closest_vertex_on(&trail, target, 500.0).is_none());
        assert!(closest_vertex_on(&trail, target, 5000.0).is_some());
    }

    #[test]
    fn test_empty_inputs_yield_no_match() {
        let target = Coordinate::new(54.0, -2.0);
        assert!(closest_vertex(target, &[], f64::INFINITY).is_none());

        let empty = crate::Trail::new(crate::tests::test_meta(9), vec![]);
        assert!(closest_vertex_on(&empty, target, f64::INFINITY).is_none());
    }

    #[test]
    fn test_first_trail_wins_ties() {
        // Two trails sharing identical geometry: the earlier one must win
        let a = test_trail(1, 5);
        let b = test_trail(2, 5);
        let target = Coordinate::new(54.0015, -2.0);

        let snap = closest_vertex(target, &[a, b], f64::INFINITY).unwrap();
        assert_eq!(snap.trail_id, 1);
    }

    #[test]
    fn test_indexed_scan_matches_plain_scan() {
        let trails = vec![test_trail(1, 10), test_trail(2, 10)];
        let index = TrailIndex::build(&trails);
        let target = Coordinate::new(54.0021, -2.0003);

        let plain = closest_vertex(target, &trails, 500.0);
        let indexed = closest_vertex_indexed(target, &trails, &index, 500.0);
        assert_eq!(plain, indexed);
    }

    #[test]
    fn test_index_skips_far_trails() {
        let near = test_trail(1, 10);
        let mut far = test_trail(2, 10);
        // Shift trail 2 a degree east
        far.coords = far
            .coords
            .iter()
            .map(|c| Coordinate::new(c.latitude, c.longitude + 1.0))
            .collect();
        let far = crate::Trail::new(crate::tests::test_meta(2), far.coords);

        let index = TrailIndex::build(&[near, far]);
        let candidates = index.candidates(Coordinate::new(54.0, -2.0), 1000.0);
        assert!(candidates.contains(&1));
        assert!(!candidates.contains(&2));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let trails = vec![test_trail(1, 50), test_trail(2, 50), test_trail(3, 50)];
        let target = Coordinate::new(54.0105, -2.0002);

        let seq = closest_vertex(target, &trails, f64::INFINITY).unwrap();
        let par = closest_vertex_parallel(target, &trails, f64::INFINITY).unwrap();
        assert_eq!(seq.trail_id, par.trail_id);
        assert_eq!(seq.vertex, par.vertex);
    }
}
