//! Trail list presentation helpers: sorting and filtering.
//!
//! Pure functions over the trail list; the sets of completed and favourite
//! trail ids come from the caller (usually [`crate::TrailModel`]'s persisted
//! preferences).

use std::collections::BTreeSet;

use crate::{Country, Trail, TrailId};

/// Sort key for the trail list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailSort {
    Name,
    Length,
    Ascent,
    Completed,
}

/// Filter applied to the trail list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailFilter {
    Completed,
    Favourite,
    Country(Country),
    Cycleway,
}

/// Sort trail references in place. `Completed` puts finished trails first
/// (or last when descending); ties and the other keys fall back to name so
/// the order is total and stable across calls.
pub fn sort_trails(
    trails: &mut [&Trail],
    sort: TrailSort,
    ascending: bool,
    completed: &BTreeSet<TrailId>,
) {
    trails.sort_by(|a, b| {
        let ordering = match sort {
            TrailSort::Name => a.name.cmp(&b.name),
            TrailSort::Length => a
                .metres
                .partial_cmp(&b.metres)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name)),
            TrailSort::Ascent => a
                .ascent
                .partial_cmp(&b.ascent)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name)),
            TrailSort::Completed => completed
                .contains(&b.id)
                .cmp(&completed.contains(&a.id))
                .then_with(|| a.name.cmp(&b.name)),
        };
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// Whether a trail passes a filter.
pub fn matches_filter(
    trail: &Trail,
    filter: TrailFilter,
    completed: &BTreeSet<TrailId>,
    favourites: &BTreeSet<TrailId>,
) -> bool {
    match filter {
        TrailFilter::Completed => completed.contains(&trail.id),
        TrailFilter::Favourite => favourites.contains(&trail.id),
        TrailFilter::Country(country) => trail.country == country,
        TrailFilter::Cycleway => trail.cycleway,
    }
}
