//! Section selection state machine.
//!
//! Drives the two-tap interaction for picking a section of the selected
//! trail: enter selection mode, tap once to place the start pin, tap again to
//! place the end pin and extract the section between them. A tap that snaps
//! to no vertex (outside the search radius) is ignored. A failed extraction
//! clears the pins and the next tap starts a fresh selection, with the
//! failure observable as [`SelectionState::SectionInvalid`].

use crate::locate::closest_vertex_on;
use crate::section::{extract_section, Section, SectionError};
use crate::{Coordinate, Trail};

/// Where the selection interaction currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// Selection mode not active; taps are ignored.
    Idle,
    /// Waiting for the first endpoint.
    AwaitingStart,
    /// First endpoint placed; waiting for the second.
    AwaitingEnd,
    /// Both endpoints placed and a valid section extracted.
    SectionValid,
    /// The last extraction failed; pins are cleared and the next tap starts
    /// over.
    SectionInvalid,
}

/// What a single tap did.
#[derive(Debug, Clone, PartialEq)]
pub enum TapOutcome {
    /// No vertex within the search radius, or selection mode not active.
    Ignored,
    /// The start pin was placed on the given vertex.
    StartPlaced(Coordinate),
    /// Both pins placed; the section between them is ready to confirm.
    SectionSelected(Section),
    /// Extraction failed; selection reset.
    Failed(SectionError),
}

/// Two-tap section selector for one trail at a time.
#[derive(Debug, Clone, Default)]
pub struct SectionSelector {
    state: Option<Inner>,
}

#[derive(Debug, Clone)]
enum Inner {
    AwaitingStart { invalid: bool },
    AwaitingEnd { start: Coordinate },
    SectionValid { start: Coordinate, end: Coordinate, section: Section },
}

impl SectionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter selection mode. No-op if already selecting.
    pub fn begin(&mut self) {
        if self.state.is_none() {
            self.state = Some(Inner::AwaitingStart { invalid: false });
        }
    }

    /// Leave selection mode, discarding pins and any extracted section.
    pub fn cancel(&mut self) {
        self.state = None;
    }

    pub fn is_selecting(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> SelectionState {
        match &self.state {
            None => SelectionState::Idle,
            Some(Inner::AwaitingStart { invalid: false }) => SelectionState::AwaitingStart,
            Some(Inner::AwaitingStart { invalid: true }) => SelectionState::SectionInvalid,
            Some(Inner::AwaitingEnd { .. }) => SelectionState::AwaitingEnd,
            Some(Inner::SectionValid { .. }) => SelectionState::SectionValid,
        }
    }

    /// The currently placed pins, in placement order.
    pub fn pins(&self) -> Vec<Coordinate> {
        match &self.state {
            Some(Inner::AwaitingEnd { start }) => vec![*start],
            Some(Inner::SectionValid { start, end, .. }) => vec![*start, *end],
            _ => Vec::new(),
        }
    }

    /// The extracted section, once both pins are placed and extraction
    /// succeeded.
    pub fn section(&self) -> Option<&Section> {
        match &self.state {
            Some(Inner::SectionValid { section, .. }) => Some(section),
            _ => None,
        }
    }

    /// Resolve a tap against the selected trail and advance the state
    /// machine. Taps with no vertex within `max_delta` metres leave the state
    /// unchanged; a third tap while a section is held is ignored until the
    /// caller confirms or cancels.
    pub fn tap(&mut self, trail: &Trail, coord: Coordinate, max_delta: f64) -> TapOutcome {
        let Some(inner) = &self.state else {
            return TapOutcome::Ignored;
        };

        match inner {
            Inner::SectionValid { .. } => TapOutcome::Ignored,
            Inner::AwaitingStart { .. } => {
                let Some(snap) = closest_vertex_on(trail, coord, max_delta) else {
                    return TapOutcome::Ignored;
                };
                self.state = Some(Inner::AwaitingEnd { start: snap.vertex });
                TapOutcome::StartPlaced(snap.vertex)
            }
            Inner::AwaitingEnd { start } => {
                let start = *start;
                let Some(snap) = closest_vertex_on(trail, coord, max_delta) else {
                    return TapOutcome::Ignored;
                };
                match extract_section(trail, start, snap.vertex) {
                    Ok(section) => {
                        self.state = Some(Inner::SectionValid {
                            start,
                            end: snap.vertex,
                            section: section.clone(),
                        });
                        TapOutcome::SectionSelected(section)
                    }
                    Err(err) => {
                        self.state = Some(Inner::AwaitingStart { invalid: true });
                        TapOutcome::Failed(err)
                    }
                }
            }
        }
    }

    /// Take the extracted section out of the selector, returning to idle.
    /// Used when the user confirms (completes or uncompletes) the selection.
    pub fn take_section(&mut self) -> Option<Section> {
        match self.state.take() {
            Some(Inner::SectionValid { section, .. }) => Some(section),
            other => {
                self.state = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_trail;

    #[test]
    fn test_idle_ignores_taps() {
        let trail = test_trail(1, 10);
        let mut selector = SectionSelector::new();

        assert_eq!(selector.state(), SelectionState::Idle);
        assert_eq!(
            selector.tap(&trail, trail.coords[0], f64::INFINITY),
            TapOutcome::Ignored
        );
        assert_eq!(selector.state(), SelectionState::Idle);
    }

    #[test]
    fn test_two_taps_select_section() {
        let trail = test_trail(1, 10);
        let mut selector = SectionSelector::new();
        selector.begin();
        assert_eq!(selector.state(), SelectionState::AwaitingStart);

        let out = selector.tap(&trail, trail.coords[2], f64::INFINITY);
        assert_eq!(out, TapOutcome::StartPlaced(trail.coords[2]));
        assert_eq!(selector.state(), SelectionState::AwaitingEnd);
        assert_eq!(selector.pins(), vec![trail.coords[2]]);

        let out = selector.tap(&trail, trail.coords[6], f64::INFINITY);
        assert!(matches!(out, TapOutcome::SectionSelected(_)));
        assert_eq!(selector.state(), SelectionState::SectionValid);
        assert_eq!(selector.section().unwrap().coords, &trail.coords[2..=6]);
        assert_eq!(selector.pins().len(), 2);
    }

    #[test]
    fn test_out_of_radius_tap_ignored_mid_selection() {
        let trail = test_trail(1, 10);
        let mut selector = SectionSelector::new();
        selector.begin();
        selector.tap(&trail, trail.coords[2], f64::INFINITY);

        // A tap far from the trail with a tight radius changes nothing
        let far = Coordinate::new(55.5, -4.0);
        assert_eq!(selector.tap(&trail, far, 100.0), TapOutcome::Ignored);
        assert_eq!(selector.state(), SelectionState::AwaitingEnd);
    }

    #[test]
    fn test_degenerate_section_resets_to_start() {
        let trail = test_trail(1, 10);
        let mut selector = SectionSelector::new();
        selector.begin();
        selector.tap(&trail, trail.coords[4], f64::INFINITY);

        // Tapping the same vertex again yields a 1-point section
        let out = selector.tap(&trail, trail.coords[4], f64::INFINITY);
        assert_eq!(out, TapOutcome::Failed(SectionError::TooShort(1)));
        assert_eq!(selector.state(), SelectionState::SectionInvalid);
        assert!(selector.pins().is_empty());

        // Next tap starts a fresh selection
        let out = selector.tap(&trail, trail.coords[1], f64::INFINITY);
        assert_eq!(out, TapOutcome::StartPlaced(trail.coords[1]));
        assert_eq!(selector.state(), SelectionState::AwaitingEnd);
    }

    #[test]
    fn test_third_tap_ignored_until_confirmed() {
        let trail = test_trail(1, 10);
        let mut selector = SectionSelector::new();
        selector.begin();
        selector.tap(&trail, trail.coords[1], f64::INFINITY);
        selector.tap(&trail, trail.coords[5], f64::INFINITY);

        assert_eq!(
            selector.tap(&trail, trail.coords[8], f64::INFINITY),
            TapOutcome::Ignored
        );
        assert_eq!(selector.section().unwrap().coords, &trail.coords[1..=5]);
    }

    #[test]
    fn test_take_section_returns_to_idle() {
        let trail = test_trail(1, 10);
        let mut selector = SectionSelector::new();
        selector.begin();
        selector.tap(&trail, trail.coords[1], f64::INFINITY);
        selector.tap(&trail, trail.coords[5], f64::INFINITY);

        let section = selector.take_section().unwrap();
        assert_eq!(section.coords.len(), 5);
        assert_eq!(selector.state(), SelectionState::Idle);

        // Nothing left to take
        assert!(selector.take_section().is_none());
    }

    #[test]
    fn test_cancel_from_any_state() {
        let trail = test_trail(1, 10);
        let mut selector = SectionSelector::new();
        selector.begin();
        selector.tap(&trail, trail.coords[1], f64::INFINITY);
        selector.cancel();

        assert_eq!(selector.state(), SelectionState::Idle);
        assert!(selector.pins().is_empty());
    }
}
