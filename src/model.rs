//! The trail model.
//!
//! [`TrailModel`] owns the loaded trails, each trail's [`Coverage`], the
//! section selector and the persisted preferences, and is the only place any
//! of them are mutated. UI layers call its operations and subscribe to
//! [`ModelEvent`] notifications; they never reach into the state directly.
//!
//! All operations are synchronous — every mutation happens on the caller's
//! control flow, and persistence is a synchronous best-effort write after
//! each edit.

use std::collections::{BTreeMap, HashMap};

use log::{debug, info};

use crate::coverage::Coverage;
use crate::locate::{closest_vertex_indexed, Snap, TrailIndex};
use crate::selection::{SectionSelector, SelectionState, TapOutcome};
use crate::sort::{matches_filter, sort_trails, TrailFilter, TrailSort};
use crate::store::{runs_to_stored, stored_to_runs, CoverageStore, Preferences};
use crate::units::MeasurementSystem;
use crate::{Coordinate, Trail, TrailId};

/// Notification that some model state changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// A different trail (or none) is now selected.
    TrailSelected(Option<TrailId>),
    /// The selection state machine advanced (pins placed, section extracted,
    /// selection cleared).
    SelectionChanged,
    /// A trail's coverage was edited; re-read its runs and metres.
    CoverageChanged(TrailId),
    /// A trail crossed the completion threshold. Fires exactly once per
    /// rising edge; dropping back below the threshold re-arms it.
    TrailCompleted(TrailId),
    /// Favourites or units changed.
    PreferencesChanged,
}

type Observer = Box<dyn Fn(&ModelEvent) + Send>;

/// Owner of all trail, coverage and selection state.
pub struct TrailModel {
    trails: Vec<Trail>,
    index: TrailIndex,
    coverages: HashMap<TrailId, Coverage>,
    selector: SectionSelector,
    selected: Option<TrailId>,
    prefs: Preferences,
    store: Option<CoverageStore>,
    observers: Vec<Observer>,
}

impl TrailModel {
    /// In-memory model with no persistence.
    pub fn new(trails: Vec<Trail>) -> Self {
        let index = TrailIndex::build(&trails);
        Self {
            trails,
            index,
            coverages: HashMap::new(),
            selector: SectionSelector::new(),
            selected: None,
            prefs: Preferences::default(),
            store: None,
            observers: Vec::new(),
        }
    }

    /// Model backed by a [`CoverageStore`]: coverage and preferences are read
    /// once here, and rewritten after each edit.
    pub fn with_store(trails: Vec<Trail>, store: CoverageStore) -> Self {
        let mut model = Self::new(trails);

        let stored = store.load_coverage();
        for (trail_id, runs) in stored {
            let Some(trail) = model.trails.iter().find(|t| t.id == trail_id) else {
                debug!("dropping stored coverage for unknown trail {trail_id}");
                continue;
            };
            let coverage = Coverage::from_runs(trail_id, stored_to_runs(&runs), trail);
            model.coverages.insert(trail_id, coverage);
        }
        model.prefs = store.load_preferences();
        model.store = Some(store);

        info!(
            "model ready: {} trails, {} with coverage",
            model.trails.len(),
            model.coverages.len()
        );
        model
    }

    /// Register a change observer. Observers see events after the state
    /// change they describe has been applied.
    pub fn subscribe(&mut self, observer: impl Fn(&ModelEvent) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&self, event: ModelEvent) {
        for observer in &self.observers {
            observer(&event);
        }
    }

    // ------------------------------------------------------------------
    // Trails
    // ------------------------------------------------------------------

    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    pub fn trail(&self, id: TrailId) -> Option<&Trail> {
        self.trails.iter().find(|t| t.id == id)
    }

    pub fn selected_trail(&self) -> Option<&Trail> {
        self.selected.and_then(|id| self.trail(id))
    }

    /// Select a trail (or pass `None` to deselect). Any in-progress section
    /// selection is discarded.
    pub fn select_trail(&mut self, id: Option<TrailId>) {
        let id = id.filter(|id| self.trail(*id).is_some());
        if self.selected == id {
            return;
        }
        self.selected = id;
        self.selector.cancel();
        self.emit(ModelEvent::TrailSelected(id));
    }

    /// Resolve a map tap to the nearest trail vertex and select that trail.
    /// No vertex within `max_delta` metres deselects. Returns the snap, if
    /// any.
    pub fn pick_trail(&mut self, coord: Coordinate, max_delta: f64) -> Option<Snap> {
        let snap = match self.selected_trail() {
            // With a trail selected, only that trail is considered
            Some(trail) => crate::locate::closest_vertex_on(trail, coord, max_delta),
            None => closest_vertex_indexed(coord, &self.trails, &self.index, max_delta),
        };
        self.select_trail(snap.map(|s| s.trail_id));
        snap
    }

    // ------------------------------------------------------------------
    // Section selection
    // ------------------------------------------------------------------

    /// Enter selection mode on the selected trail. Returns false if no trail
    /// is selected.
    pub fn start_selecting(&mut self) -> bool {
        if self.selected.is_none() {
            return false;
        }
        self.selector.begin();
        self.emit(ModelEvent::SelectionChanged);
        true
    }

    /// Leave selection mode, discarding pins.
    pub fn stop_selecting(&mut self) {
        if self.selector.is_selecting() {
            self.selector.cancel();
            self.emit(ModelEvent::SelectionChanged);
        }
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selector.state()
    }

    pub fn selection_pins(&self) -> Vec<Coordinate> {
        self.selector.pins()
    }

    /// The extracted section awaiting confirmation, if any.
    pub fn selected_section(&self) -> Option<&crate::Section> {
        self.selector.section()
    }

    /// Advance the selection with a tap, snapping against the selected
    /// trail. Ignored when no trail is selected or selection mode is off.
    pub fn tap(&mut self, coord: Coordinate, max_delta: f64) -> TapOutcome {
        let Some(trail) = self.selected.and_then(|id| self.trails.iter().find(|t| t.id == id))
        else {
            return TapOutcome::Ignored;
        };
        let outcome = self.selector.tap(trail, coord, max_delta);
        if outcome != TapOutcome::Ignored {
            self.emit(ModelEvent::SelectionChanged);
        }
        outcome
    }

    /// Whether confirming the current section would add new coverage.
    pub fn can_complete(&self) -> bool {
        match self.selector.section() {
            Some(section) => match self.coverages.get(&section.trail_id) {
                Some(coverage) => coverage.can_add(section),
                None => true,
            },
            None => false,
        }
    }

    /// Whether the current section overlaps existing coverage.
    pub fn can_uncomplete(&self) -> bool {
        match self.selector.section() {
            Some(section) => self
                .coverages
                .get(&section.trail_id)
                .map(|coverage| coverage.can_remove(section))
                .unwrap_or(false),
            None => false,
        }
    }

    /// Mark the selected section as walked. Returns false when there is no
    /// valid section to confirm.
    pub fn complete_selection(&mut self) -> bool {
        self.confirm_selection(true)
    }

    /// Unmark the selected section. Returns false when there is no valid
    /// section to confirm.
    pub fn uncomplete_selection(&mut self) -> bool {
        self.confirm_selection(false)
    }

    fn confirm_selection(&mut self, complete: bool) -> bool {
        let Some(section) = self.selector.take_section() else {
            return false;
        };
        let trail_id = section.trail_id;
        let Some(trail) = self.trails.iter().find(|t| t.id == trail_id) else {
            return false;
        };

        let coverage = self
            .coverages
            .entry(trail_id)
            .or_insert_with(|| Coverage::new(trail_id));
        if complete {
            coverage.add(&section, trail);
        } else {
            coverage.remove(&section, trail);
        }
        let covered = coverage.metres();
        let is_complete = coverage.is_complete(trail);

        info!(
            "{} {:.0}m on trail {trail_id}: {covered:.0}m of {:.0}m covered",
            if complete { "completed" } else { "uncompleted" },
            section.metres,
            trail.measured_metres()
        );

        // Rising-edge completion bookkeeping
        let newly_completed = is_complete && !self.prefs.completed.contains(&trail_id);
        if is_complete {
            self.prefs.completed.insert(trail_id);
        } else {
            self.prefs.completed.remove(&trail_id);
        }

        self.persist();
        self.emit(ModelEvent::SelectionChanged);
        self.emit(ModelEvent::CoverageChanged(trail_id));
        if newly_completed {
            self.emit(ModelEvent::TrailCompleted(trail_id));
        }
        true
    }

    // ------------------------------------------------------------------
    // Coverage queries
    // ------------------------------------------------------------------

    /// Completed runs of a trail, in trail order, for rendering as separate
    /// polylines.
    pub fn runs(&self, trail_id: TrailId) -> &[Vec<Coordinate>] {
        self.coverages
            .get(&trail_id)
            .map(|c| c.runs())
            .unwrap_or(&[])
    }

    /// Total completed distance on a trail in metres.
    pub fn completed_metres(&self, trail_id: TrailId) -> f64 {
        self.coverages.get(&trail_id).map(|c| c.metres()).unwrap_or(0.0)
    }

    /// Whether the trail has crossed the completion threshold.
    pub fn is_completed(&self, trail_id: TrailId) -> bool {
        self.prefs.completed.contains(&trail_id)
    }

    // ------------------------------------------------------------------
    // Preferences & presentation
    // ------------------------------------------------------------------

    pub fn is_favourite(&self, trail_id: TrailId) -> bool {
        self.prefs.favourites.contains(&trail_id)
    }

    pub fn toggle_favourite(&mut self, trail_id: TrailId) {
        if !self.prefs.favourites.remove(&trail_id) {
            self.prefs.favourites.insert(trail_id);
        }
        self.persist_prefs();
        self.emit(ModelEvent::PreferencesChanged);
    }

    pub fn measurement_system(&self) -> MeasurementSystem {
        self.prefs.system
    }

    pub fn set_measurement_system(&mut self, system: MeasurementSystem) {
        if self.prefs.system == system {
            return;
        }
        self.prefs.system = system;
        self.persist_prefs();
        self.emit(ModelEvent::PreferencesChanged);
    }

    /// Trails sorted for list display.
    pub fn sorted_trails(&self, sort: TrailSort, ascending: bool) -> Vec<&Trail> {
        let mut refs: Vec<&Trail> = self.trails.iter().collect();
        sort_trails(&mut refs, sort, ascending, &self.prefs.completed);
        refs
    }

    /// Trails matching a filter.
    pub fn filtered_trails(&self, filter: TrailFilter) -> Vec<&Trail> {
        self.trails
            .iter()
            .filter(|t| matches_filter(t, filter, &self.prefs.completed, &self.prefs.favourites))
            .collect()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    fn persist(&self) {
        let Some(store) = &self.store else { return };
        let doc: BTreeMap<TrailId, _> = self
            .coverages
            .iter()
            .filter(|(_, c)| !c.is_empty())
            .map(|(id, c)| (*id, runs_to_stored(c.runs())))
            .collect();
        store.save_coverage(&doc);
        store.save_preferences(&self.prefs);
    }

    fn persist_prefs(&self) {
        if let Some(store) = &self.store {
            store.save_preferences(&self.prefs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_trail;
    use std::sync::{Arc, Mutex};

    fn recording_model(trails: Vec<Trail>) -> (TrailModel, Arc<Mutex<Vec<ModelEvent>>>) {
        let mut model = TrailModel::new(trails);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        model.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        (model, events)
    }

    fn select_section(model: &mut TrailModel, from: Coordinate, to: Coordinate) {
        model.start_selecting();
        model.tap(from, f64::INFINITY);
        model.tap(to, f64::INFINITY);
        assert_eq!(model.selection_state(), SelectionState::SectionValid);
    }

    #[test]
    fn test_pick_trail_selects_and_deselects() {
        let (mut model, _) = recording_model(vec![test_trail(1, 10)]);

        let snap = model.pick_trail(Coordinate::new(54.0021, -2.0), 500.0);
        assert!(snap.is_some());
        assert_eq!(model.selected_trail().unwrap().id, 1);

        // A tap in the middle of nowhere deselects
        model.pick_trail(Coordinate::new(50.0, -5.0), 500.0);
        assert!(model.selected_trail().is_none());
    }

    #[test]
    fn test_complete_selection_updates_coverage() {
        let trail = test_trail(1, 10);
        let (v2, v5) = (trail.coords[2], trail.coords[5]);
        let (mut model, events) = recording_model(vec![trail]);

        model.select_trail(Some(1));
        select_section(&mut model, v2, v5);
        assert!(model.can_complete());
        assert!(!model.can_uncomplete());
        assert!(model.complete_selection());

        assert_eq!(model.runs(1).len(), 1);
        assert!(model.completed_metres(1) > 300.0);
        assert_eq!(model.selection_state(), SelectionState::Idle);

        let events = events.lock().unwrap();
        assert!(events.contains(&ModelEvent::CoverageChanged(1)));
        assert!(!events.contains(&ModelEvent::TrailCompleted(1)));
    }

    #[test]
    fn test_uncomplete_selection_removes_coverage() {
        let trail = test_trail(1, 10);
        let (v0, v9) = (trail.coords[0], trail.coords[9]);
        let (v4, v5) = (trail.coords[4], trail.coords[5]);
        let (mut model, _) = recording_model(vec![trail]);

        model.select_trail(Some(1));
        select_section(&mut model, v0, v9);
        model.complete_selection();
        assert_eq!(model.runs(1).len(), 1);

        select_section(&mut model, v4, v5);
        assert!(model.can_uncomplete());
        assert!(model.uncomplete_selection());
        assert_eq!(model.runs(1).len(), 2);
    }

    #[test]
    fn test_completion_event_fires_once_per_rising_edge() {
        let trail = test_trail(1, 10);
        let (v0, v9) = (trail.coords[0], trail.coords[9]);
        let (v4, v5) = (trail.coords[4], trail.coords[5]);
        let (mut model, events) = recording_model(vec![trail]);
        let completed_count =
            |events: &Arc<Mutex<Vec<ModelEvent>>>| {
                events
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|e| **e == ModelEvent::TrailCompleted(1))
                    .count()
            };

        model.select_trail(Some(1));
        select_section(&mut model, v0, v9);
        model.complete_selection();
        assert!(model.is_completed(1));
        assert_eq!(completed_count(&events), 1);

        // Re-confirming the same coverage must not re-fire the event
        select_section(&mut model, v0, v9);
        model.complete_selection();
        assert_eq!(completed_count(&events), 1);

        // Dropping below the threshold re-arms it
        select_section(&mut model, v4, v5);
        model.uncomplete_selection();
        assert!(!model.is_completed(1));

        select_section(&mut model, v4, v5);
        model.complete_selection();
        assert_eq!(completed_count(&events), 2);
    }

    #[test]
    fn test_selection_requires_selected_trail() {
        let (mut model, _) = recording_model(vec![test_trail(1, 10)]);

        assert!(!model.start_selecting());
        assert_eq!(
            model.tap(Coordinate::new(54.0, -2.0), f64::INFINITY),
            TapOutcome::Ignored
        );
    }

    #[test]
    fn test_switching_trail_discards_selection() {
        let trail = test_trail(1, 10);
        let v2 = trail.coords[2];
        let (mut model, _) = recording_model(vec![trail, test_trail(2, 10)]);

        model.select_trail(Some(1));
        model.start_selecting();
        model.tap(v2, f64::INFINITY);
        assert_eq!(model.selection_state(), SelectionState::AwaitingEnd);

        model.select_trail(Some(2));
        assert_eq!(model.selection_state(), SelectionState::Idle);
    }

    #[test]
    fn test_favourites_toggle() {
        let (mut model, events) = recording_model(vec![test_trail(1, 10)]);

        assert!(!model.is_favourite(1));
        model.toggle_favourite(1);
        assert!(model.is_favourite(1));
        model.toggle_favourite(1);
        assert!(!model.is_favourite(1));
        assert_eq!(
            events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| **e == ModelEvent::PreferencesChanged)
                .count(),
            2
        );
    }

    #[test]
    fn test_coverage_survives_store_round_trip() {
        let dir = std::env::temp_dir()
            .join(format!("trail-tracker-model-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let trail = test_trail(1, 10);
        let (v2, v5) = (trail.coords[2], trail.coords[5]);

        let mut model = TrailModel::with_store(vec![trail.clone()], CoverageStore::new(&dir));
        model.select_trail(Some(1));
        model.start_selecting();
        model.tap(v2, f64::INFINITY);
        model.tap(v5, f64::INFINITY);
        model.complete_selection();
        let metres = model.completed_metres(1);
        assert!(metres > 0.0);

        // A fresh model reads the same coverage back
        let reloaded = TrailModel::with_store(vec![trail], CoverageStore::new(&dir));
        assert_eq!(reloaded.runs(1).len(), 1);
        assert!((reloaded.completed_metres(1) - metres).abs() < 1e-9);
    }
}
