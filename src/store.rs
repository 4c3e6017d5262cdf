//! On-disk persistence for coverage and preferences.
//!
//! One JSON document maps trail ids to their completed runs, stored as nested
//! `[latitude, longitude]` arrays; a second holds user preferences. Both are
//! read once at startup and rewritten synchronously after each edit.
//! Persistence is best-effort: a missing or unreadable file means "nothing
//! completed yet", and write failures are logged and otherwise ignored — the
//! in-memory model stays authoritative.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::units::MeasurementSystem;
use crate::{Coordinate, TrailId};

const COVERAGE_FILE: &str = "coverage.json";
const PREFERENCES_FILE: &str = "preferences.json";

/// Completed runs of one trail as persisted: `[latitude, longitude]` pairs,
/// one inner array per run.
pub type StoredRuns = Vec<Vec<[f64; 2]>>;

/// Persisted user preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub favourites: BTreeSet<TrailId>,
    #[serde(default)]
    pub completed: BTreeSet<TrailId>,
    #[serde(default)]
    pub system: MeasurementSystem,
}

/// File-backed store rooted at a directory.
#[derive(Debug, Clone)]
pub struct CoverageStore {
    dir: PathBuf,
}

impl CoverageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load all persisted coverage. Absent or corrupt data yields an empty
    /// map.
    pub fn load_coverage(&self) -> BTreeMap<TrailId, StoredRuns> {
        read_json(&self.dir.join(COVERAGE_FILE)).unwrap_or_default()
    }

    /// Write all coverage. Failures are logged, never propagated.
    pub fn save_coverage(&self, coverage: &BTreeMap<TrailId, StoredRuns>) {
        write_json(&self.dir, &self.dir.join(COVERAGE_FILE), coverage);
    }

    pub fn load_preferences(&self) -> Preferences {
        read_json(&self.dir.join(PREFERENCES_FILE)).unwrap_or_default()
    }

    pub fn save_preferences(&self, prefs: &Preferences) {
        write_json(&self.dir, &self.dir.join(PREFERENCES_FILE), prefs);
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("ignoring unreadable {}: {err}", path.display());
            None
        }
    }
}

fn write_json<T: Serialize>(dir: &Path, path: &Path, value: &T) {
    if let Err(err) = fs::create_dir_all(dir) {
        warn!("cannot create {}: {err}", dir.display());
        return;
    }
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            warn!("cannot serialize {}: {err}", path.display());
            return;
        }
    };
    if let Err(err) = fs::write(path, json) {
        warn!("cannot write {}: {err}", path.display());
    }
}

/// Convert in-memory runs to the persisted `[lat, lng]` nesting.
pub fn runs_to_stored(runs: &[Vec<Coordinate>]) -> StoredRuns {
    runs.iter()
        .map(|run| run.iter().map(|c| [c.latitude, c.longitude]).collect())
        .collect()
}

/// Convert persisted runs back to coordinates (re-rounding on construction).
pub fn stored_to_runs(stored: &StoredRuns) -> Vec<Vec<Coordinate>> {
    stored
        .iter()
        .map(|run| run.iter().map(|p| Coordinate::new(p[0], p[1])).collect())
        .collect()
}
