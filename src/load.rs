//! Loading bundled trail data.
//!
//! Trails ship as a metadata JSON array plus one GeoJSON file per trail named
//! after it. Geometry positions are GeoJSON `[longitude, latitude]` order and
//! are rounded to the crate's coordinate precision on ingest, matching the
//! upstream data preparation — this is what lets persisted coverage compare
//! equal to freshly loaded geometry.

use std::fs;
use std::path::Path;

use geojson::{GeoJson, Value};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Coordinate, Country, Trail, TrailId};

/// One record of the bundled metadata file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailMetadata {
    pub id: TrailId,
    pub name: String,
    pub start: String,
    pub end: String,
    pub metres: f64,
    pub ascent: f64,
    pub descent: f64,
    pub country: Country,
    #[serde(default)]
    pub cycleway: bool,
}

/// Startup loading failures. Unlike coverage persistence, these are real
/// errors: without geometry there is nothing to track.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("invalid geometry for {trail}: {source}")]
    Geometry {
        trail: String,
        #[source]
        source: Box<geojson::Error>,
    },
    #[error("no line geometry in {trail}")]
    NoLineGeometry { trail: String },
}

/// Load every trail listed in the metadata file, reading each trail's
/// geometry from `geometry_dir/<name>.geojson`.
pub fn load_trails(metadata_path: &Path, geometry_dir: &Path) -> Result<Vec<Trail>, LoadError> {
    let raw = fs::read_to_string(metadata_path).map_err(|source| LoadError::Io {
        path: metadata_path.display().to_string(),
        source,
    })?;
    let metas: Vec<TrailMetadata> = serde_json::from_str(&raw)?;

    let mut trails = Vec::with_capacity(metas.len());
    for meta in metas {
        let path = geometry_dir.join(format!("{}.geojson", meta.name));
        let raw = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let geojson: GeoJson = raw.parse().map_err(|source| LoadError::Geometry {
            trail: meta.name.clone(),
            source: Box::new(source),
        })?;

        let coords = geometry_coords(&geojson);
        if coords.is_empty() {
            return Err(LoadError::NoLineGeometry { trail: meta.name });
        }

        info!("loaded {} with {} vertices", meta.name, coords.len());
        trails.push(Trail::new(meta, coords));
    }

    Ok(trails)
}

/// Collect all line geometry from a GeoJSON document, in document order.
/// Multi-part lines are concatenated — the upstream data prep already
/// stitches trail segments end to end.
fn geometry_coords(geojson: &GeoJson) -> Vec<Coordinate> {
    let mut coords = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(geometry) = &feature.geometry {
                    collect_lines(&geometry.value, &mut coords);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = &feature.geometry {
                collect_lines(&geometry.value, &mut coords);
            }
        }
        GeoJson::Geometry(geometry) => collect_lines(&geometry.value, &mut coords),
    }
    coords
}

fn collect_lines(value: &Value, out: &mut Vec<Coordinate>) {
    match value {
        Value::LineString(line) => {
            out.extend(line.iter().filter(|p| p.len() >= 2).map(position_to_coord));
        }
        Value::MultiLineString(lines) => {
            for line in lines {
                out.extend(line.iter().filter(|p| p.len() >= 2).map(position_to_coord));
            }
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_lines(&geometry.value, out);
            }
        }
        _ => {}
    }
}

// GeoJSON positions are [longitude, latitude]
fn position_to_coord(position: &Vec<f64>) -> Coordinate {
    Coordinate::new(position[1], position[0])
}
