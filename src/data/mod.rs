use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use geojson::{Feature, GeoJson, Value};
use rayon::prelude::*;
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// Default location of the boundary dataset, relative to the launch directory
pub const DEFAULT_DATA_PATH: &str = "data/neighborhoods.json";

/// Stable feature identifier (the dataset's `OBJECTID`)
pub type FeatureId = i64;

/// A boundary ring as lon/lat pairs. GeoJSON rings repeat the first
/// coordinate at the end; drawing and hit-testing tolerate both forms.
pub type Ring = Vec<(f64, f64)>;

/// Geographic bounding box in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min_lon: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    /// Grow to include a single point
    pub fn include(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    /// Grow to cover another box
    pub fn merge(&mut self, other: &Bounds) {
        self.min_lon = self.min_lon.min(other.min_lon);
        self.min_lat = self.min_lat.min(other.min_lat);
        self.max_lon = self.max_lon.max(other.max_lon);
        self.max_lat = self.max_lat.max(other.max_lat);
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// One neighborhood boundary record. Identity is the integer id; every
/// descriptive attribute is optional and nothing mutates after load.
#[derive(Clone, Debug)]
pub struct Neighborhood {
    pub id: FeatureId,
    pub name: Option<String>,
    pub old_name: Option<String>,
    pub acres: Option<f64>,
    pub sq_miles: Option<f64>,
    /// Administrative planning-unit code
    pub npu: Option<String>,
    pub editor: Option<String>,
    pub edited: Option<DateTime<Utc>>,
    pub global_id: Option<String>,
    /// One or more polygons; within each, the first ring is the exterior
    /// and any following rings are holes
    pub polygons: Vec<Vec<Ring>>,
    pub bounds: Bounds,
}

/// The loaded boundary collection: ordered, read-only for the session.
/// Draw order is collection order, so later features sit on top.
pub struct NeighborhoodSet {
    features: Vec<Neighborhood>,
    bounds: Bounds,
}

impl NeighborhoodSet {
    /// Build a set from already-converted records, computing dataset bounds
    pub fn from_features(features: Vec<Neighborhood>) -> Self {
        let mut bounds = Bounds::empty();
        for feature in &features {
            bounds.merge(&feature.bounds);
        }
        Self { features, bounds }
    }

    /// Parse a GeoJSON FeatureCollection of neighborhood polygons
    pub fn from_geojson(text: &str) -> Result<Self> {
        let geojson: GeoJson = text.parse().context("invalid GeoJSON")?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(anyhow!("expected a FeatureCollection"));
        };

        let features: Vec<Neighborhood> = collection
            .features
            .into_par_iter()
            .filter_map(convert_feature)
            .collect();

        if features.is_empty() {
            return Err(anyhow!("no usable polygon features in collection"));
        }

        Ok(Self::from_features(features))
    }

    pub fn features(&self) -> &[Neighborhood] {
        &self.features
    }

    pub fn get(&self, id: FeatureId) -> Option<&Neighborhood> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Read and parse the boundary dataset from disk
pub fn load_neighborhoods(path: &Path) -> Result<NeighborhoodSet> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let set = NeighborhoodSet::from_geojson(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    tracing::info!(count = set.len(), path = %path.display(), "loaded neighborhood boundaries");
    Ok(set)
}

/// Kick off the one-time dataset load on a background thread. The receiver
/// yields exactly one message; the UI polls it without blocking, so the map
/// stays interactive while the load runs. There is no retry.
pub fn spawn_load(path: PathBuf) -> Receiver<Result<NeighborhoodSet>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(load_neighborhoods(&path));
    });
    rx
}

/// Convert one GeoJSON feature, or skip it with a warning when it lacks an
/// id or polygon geometry. Attribute conversion degrades to `None` per field.
fn convert_feature(feature: Feature) -> Option<Neighborhood> {
    let props = feature.properties.as_ref();

    let id = match props.and_then(|p| p.get("OBJECTID")).and_then(Json::as_i64) {
        Some(id) => id,
        None => {
            tracing::warn!("skipping feature without numeric OBJECTID");
            return None;
        }
    };

    let polygons = feature
        .geometry
        .as_ref()
        .map(|g| extract_polygons(&g.value))
        .unwrap_or_default();
    if polygons.is_empty() {
        tracing::warn!(id, "skipping feature without polygon geometry");
        return None;
    }

    let mut bounds = Bounds::empty();
    for rings in &polygons {
        for ring in rings {
            for &(lon, lat) in ring {
                bounds.include(lon, lat);
            }
        }
    }

    Some(Neighborhood {
        id,
        name: prop_str(props, "NAME"),
        old_name: prop_str(props, "OLDNAME"),
        acres: prop_f64(props, "ACRES"),
        sq_miles: prop_f64(props, "SQMILES"),
        npu: prop_str(props, "NPU"),
        editor: prop_str(props, "LASTEDITOR"),
        edited: prop_date(props, "LASTUPDATE"),
        global_id: prop_str(props, "GLOBALID"),
        polygons,
        bounds,
    })
}

/// Pull polygon rings out of any polygonal geometry value
fn extract_polygons(value: &Value) -> Vec<Vec<Ring>> {
    match value {
        Value::Polygon(rings) => vec![convert_rings(rings)],
        Value::MultiPolygon(polygons) => polygons.iter().map(|r| convert_rings(r)).collect(),
        Value::GeometryCollection(geometries) => geometries
            .iter()
            .flat_map(|g| extract_polygons(&g.value))
            .collect(),
        _ => Vec::new(),
    }
}

fn convert_rings(rings: &[Vec<Vec<f64>>]) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .filter(|c| c.len() >= 2)
                .map(|c| (c[0], c[1]))
                .collect()
        })
        .collect()
}

fn prop_str(props: Option<&geojson::JsonObject>, key: &str) -> Option<String> {
    let text = props?.get(key)?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn prop_f64(props: Option<&geojson::JsonObject>, key: &str) -> Option<f64> {
    props?.get(key)?.as_f64()
}

/// Edit dates arrive as epoch milliseconds (ArcGIS exports) or RFC 3339
/// strings; anything else reads as absent.
fn prop_date(props: Option<&geojson::JsonObject>, key: &str) -> Option<DateTime<Utc>> {
    match props?.get(key)? {
        Json::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        Json::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        _ => None,
    }
}
