//! Dataset service: orchestrates ingest, split, and POI edits over
//! the engine, the elevation client, and persistence.
//!
//! Every operation leaves the stored dataset in its pre-call state on
//! failure: the engine works on values, and a dataset is only written
//! once the whole pipeline has succeeded. Concurrent edits against
//! the same dataset name must be serialized by the caller; the
//! routines here read-then-write the full triple.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use trace_core::{
    assemble, split_line_at_marker, wgs84_to_lv03, Dataset, EngineError, Fragment, GeoCoord,
    Point, RawMarker, ReductionRules,
};

use crate::elevation::{ElevationError, ProfileClient};
use crate::persistence::{datasets, Database};

/// A named waypoint as uploaded: one geographic coordinate plus a
/// label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerUpload {
    pub name: String,
    pub coord: GeoCoord,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input or internal invariant failure from the engine
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Elevation service unreachable, timed out, or shape mismatch.
    /// Distinct from computational errors; no retry is performed
    /// here, retry policy belongs to the caller.
    #[error(transparent)]
    Elevation(#[from] ElevationError),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub struct DatasetService {
    db: Database,
    profile: ProfileClient,
    rules: ReductionRules,
}

impl DatasetService {
    pub fn new(db: Database, profile: ProfileClient, rules: ReductionRules) -> Self {
        Self { db, profile, rules }
    }

    /// Build and persist a dataset from raw fragments and waypoints.
    ///
    /// Fragments are projected to LV03, augmented with distance and
    /// altitude by the elevation service, assembled into merged
    /// lines, and reduced to POI. Nothing is persisted unless every
    /// step succeeds.
    pub async fn ingest(
        &self,
        name: &str,
        fragments: &[Fragment],
        markers: &[MarkerUpload],
    ) -> Result<Dataset, ServiceError> {
        for fragment in fragments {
            if fragment.coords.len() < 2 {
                return Err(EngineError::MalformedInput(format!(
                    "fragment {} has {} coordinates, need at least 2",
                    fragment.name,
                    fragment.coords.len()
                ))
                .into());
            }
        }

        let mut lines: BTreeMap<String, Vec<Point>> = BTreeMap::new();
        for fragment in fragments {
            let planar: Vec<(f64, f64)> = fragment
                .coords
                .iter()
                .map(|c| {
                    let (east, north, _) = wgs84_to_lv03(c.lat, c.lon, 0.0, true);
                    (east, north)
                })
                .collect();

            let samples = self.profile.fetch_profile(&planar).await?;
            let points = samples.iter().map(Point::from_sample).collect();
            lines.insert(line_key(&fragment.name), points);
        }

        let raw_markers: Vec<RawMarker> = markers
            .iter()
            .map(|m| {
                let (east, north, _) = wgs84_to_lv03(m.coord.lat, m.coord.lon, 0.0, true);
                RawMarker {
                    name: m.name.clone(),
                    easting: east,
                    northing: north,
                }
            })
            .collect();

        let dataset = assemble(lines, &raw_markers, &self.rules)?;
        datasets::save_dataset(self.db.pool(), name, &dataset).await?;
        info!(
            dataset = name,
            lines = dataset.coords.len(),
            "Ingested trace"
        );
        Ok(dataset)
    }

    pub async fn load(&self, name: &str) -> Result<Option<Dataset>, ServiceError> {
        Ok(datasets::load_dataset(self.db.pool(), name).await?)
    }

    pub async fn delete(&self, name: &str) -> Result<bool, ServiceError> {
        let deleted = datasets::delete_dataset(self.db.pool(), name).await?;
        if deleted {
            info!(dataset = name, "Deleted dataset");
        }
        Ok(deleted)
    }

    /// Split a line of a stored dataset at one of its markers.
    ///
    /// Returns false when the dataset, line, or marker id is unknown;
    /// the stored dataset is untouched in that case.
    pub async fn split_line(
        &self,
        name: &str,
        line: &str,
        marker_id: &str,
    ) -> Result<bool, ServiceError> {
        let dataset = match datasets::load_dataset(self.db.pool(), name).await? {
            Some(dataset) => dataset,
            None => return Ok(false),
        };

        let outcome = match split_line_at_marker(&dataset, line, marker_id, &self.rules)? {
            Some(outcome) => outcome,
            None => return Ok(false),
        };

        datasets::save_dataset(self.db.pool(), name, &outcome.dataset).await?;
        info!(
            dataset = name,
            line = line,
            first = %outcome.first,
            second = %outcome.second,
            "Split line at marker"
        );
        Ok(true)
    }

    /// Rename one POI entry of a stored dataset.
    pub async fn rename_poi(
        &self,
        name: &str,
        line: &str,
        index: usize,
        new_name: &str,
    ) -> Result<bool, ServiceError> {
        let mut dataset = match datasets::load_dataset(self.db.pool(), name).await? {
            Some(dataset) => dataset,
            None => return Ok(false),
        };
        if !dataset.set_poi_name(line, index, new_name) {
            return Ok(false);
        }
        datasets::save_dataset(self.db.pool(), name, &dataset).await?;
        Ok(true)
    }

    /// Set which POI entries of a line are displayed.
    pub async fn set_poi_display(
        &self,
        name: &str,
        line: &str,
        shown: &[usize],
    ) -> Result<bool, ServiceError> {
        let mut dataset = match datasets::load_dataset(self.db.pool(), name).await? {
            Some(dataset) => dataset,
            None => return Ok(false),
        };
        if !dataset.set_poi_display(line, shown) {
            return Ok(false);
        }
        datasets::save_dataset(self.db.pool(), name, &dataset).await?;
        Ok(true)
    }
}

/// Line keys keep the `measure_` prefix of the upload format.
fn line_key(fragment_name: &str) -> String {
    if fragment_name.starts_with("measure") {
        fragment_name.to_string()
    } else {
        format!("measure_{}", fragment_name)
    }
}
