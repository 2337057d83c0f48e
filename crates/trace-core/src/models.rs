//! Core data models for route traces, markers, and datasets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EngineError;

/// Classification of a point relative to its neighbours on a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelativePosition {
    /// First point of a line
    Start,
    /// Last point of a line
    End,
    /// Local maximum (strictly higher than both neighbours)
    High,
    /// Local minimum (strictly lower than both neighbours)
    Low,
    /// User-supplied waypoint snapped onto the line
    Marker,
    /// Unremarkable interior point
    #[default]
    None,
}

impl RelativePosition {
    /// Label used as the default POI name when the user supplied none.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelativePosition::Start => "Start",
            RelativePosition::End => "End",
            RelativePosition::High => "High",
            RelativePosition::Low => "Low",
            RelativePosition::Marker => "Marker",
            RelativePosition::None => "None",
        }
    }

    pub fn is_classified(&self) -> bool {
        !matches!(self, RelativePosition::None)
    }
}

/// One point of a line in the LV03 planar frame.
///
/// Points are value types: every transformation step returns new
/// points rather than mutating shared state, so a point can only ever
/// belong to one structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub easting: f64,
    pub northing: f64,
    /// Interpolated terrain elevation in meters
    pub alt: f64,
    /// Cumulative along-line distance from the line start in meters
    pub dist: f64,
    #[serde(default)]
    pub relative: RelativePosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Point {
    pub fn new(easting: f64, northing: f64, alt: f64, dist: f64) -> Self {
        Self {
            easting,
            northing,
            alt,
            dist,
            relative: RelativePosition::None,
            name: None,
            display: None,
            id: None,
        }
    }

    /// Build a point from one elevation-service sample.
    pub fn from_sample(sample: &ProfileSample) -> Self {
        Self::new(sample.easting, sample.northing, sample.alt, sample.dist)
    }

    /// Copy of this point with a different relative classification.
    pub fn with_relative(&self, relative: RelativePosition) -> Self {
        Self {
            relative,
            ..self.clone()
        }
    }
}

/// One record of the elevation service response, already reduced to a
/// single altitude source by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSample {
    pub dist: f64,
    pub easting: f64,
    pub northing: f64,
    pub alt: f64,
}

/// A geographic WGS84 coordinate as found in raw trace input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    pub lat: f64,
    pub lon: f64,
}

/// A named raw line fragment before assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub name: String,
    pub coords: Vec<GeoCoord>,
}

/// A user-supplied waypoint, already projected to LV03 but not yet
/// snapped onto any line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMarker {
    pub name: String,
    pub easting: f64,
    pub northing: f64,
}

/// A waypoint snapped onto a line. `index` is the index of the point
/// at which the marker sits within that line's sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    #[serde(flatten)]
    pub point: Point,
    pub index: usize,
}

/// Monotonic generator for line names and point ids.
///
/// Replaces the timestamp-based naming of earlier revisions, which
/// needed an artificial sleep to stay collision-free within one
/// millisecond.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    pub fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next);
        self.next += 1;
        id
    }

    /// Next `measure_generated_<n>` name not already used as a key.
    pub fn next_line_name(&mut self, taken: &BTreeMap<String, Vec<Point>>) -> String {
        loop {
            let name = self.next_id("measure_generated");
            if !taken.contains_key(&name) {
                return name;
            }
        }
    }

    pub fn next_point_id(&mut self) -> String {
        self.next_id("marker")
    }
}

/// The persisted unit for one uploaded trace: coordinate lines, their
/// reduced POI, and the snapped markers, all keyed by line name.
///
/// The three maps always carry identical key sets. Operations that
/// add, remove, or rename a line go through [`Dataset::insert_line`]
/// and [`Dataset::remove_line`] so no partial state is observable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub coords: BTreeMap<String, Vec<Point>>,
    pub poi: BTreeMap<String, Vec<Point>>,
    pub markers: BTreeMap<String, Vec<Marker>>,
    #[serde(default)]
    pub ids: IdSequence,
}

impl Dataset {
    pub fn line_names(&self) -> Vec<String> {
        self.coords.keys().cloned().collect()
    }

    /// Insert a line into all three maps at once.
    pub fn insert_line(&mut self, name: String, coords: Vec<Point>, markers: Vec<Marker>) {
        self.poi.insert(name.clone(), Vec::new());
        self.markers.insert(name.clone(), markers);
        self.coords.insert(name, coords);
    }

    /// Remove a line from all three maps. Returns false if absent.
    pub fn remove_line(&mut self, name: &str) -> bool {
        let found = self.coords.remove(name).is_some();
        self.poi.remove(name);
        self.markers.remove(name);
        found
    }

    /// Check that coords, poi, and markers agree on their key sets.
    ///
    /// A mismatch is a programming bug, not a user condition: the
    /// caller must abort instead of persisting the dataset.
    pub fn verify_consistency(&self) -> Result<(), EngineError> {
        let coords: Vec<&String> = self.coords.keys().collect();
        let poi: Vec<&String> = self.poi.keys().collect();
        let markers: Vec<&String> = self.markers.keys().collect();
        if coords != poi || coords != markers {
            return Err(EngineError::Consistency(format!(
                "key sets diverged: coords={:?} poi={:?} markers={:?}",
                coords, poi, markers
            )));
        }
        Ok(())
    }

    /// Rename one POI entry. Returns false when the line or index is
    /// unknown.
    pub fn set_poi_name(&mut self, line: &str, index: usize, name: &str) -> bool {
        match self.poi.get_mut(line).and_then(|poi| poi.get_mut(index)) {
            Some(point) => {
                point.name = Some(name.to_string());
                true
            }
            None => false,
        }
    }

    /// Set which POI entries of a line are displayed; everything not
    /// listed in `shown` is hidden. Returns false when the line is
    /// unknown.
    pub fn set_poi_display(&mut self, line: &str, shown: &[usize]) -> bool {
        match self.poi.get_mut(line) {
            Some(poi) => {
                for (i, point) in poi.iter_mut().enumerate() {
                    point.display = Some(shown.contains(&i));
                }
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_sequence_is_monotonic() {
        let mut ids = IdSequence::default();
        assert_eq!(ids.next_point_id(), "marker_0");
        assert_eq!(ids.next_point_id(), "marker_1");
        assert_eq!(ids.next_id("measure_generated"), "measure_generated_2");
    }

    #[test]
    fn test_line_name_skips_taken_keys() {
        let mut ids = IdSequence::default();
        let mut coords = BTreeMap::new();
        coords.insert("measure_generated_0".to_string(), Vec::new());
        assert_eq!(ids.next_line_name(&coords), "measure_generated_1");
    }

    #[test]
    fn test_insert_and_remove_keep_maps_aligned() {
        let mut dataset = Dataset::default();
        dataset.insert_line("measure_a".into(), vec![Point::new(0.0, 0.0, 0.0, 0.0)], Vec::new());
        dataset.verify_consistency().unwrap();

        assert!(dataset.remove_line("measure_a"));
        assert!(!dataset.remove_line("measure_a"));
        dataset.verify_consistency().unwrap();
    }

    #[test]
    fn test_consistency_violation_detected() {
        let mut dataset = Dataset::default();
        dataset
            .coords
            .insert("measure_a".into(), vec![Point::new(0.0, 0.0, 0.0, 0.0)]);
        assert!(dataset.verify_consistency().is_err());
    }

    #[test]
    fn test_set_poi_display_hides_unlisted() {
        let mut dataset = Dataset::default();
        dataset.insert_line("measure_a".into(), Vec::new(), Vec::new());
        dataset.poi.insert(
            "measure_a".into(),
            vec![
                Point::new(0.0, 0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0, 1.0),
                Point::new(2.0, 0.0, 0.0, 2.0),
            ],
        );

        assert!(dataset.set_poi_display("measure_a", &[1]));
        let poi = &dataset.poi["measure_a"];
        assert_eq!(poi[0].display, Some(false));
        assert_eq!(poi[1].display, Some(true));
        assert_eq!(poi[2].display, Some(false));

        assert!(!dataset.set_poi_display("measure_missing", &[]));
    }

    #[test]
    fn test_point_serde_round_trip() {
        let mut point = Point::new(600000.0, 200000.0, 550.0, 12.5);
        point.relative = RelativePosition::High;
        point.name = Some("Ridge".into());

        let json = serde_json::to_string(&point).unwrap();
        let back: Point = serde_json::from_str(&json).unwrap();
        assert_eq!(point, back);
        // Unset optional fields stay out of the serialized form
        assert!(!json.contains("display"));
    }
}
