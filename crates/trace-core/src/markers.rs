//! Snapping user-supplied waypoints onto assembled lines.

use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::models::{IdSequence, Marker, Point, RawMarker};
use crate::rules::ReductionRules;
use crate::spatial::{closest_point_on_polyline, points_equal};

/// Snap every raw marker onto every line it lies close to.
///
/// Each accepted marker is also materialized inside the coordinate
/// line: it replaces a coordinate-equal vertex (exact equality is
/// reliable here because clamped projections return segment endpoints
/// verbatim) or is inserted at its segment index. The per-line marker
/// lists come back sorted by along-line distance. Markers farther
/// than `marker_snap_max_dist_m` from a line are not attached to it;
/// a marker close to several lines is attached to each.
pub fn assign_markers(
    coords: &mut BTreeMap<String, Vec<Point>>,
    raw: &[RawMarker],
    rules: &ReductionRules,
    ids: &mut IdSequence,
) -> Result<BTreeMap<String, Vec<Marker>>, EngineError> {
    let mut out: BTreeMap<String, Vec<Marker>> = BTreeMap::new();

    for (name, line) in coords.iter_mut() {
        let mut attached: Vec<Marker> = Vec::new();
        for waypoint in raw {
            let query = Point::new(waypoint.easting, waypoint.northing, 0.0, 0.0);
            let (mut snapped, dist, index) = closest_point_on_polyline(line, &query)?;
            if dist > rules.marker_snap_max_dist_m {
                continue;
            }
            snapped.name = Some(waypoint.name.clone());
            snapped.id = Some(ids.next_point_id());

            let marker_index = if points_equal(&snapped, &line[index - 1], 0.0) {
                line[index - 1] = snapped.clone();
                index - 1
            } else if points_equal(&snapped, &line[index], 0.0) {
                line[index] = snapped.clone();
                index
            } else {
                line.insert(index, snapped.clone());
                // Inserting shifts every later vertex, including ones
                // earlier markers point at
                for marker in &mut attached {
                    if marker.index >= index {
                        marker.index += 1;
                    }
                }
                index
            };

            attached.push(Marker {
                point: snapped,
                index: marker_index,
            });
        }
        attached.sort_by(|a, b| a.point.dist.total_cmp(&b.point.dist));
        out.insert(name.clone(), attached);
    }

    Ok(out)
}

/// Partition a line's markers at `break_index` for a split.
///
/// Markers at or beyond the break move to the second half with index
/// and distance rebased; a marker exactly at the break is duplicated
/// into both halves so each half keeps its boundary waypoint.
pub fn partition_markers(break_index: usize, markers: &[Marker]) -> (Vec<Marker>, Vec<Marker>) {
    let break_distance = markers
        .iter()
        .find(|m| m.index == break_index)
        .map(|m| m.point.dist)
        .unwrap_or(0.0);

    let mut first = Vec::new();
    let mut second = Vec::new();
    for marker in markers {
        if marker.index >= break_index {
            let mut moved = marker.clone();
            moved.index -= break_index;
            moved.point.dist -= break_distance;
            second.push(moved);
            if marker.index == break_index {
                first.push(marker.clone());
            }
        } else {
            first.push(marker.clone());
        }
    }
    (first, second)
}
