//! Polyline assembly: merging raw fragments into continuous lines
//! and running the full ingest pipeline.

use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::markers::assign_markers;
use crate::models::{Dataset, IdSequence, Point, RawMarker};
use crate::poi::generate_poi;
use crate::rules::ReductionRules;
use crate::spatial::points_equal;

enum MergeKind {
    /// `value` continues `other`: other + value[1..]
    AppendsTo,
    /// `value` precedes `other`: value + other[1..]
    PrecededBy,
}

/// Find one mergeable pair over an immutable snapshot of the map.
///
/// Returning a single candidate and re-scanning after each structural
/// change keeps the loop free of iterator invalidation and makes
/// termination explicit. O(n^3) worst case over hand-drawn fragment
/// counts, which stay tiny.
fn find_merge(
    coords: &BTreeMap<String, Vec<Point>>,
    epsilon: f64,
) -> Option<(String, String, MergeKind)> {
    for (key, value) in coords {
        for (k, v) in coords {
            if key == k || value.is_empty() || v.is_empty() {
                continue;
            }
            if points_equal(&value[0], &v[v.len() - 1], epsilon) {
                return Some((key.clone(), k.clone(), MergeKind::AppendsTo));
            }
            if points_equal(&value[value.len() - 1], &v[0], epsilon) {
                return Some((key.clone(), k.clone(), MergeKind::PrecededBy));
            }
        }
    }
    None
}

/// Merge fragments sharing endpoints until no pair matches.
///
/// Each merge removes the two source entries and inserts one freshly
/// named line whose appended half has its distances offset by the
/// leading half's final cumulative distance, keeping `dist`
/// monotonically non-decreasing. Returns whether anything merged, so
/// running it on an already-merged set is a detectable no-op.
pub fn merge_lines(
    coords: &mut BTreeMap<String, Vec<Point>>,
    ids: &mut IdSequence,
    rules: &ReductionRules,
) -> bool {
    let mut changed = false;
    while let Some((key, k, kind)) = find_merge(coords, rules.endpoint_match_epsilon_m) {
        let value = coords.remove(&key).unwrap();
        let other = coords.remove(&k).unwrap();

        let (mut combined, tail) = match kind {
            MergeKind::AppendsTo => (other, value),
            MergeKind::PrecededBy => (value, other),
        };
        let offset = combined[combined.len() - 1].dist;
        combined.extend(tail.into_iter().skip(1).map(|mut point| {
            point.dist += offset;
            point
        }));

        let name = ids.next_line_name(coords);
        coords.insert(name, combined);
        changed = true;
    }
    changed
}

/// Full ingest pipeline over augmented per-fragment point lists:
/// merge, marker snapping, POI generation, consistency check.
pub fn assemble(
    lines: BTreeMap<String, Vec<Point>>,
    raw_markers: &[RawMarker],
    rules: &ReductionRules,
) -> Result<Dataset, EngineError> {
    for (name, line) in &lines {
        if line.len() < 2 {
            return Err(EngineError::MalformedInput(format!(
                "fragment {} has {} points, need at least 2",
                name,
                line.len()
            )));
        }
    }

    let mut dataset = Dataset::default();
    let mut coords = lines;
    merge_lines(&mut coords, &mut dataset.ids, rules);
    let markers = assign_markers(&mut coords, raw_markers, rules, &mut dataset.ids)?;
    let poi = generate_poi(&coords, &markers, rules, &mut dataset.ids);

    dataset.coords = coords;
    dataset.markers = markers;
    dataset.poi = poi;
    dataset.verify_consistency()?;
    Ok(dataset)
}
