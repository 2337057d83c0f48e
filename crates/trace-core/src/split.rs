//! Splitting a line in two at a snapped marker.

use crate::error::EngineError;
use crate::markers::partition_markers;
use crate::models::Dataset;
use crate::poi::generate_poi;
use crate::rules::ReductionRules;

/// Result of a successful split. `dataset` is a complete new value;
/// the input dataset is untouched, so persisting the outcome is
/// all-or-nothing from the caller's point of view.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub dataset: Dataset,
    pub first: String,
    pub second: String,
}

/// Split `line` at the marker identified by `marker_id`.
///
/// The marker's point is duplicated as the shared boundary so both
/// halves stay independently traversable. The second half's distances
/// are re-zeroed, markers are partitioned (a marker exactly at the
/// break lands in both halves), both halves get fresh generated
/// names, and POI is regenerated for every line, since POI budgets
/// depend on marker counts.
///
/// Returns `Ok(None)` when the line or marker does not exist; that is
/// an expected user-driven condition, not an error.
pub fn split_line_at_marker(
    dataset: &Dataset,
    line: &str,
    marker_id: &str,
    rules: &ReductionRules,
) -> Result<Option<SplitOutcome>, EngineError> {
    dataset.verify_consistency()?;

    let markers = match dataset.markers.get(line) {
        Some(markers) => markers,
        None => return Ok(None),
    };
    let marker = match markers.iter().find(|m| m.point.id.as_deref() == Some(marker_id)) {
        Some(marker) => marker,
        None => return Ok(None),
    };
    let points = &dataset.coords[line];
    let index = marker.index;
    if index >= points.len() {
        return Err(EngineError::Consistency(format!(
            "marker {} index {} outside line {} of length {}",
            marker_id,
            index,
            line,
            points.len()
        )));
    }

    let mut out = dataset.clone();

    let first_points = points[..=index].to_vec();
    let mut second_points = points[index..].to_vec();
    let base = second_points[0].dist;
    for point in &mut second_points {
        point.dist -= base;
    }

    let (first_markers, second_markers) = partition_markers(index, markers);

    out.remove_line(line);
    let first_name = out.ids.next_line_name(&out.coords);
    out.insert_line(first_name.clone(), first_points, first_markers);
    let second_name = out.ids.next_line_name(&out.coords);
    out.insert_line(second_name.clone(), second_points, second_markers);

    out.poi = generate_poi(&out.coords, &out.markers, rules, &mut out.ids);

    out.verify_consistency()?;
    Ok(Some(SplitOutcome {
        dataset: out,
        first: first_name,
        second: second_name,
    }))
}
