//! Planar geometry primitives: point-to-segment projection, polyline
//! snapping, and endpoint equality.

use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::models::{Point, RelativePosition};

/// Euclidean distance between two points in the LV03 plane.
pub fn dist_between(a: &Point, b: &Point) -> f64 {
    ((a.easting - b.easting).powi(2) + (a.northing - b.northing).powi(2)).sqrt()
}

/// Endpoint equality used for line merging and marker placement.
///
/// With `epsilon == 0.0` this is exact floating-point equality, which
/// is the historical behaviour: fragments whose endpoints differ by
/// any rounding error do not match. Upstream clipping does not reach
/// every code path, so callers can widen the policy per axis instead.
pub fn points_equal(a: &Point, b: &Point, epsilon: f64) -> bool {
    if epsilon == 0.0 {
        a.easting == b.easting && a.northing == b.northing
    } else {
        (a.easting - b.easting).abs() <= epsilon && (a.northing - b.northing).abs() <= epsilon
    }
}

/// Project `query` onto the segment `a`-`b`.
///
/// Returns `(distance, (easting, northing), t)` where `t` is the
/// clamped segment parameter in `[0, 1]`. When the perpendicular foot
/// falls outside the segment, the corresponding endpoint is returned
/// verbatim and the distance is the distance to that endpoint, not
/// the unclamped perpendicular distance.
pub fn closest_point_on_segment(a: &Point, b: &Point, query: &Point) -> (f64, (f64, f64), f64) {
    let dx = b.easting - a.easting;
    let dy = b.northing - a.northing;
    let det = dx * dx + dy * dy;

    if det == 0.0 {
        // Degenerate zero-length segment
        return (dist_between(a, query), (a.easting, a.northing), 0.0);
    }

    let t = (dx * (query.easting - a.easting) + dy * (query.northing - a.northing)) / det;

    if t < 0.0 {
        (dist_between(a, query), (a.easting, a.northing), 0.0)
    } else if t > 1.0 {
        (dist_between(b, query), (b.easting, b.northing), 1.0)
    } else {
        let foot = (a.easting + t * dx, a.northing + t * dy);
        let dist =
            ((query.easting - foot.0).powi(2) + (query.northing - foot.1).powi(2)).sqrt();
        (dist, foot, t)
    }
}

/// Find the closest place on a polyline to `query`.
///
/// Scans every consecutive segment and keeps the minimum. The
/// synthesized point carries `dist` and `alt` linearly interpolated
/// along the winning segment and is tagged `Marker`. The returned
/// index is the index of the point ending the winning segment (the
/// snap falls between `index - 1` and `index`). The input line is
/// never mutated.
pub fn closest_point_on_polyline(
    line: &[Point],
    query: &Point,
) -> Result<(Point, f64, usize), EngineError> {
    if line.len() < 2 {
        return Err(EngineError::MalformedInput(format!(
            "polyline needs at least 2 points, got {}",
            line.len()
        )));
    }

    let mut smallest = f64::INFINITY;
    let mut foot = (0.0, 0.0);
    let mut best_t = 0.0;
    let mut index = 0;
    for i in 1..line.len() {
        let (dist, point, t) = closest_point_on_segment(&line[i - 1], &line[i], query);
        if dist < smallest {
            smallest = dist;
            foot = point;
            best_t = t;
            index = i;
        }
    }

    let dalt = line[index].alt - line[index - 1].alt;
    let ddist = line[index].dist - line[index - 1].dist;
    let mut snapped = Point::new(
        foot.0,
        foot.1,
        line[index - 1].alt + best_t * dalt,
        line[index - 1].dist + best_t * ddist,
    );
    snapped.relative = RelativePosition::Marker;

    Ok((snapped, smallest, index))
}

/// Bounding-box center `(northing, easting)` of every line, for map
/// framing.
pub fn line_centers(coords: &BTreeMap<String, Vec<Point>>) -> BTreeMap<String, (f64, f64)> {
    let mut out = BTreeMap::new();
    for (name, line) in coords {
        let mut top = f64::NEG_INFINITY;
        let mut bottom = f64::INFINITY;
        let mut right = f64::NEG_INFINITY;
        let mut left = f64::INFINITY;
        for point in line {
            top = top.max(point.northing);
            bottom = bottom.min(point.northing);
            right = right.max(point.easting);
            left = left.min(point.easting);
        }
        out.insert(name.clone(), ((top + bottom) / 2.0, (left + right) / 2.0));
    }
    out
}
