//! POI reduction: extrema classification, adaptive thinning, and
//! marker merge-in.

use std::collections::BTreeMap;

use crate::models::{IdSequence, Marker, Point, RelativePosition};
use crate::rules::ReductionRules;
use crate::spatial::points_equal;

/// Tag every point of a line relative to its neighbours.
///
/// Endpoints are always `Start`/`End`; an interior point strictly
/// higher than both neighbours is `High`, strictly lower is `Low`,
/// anything else `None`. Returns new points, the input is untouched.
pub fn classify(line: &[Point]) -> Vec<Point> {
    let n = line.len();
    line.iter()
        .enumerate()
        .map(|(i, point)| {
            let relative = if i == 0 {
                RelativePosition::Start
            } else if i == n - 1 {
                RelativePosition::End
            } else if line[i - 1].alt < point.alt && point.alt > line[i + 1].alt {
                RelativePosition::High
            } else if line[i - 1].alt > point.alt && point.alt < line[i + 1].alt {
                RelativePosition::Low
            } else {
                RelativePosition::None
            };
            point.with_relative(relative)
        })
        .collect()
}

/// Adaptive thinning of the interior candidates.
///
/// Keeps every candidate whose altitude differs from both of its
/// candidate-list neighbours by at least the current margin. Whenever
/// the selection exceeds the budget the margin grows by one step and
/// selection restarts empty, so the loop terminates with at most
/// `budget` points biased toward the largest altitude swings.
fn thin_candidates(candidates: &[Point], budget: usize, margin_step: f64) -> Vec<Point> {
    let mut margin = 0.0;
    loop {
        let mut selected = Vec::new();
        for i in 1..candidates.len().saturating_sub(1) {
            let to_prev = (candidates[i].alt - candidates[i - 1].alt).abs();
            let to_next = (candidates[i].alt - candidates[i + 1].alt).abs();
            if to_prev >= margin && to_next >= margin {
                selected.push(candidates[i].clone());
            }
        }
        if selected.len() > budget {
            margin += margin_step;
        } else {
            return selected;
        }
    }
}

/// Merge the line endpoints and snapped markers into the thinned
/// selection, keeping the list sorted by distance.
fn insert_markers(poi: &mut Vec<Point>, start: Point, end: Point, markers: &[Marker]) {
    poi.insert(0, start);
    poi.push(end);

    for marker in markers {
        for i in 0..poi.len() {
            if points_equal(&poi[i], &marker.point, 0.0) {
                poi[i] = marker.point.clone();
                // Closed loop: a marker landing on the shared
                // first/last point names both ends
                if i == 0 && points_equal(&poi[i], &poi[poi.len() - 1], 0.0) {
                    let last = poi.len() - 1;
                    poi[last].name = marker.point.name.clone();
                }
                break;
            }
            if poi[i].dist > marker.point.dist {
                poi.insert(i, marker.point.clone());
                break;
            }
        }
    }
}

fn finalize(poi: &mut [Point], ids: &mut IdSequence) {
    let n = poi.len();
    for (i, point) in poi.iter_mut().enumerate() {
        if point.id.is_none() {
            point.id = Some(ids.next_point_id());
        }
        if point.name.is_none() {
            point.name = Some(point.relative.as_str().to_string());
        }
        point.display =
            Some(point.relative == RelativePosition::Marker || i == 0 || i == n - 1);
    }
}

/// Reduce one line to its POI list.
pub fn reduce_line(
    line: &[Point],
    markers: &[Marker],
    rules: &ReductionRules,
    ids: &mut IdSequence,
) -> Vec<Point> {
    if line.is_empty() {
        return Vec::new();
    }

    let classified = classify(line);
    let candidates: Vec<Point> = classified
        .iter()
        .filter(|p| p.relative.is_classified())
        .cloned()
        .collect();

    let budget = rules.max_poi.saturating_sub(markers.len());
    let mut poi = thin_candidates(&candidates, budget, rules.margin_step_m);

    let start = candidates[0].clone();
    let end = candidates[candidates.len() - 1].clone();
    insert_markers(&mut poi, start, end, markers);
    finalize(&mut poi, ids);
    poi
}

/// Generate the POI map for every line of a dataset.
pub fn generate_poi(
    coords: &BTreeMap<String, Vec<Point>>,
    markers: &BTreeMap<String, Vec<Marker>>,
    rules: &ReductionRules,
    ids: &mut IdSequence,
) -> BTreeMap<String, Vec<Point>> {
    let empty = Vec::new();
    let mut out = BTreeMap::new();
    for (name, line) in coords {
        let line_markers = markers.get(name).unwrap_or(&empty);
        out.insert(name.clone(), reduce_line(line, line_markers, rules, ids));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(easting: f64, alt: f64, dist: f64) -> Point {
        Point::new(easting, 0.0, alt, dist)
    }

    fn relatives(points: &[Point]) -> Vec<RelativePosition> {
        points.iter().map(|p| p.relative).collect()
    }

    #[test]
    fn test_classification_scenario() {
        let line = vec![
            pt(0.0, 10.0, 0.0),
            pt(10.0, 50.0, 10.0),
            pt(20.0, 5.0, 20.0),
            pt(30.0, 5.0, 30.0),
        ];
        let classified = classify(&line);
        assert_eq!(
            relatives(&classified),
            vec![
                RelativePosition::Start,
                RelativePosition::High,
                RelativePosition::Low,
                RelativePosition::End,
            ]
        );
    }

    #[test]
    fn test_reduction_keeps_all_within_budget() {
        let line = vec![
            pt(0.0, 10.0, 0.0),
            pt(10.0, 50.0, 10.0),
            pt(20.0, 5.0, 20.0),
            pt(30.0, 5.0, 30.0),
        ];
        let mut ids = IdSequence::default();
        let poi = reduce_line(&line, &[], &ReductionRules::default(), &mut ids);

        assert_eq!(poi.len(), 4);
        assert_eq!(
            relatives(&poi),
            vec![
                RelativePosition::Start,
                RelativePosition::High,
                RelativePosition::Low,
                RelativePosition::End,
            ]
        );
        // Only the endpoints are displayed, the rest stay hidden
        let displayed: Vec<bool> = poi.iter().map(|p| p.display.unwrap()).collect();
        assert_eq!(displayed, vec![true, false, false, true]);
        // Everyone got an id and a default name
        assert!(poi.iter().all(|p| p.id.is_some()));
        assert_eq!(poi[1].name.as_deref(), Some("High"));
    }

    #[test]
    fn test_thinning_escalates_margin_until_budget_fits() {
        // 30 alternating small peaks and valleys (amplitude 3 m):
        // margin 0 keeps all 30 candidates, margin 5 drops them all.
        let mut line = vec![pt(0.0, 100.0, 0.0)];
        for i in 0..30 {
            let alt = if i % 2 == 0 { 103.0 } else { 100.0 };
            line.push(pt((i + 1) as f64 * 10.0, alt, (i + 1) as f64 * 10.0));
        }
        line.push(pt(320.0, 100.0, 320.0));

        let mut ids = IdSequence::default();
        let poi = reduce_line(&line, &[], &ReductionRules::default(), &mut ids);

        assert!(poi.len() <= 19, "got {} POI", poi.len());
        assert!(poi.len() >= 2);
        assert_eq!(poi[0].relative, RelativePosition::Start);
        assert_eq!(poi[poi.len() - 1].relative, RelativePosition::End);
    }

    #[test]
    fn test_large_swings_survive_thinning() {
        // A single dominant peak among noise keeps its POI even after
        // the margin rises.
        let mut line = vec![pt(0.0, 100.0, 0.0)];
        for i in 0..30 {
            let alt = if i == 15 {
                400.0
            } else if i % 2 == 0 {
                103.0
            } else {
                100.0
            };
            line.push(pt((i + 1) as f64 * 10.0, alt, (i + 1) as f64 * 10.0));
        }
        line.push(pt(320.0, 100.0, 320.0));

        let mut ids = IdSequence::default();
        let poi = reduce_line(&line, &[], &ReductionRules::default(), &mut ids);

        assert!(poi.len() <= 19);
        assert!(
            poi.iter().any(|p| p.alt == 400.0),
            "dominant peak must survive"
        );
    }

    #[test]
    fn test_marker_overwrites_coinciding_poi() {
        let line = vec![pt(0.0, 10.0, 0.0), pt(10.0, 50.0, 10.0), pt(20.0, 5.0, 20.0)];
        let mut marker_point = pt(10.0, 50.0, 10.0);
        marker_point.relative = RelativePosition::Marker;
        marker_point.name = Some("Pass".into());
        marker_point.id = Some("marker_7".into());
        let markers = vec![Marker {
            point: marker_point,
            index: 1,
        }];

        let mut ids = IdSequence::default();
        let poi = reduce_line(&line, &markers, &ReductionRules::default(), &mut ids);

        assert_eq!(poi.len(), 3, "marker replaced the High entry in place");
        assert_eq!(poi[1].relative, RelativePosition::Marker);
        assert_eq!(poi[1].name.as_deref(), Some("Pass"));
        // The marker keeps its stable id through reduction
        assert_eq!(poi[1].id.as_deref(), Some("marker_7"));
        assert_eq!(poi[1].display, Some(true));
    }

    #[test]
    fn test_marker_inserted_by_distance() {
        let line = vec![pt(0.0, 10.0, 0.0), pt(10.0, 50.0, 10.0), pt(20.0, 5.0, 20.0)];
        let mut marker_point = pt(5.0, 30.0, 5.0);
        marker_point.relative = RelativePosition::Marker;
        marker_point.name = Some("Bridge".into());
        marker_point.id = Some("marker_3".into());
        let markers = vec![Marker {
            point: marker_point,
            index: 1,
        }];

        let mut ids = IdSequence::default();
        let poi = reduce_line(&line, &markers, &ReductionRules::default(), &mut ids);

        let dists: Vec<f64> = poi.iter().map(|p| p.dist).collect();
        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(poi[1].name.as_deref(), Some("Bridge"));
    }

    #[test]
    fn test_closed_loop_marker_names_both_ends() {
        // First and last point coincide; a marker on the start must
        // propagate its name to the end entry.
        let line = vec![
            pt(0.0, 10.0, 0.0),
            pt(10.0, 50.0, 10.0),
            pt(0.0, 10.0, 20.0),
        ];
        let mut marker_point = pt(0.0, 10.0, 0.0);
        marker_point.relative = RelativePosition::Marker;
        marker_point.name = Some("Trailhead".into());
        marker_point.id = Some("marker_0".into());
        let markers = vec![Marker {
            point: marker_point,
            index: 0,
        }];

        let mut ids = IdSequence::default();
        let poi = reduce_line(&line, &markers, &ReductionRules::default(), &mut ids);

        assert_eq!(poi[0].name.as_deref(), Some("Trailhead"));
        assert_eq!(poi[poi.len() - 1].name.as_deref(), Some("Trailhead"));
    }

    #[test]
    fn test_budget_shrinks_with_marker_count() {
        let flat: Vec<Point> = (0..5).map(|i| pt(i as f64, 100.0, i as f64)).collect();
        let markers: Vec<Marker> = (0..25)
            .map(|i| {
                let mut p = pt(i as f64 * 0.1, 100.0, i as f64 * 0.1);
                p.relative = RelativePosition::Marker;
                p.id = Some(format!("marker_{}", i));
                p.name = Some(format!("M{}", i));
                Marker { point: p, index: 1 }
            })
            .collect();

        // More markers than the budget: thinning must settle on an
        // empty selection instead of looping.
        let mut ids = IdSequence::default();
        let poi = reduce_line(&flat, &markers, &ReductionRules::default(), &mut ids);
        assert!(poi.len() >= 2);
    }
}
