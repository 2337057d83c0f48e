//! Geometry and elevation-profile reduction engine for hand-drawn
//! route traces.
//!
//! Everything in this crate is synchronous and deterministic: pure
//! functions, or functions operating on a single [`Dataset`] value.
//! I/O (elevation service, persistence) lives in the service crate.

pub mod assembly;
pub mod error;
pub mod markers;
pub mod models;
pub mod poi;
pub mod rules;
pub mod spatial;
pub mod split;
pub mod swiss;

pub use assembly::{assemble, merge_lines};
pub use error::EngineError;
pub use markers::assign_markers;
pub use models::{
    Dataset, Fragment, GeoCoord, IdSequence, Marker, Point, ProfileSample, RawMarker,
    RelativePosition,
};
pub use poi::{generate_poi, reduce_line};
pub use rules::ReductionRules;
pub use spatial::{
    closest_point_on_polyline, closest_point_on_segment, dist_between, line_centers, points_equal,
};
pub use split::{split_line_at_marker, SplitOutcome};
pub use swiss::{lv03_to_wgs84, wgs84_to_lv03};
