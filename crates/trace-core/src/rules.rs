//! Tunable thresholds for assembly and POI reduction.

use serde::{Deserialize, Serialize};

/// Configuration for polyline assembly and POI reduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReductionRules {
    /// POI budget per line; the marker count is subtracted from it
    pub max_poi: usize,
    /// Altitude margin increment for adaptive thinning, in meters
    pub margin_step_m: f64,
    /// Markers farther than this from a line are not attached to it
    pub marker_snap_max_dist_m: f64,
    /// Per-axis tolerance for endpoint matching during merge.
    /// 0 means exact floating-point equality.
    pub endpoint_match_epsilon_m: f64,
}

impl Default for ReductionRules {
    fn default() -> Self {
        Self {
            max_poi: 19,
            margin_step_m: 5.0,
            marker_snap_max_dist_m: 50.0,
            endpoint_match_epsilon_m: 0.0,
        }
    }
}
