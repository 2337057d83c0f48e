//! Service configuration from environment.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Elevation profile service endpoint
    pub profile_url: String,
    /// Altitude source to keep from the service response
    pub altitude_source: String,
    /// Per-request timeout in seconds
    pub profile_timeout_s: u64,
    /// How long cached profile responses stay fresh
    pub profile_cache_ttl_s: u64,
    /// SQLite database path
    pub db_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            profile_url: env::var("TRACE_PROFILE_URL").unwrap_or_else(|_| {
                "https://api3.geo.admin.ch/rest/services/profile.json".to_string()
            }),
            altitude_source: env::var("TRACE_ALTITUDE_SOURCE")
                .unwrap_or_else(|_| "DTM2".to_string()),
            profile_timeout_s: env::var("TRACE_PROFILE_TIMEOUT_S")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            profile_cache_ttl_s: env::var("TRACE_PROFILE_CACHE_TTL_S")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            db_path: env::var("TRACE_DB_PATH").unwrap_or_else(|_| "data/traces.db".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
