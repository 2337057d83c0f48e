//! Client for the remote elevation profile service.
//!
//! The service takes a planar LV03 line string and returns it as a
//! densified sequence of records carrying along-line distance and one
//! altitude per terrain model; only the configured source is kept.
//! Any transport failure or unexpected response shape is a hard
//! augmentation failure, with no partial or interpolated fallback.

use crate::config::Config;
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use thiserror::Error;
use trace_core::ProfileSample;

#[derive(Debug, Error)]
pub enum ElevationError {
    /// Service unreachable or timed out
    #[error("elevation service unreachable: {0}")]
    Unreachable(String),

    /// Service answered with a non-success status
    #[error("elevation service HTTP {0}")]
    Status(u16),

    /// Response did not match the expected shape
    #[error("elevation response shape mismatch: {0}")]
    Shape(String),
}

#[derive(Debug, Serialize)]
struct ProfileRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: &'a [(f64, f64)],
}

#[derive(Debug, Clone, Deserialize)]
struct ProfileRecord {
    dist: f64,
    easting: f64,
    northing: f64,
    alts: HashMap<String, f64>,
}

#[derive(Clone)]
struct CacheEntry {
    fetched_at: Instant,
    samples: Vec<ProfileSample>,
}

fn profile_cache() -> &'static DashMap<String, CacheEntry> {
    static CACHE: OnceLock<DashMap<String, CacheEntry>> = OnceLock::new();
    CACHE.get_or_init(DashMap::new)
}

fn cache_key(coords: &[(f64, f64)], source: &str) -> String {
    let mut key = String::from(source);
    for (east, north) in coords {
        key.push_str(&format!(":{:.2},{:.2}", east, north));
    }
    key
}

pub struct ProfileClient {
    client: Client,
    url: String,
    altitude_source: String,
    timeout: Duration,
    cache_ttl: Duration,
}

impl ProfileClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            url: config.profile_url.clone(),
            altitude_source: config.altitude_source.clone(),
            timeout: Duration::from_secs(config.profile_timeout_s.max(1)),
            cache_ttl: Duration::from_secs(config.profile_cache_ttl_s),
        }
    }

    /// Fetch the elevation profile for one fragment's planar
    /// coordinates.
    pub async fn fetch_profile(
        &self,
        coords: &[(f64, f64)],
    ) -> Result<Vec<ProfileSample>, ElevationError> {
        let key = cache_key(coords, &self.altitude_source);
        let cache = profile_cache();
        if let Some(entry) = cache.get(&key) {
            if entry.fetched_at.elapsed() <= self.cache_ttl {
                return Ok(entry.samples.clone());
            }
        }

        let separator = if self.url.contains('?') { "&" } else { "?" };
        let url = format!("{}{}sr=21781&distinct_points=true", self.url, separator);
        let body = ProfileRequest {
            kind: "LineString",
            coordinates: coords,
        };

        tracing::debug!(points = coords.len(), "Requesting elevation profile");
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| ElevationError::Unreachable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ElevationError::Status(response.status().as_u16()));
        }

        let records: Vec<ProfileRecord> = response
            .json()
            .await
            .map_err(|err| ElevationError::Shape(err.to_string()))?;

        let samples = select_altitude_source(&records, &self.altitude_source)?;
        cache.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                samples: samples.clone(),
            },
        );
        Ok(samples)
    }
}

/// Reduce service records to samples carrying the one configured
/// altitude source; every record must carry it.
fn select_altitude_source(
    records: &[ProfileRecord],
    source: &str,
) -> Result<Vec<ProfileSample>, ElevationError> {
    if records.len() < 2 {
        return Err(ElevationError::Shape(format!(
            "profile has {} records, need at least 2",
            records.len()
        )));
    }
    records
        .iter()
        .map(|record| {
            let alt = record.alts.get(source).copied().ok_or_else(|| {
                ElevationError::Shape(format!("record misses altitude source {}", source))
            })?;
            Ok(ProfileSample {
                dist: record.dist,
                easting: record.easting,
                northing: record.northing,
                alt,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_json() -> &'static str {
        r#"[
            {"dist": 0.0, "easting": 600000.0, "northing": 200000.0,
             "alts": {"DTM2": 542.1, "COMB": 542.0, "DTM25": 541.8}},
            {"dist": 125.5, "easting": 600100.0, "northing": 200075.0,
             "alts": {"DTM2": 561.9, "COMB": 561.7, "DTM25": 561.4}}
        ]"#
    }

    #[test]
    fn test_selects_configured_altitude_source() {
        let records: Vec<ProfileRecord> = serde_json::from_str(record_json()).unwrap();
        let samples = select_altitude_source(&records, "DTM2").unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].alt, 542.1);
        assert_eq!(samples[1].dist, 125.5);
        assert_eq!(samples[1].easting, 600100.0);
    }

    #[test]
    fn test_missing_source_is_shape_error() {
        let records: Vec<ProfileRecord> = serde_json::from_str(record_json()).unwrap();
        assert!(matches!(
            select_altitude_source(&records, "DTM99"),
            Err(ElevationError::Shape(_))
        ));
    }

    #[test]
    fn test_too_few_records_is_shape_error() {
        let records: Vec<ProfileRecord> =
            serde_json::from_str(r#"[{"dist": 0.0, "easting": 1.0, "northing": 2.0, "alts": {}}]"#)
                .unwrap();
        assert!(matches!(
            select_altitude_source(&records, "DTM2"),
            Err(ElevationError::Shape(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let coords = vec![(600000.0, 200000.0), (600100.0, 200075.0)];
        let body = ProfileRequest {
            kind: "LineString",
            coordinates: &coords,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "LineString");
        assert_eq!(json["coordinates"][0][0], 600000.0);
    }
}
