//! WGS84 <-> LV03 (CH1903) coordinate conversion.
//!
//! Fixed-coefficient polynomial approximations around the Bern datum
//! origin, as published by swisstopo. Closed-form and non-iterative;
//! accuracy is about 1 m within Switzerland. NaN and infinity inputs
//! propagate through the polynomials untouched.

/// Round degrees to 5 decimals (~1 m) to avoid implying false
/// precision.
fn clip_degree(d: f64, clip: bool) -> f64 {
    if clip {
        (d * 1e5).round() / 1e5
    } else {
        d
    }
}

/// Round meters to the next whole meter.
fn clip_meter(m: f64, clip: bool) -> f64 {
    if clip {
        m.round()
    } else {
        m
    }
}

fn ch_to_wgs_lat(east: f64, north: f64) -> f64 {
    // Auxiliary values relative to Bern
    let y_aux = (east - 600_000.0) / 1_000_000.0;
    let x_aux = (north - 200_000.0) / 1_000_000.0;
    let lat = 16.9023892 + 3.238272 * x_aux
        - 0.270978 * y_aux.powi(2)
        - 0.002528 * x_aux.powi(2)
        - 0.0447 * y_aux.powi(2) * x_aux
        - 0.0140 * x_aux.powi(3);
    // Unit 10000" to 1" and seconds to decimal degrees
    lat * 10_000.0 / 3_600.0
}

fn ch_to_wgs_lon(east: f64, north: f64) -> f64 {
    let y_aux = (east - 600_000.0) / 1_000_000.0;
    let x_aux = (north - 200_000.0) / 1_000_000.0;
    let lon = 2.6779094
        + 4.728982 * y_aux
        + 0.791484 * y_aux * x_aux
        + 0.1306 * y_aux * x_aux.powi(2)
        - 0.0436 * y_aux.powi(3);
    lon * 10_000.0 / 3_600.0
}

fn ch_to_wgs_height(east: f64, north: f64, height: f64) -> f64 {
    let y_aux = (east - 600_000.0) / 1_000_000.0;
    let x_aux = (north - 200_000.0) / 1_000_000.0;
    height + 49.55 - 12.60 * y_aux - 22.64 * x_aux
}

fn wgs_to_ch_east(lat: f64, lon: f64) -> f64 {
    // Decimal degrees to seconds
    let lat_aux = (lat * 3_600.0 - 169_028.66) / 10_000.0;
    let lon_aux = (lon * 3_600.0 - 26_782.5) / 10_000.0;
    600_072.37 + 211_455.93 * lon_aux
        - 10_938.51 * lon_aux * lat_aux
        - 0.36 * lon_aux * lat_aux.powi(2)
        - 44.54 * lon_aux.powi(3)
}

fn wgs_to_ch_north(lat: f64, lon: f64) -> f64 {
    let lat_aux = (lat * 3_600.0 - 169_028.66) / 10_000.0;
    let lon_aux = (lon * 3_600.0 - 26_782.5) / 10_000.0;
    200_147.07
        + 308_807.95 * lat_aux
        + 3_745.25 * lon_aux.powi(2)
        + 76.63 * lat_aux.powi(2)
        - 194.56 * lon_aux.powi(2) * lat_aux
        + 119.79 * lat_aux.powi(3)
}

fn wgs_to_ch_height(lat: f64, lon: f64, height: f64) -> f64 {
    let lat_aux = (lat * 3_600.0 - 169_028.66) / 10_000.0;
    let lon_aux = (lon * 3_600.0 - 26_782.5) / 10_000.0;
    height - 49.55 + 2.73 * lon_aux + 6.94 * lat_aux
}

/// Convert WGS84 latitude/longitude (decimal degrees) and ellipsoidal
/// height to LV03 `(east, north, height)`.
pub fn wgs84_to_lv03(lat: f64, lon: f64, height: f64, clip: bool) -> (f64, f64, f64) {
    (
        clip_meter(wgs_to_ch_east(lat, lon), clip),
        clip_meter(wgs_to_ch_north(lat, lon), clip),
        clip_meter(wgs_to_ch_height(lat, lon, height), clip),
    )
}

/// Convert LV03 `(east, north, height)` to WGS84
/// `(lat, lon, height)`.
pub fn lv03_to_wgs84(east: f64, north: f64, height: f64, clip: bool) -> (f64, f64, f64) {
    (
        clip_degree(ch_to_wgs_lat(east, north), clip),
        clip_degree(ch_to_wgs_lon(east, north), clip),
        clip_meter(ch_to_wgs_height(east, north, height), clip),
    )
}
