//! Great-circle distance and duration estimation
//!
//! Pure functions, no I/O. Used only to annotate orders and assignments;
//! a missing coordinate yields None, never an error, and the result never
//! affects control flow.

use crate::db::models::GeoPoint;
use serde::Serialize;

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Assumed average courier speed for duration estimates
const AVERAGE_SPEED_KMH: f64 = 50.0;

/// Distance annotation attached to order read models
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DistanceInfo {
    pub meters: f64,
    pub seconds: f64,
    pub distance_text: String,
    pub duration_text: String,
}

/// Haversine great-circle distance in meters
pub fn haversine_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Duration estimate in seconds at the assumed average speed
pub fn estimate_seconds(meters: f64) -> f64 {
    (meters / 1000.0) / AVERAGE_SPEED_KMH * 3600.0
}

/// Annotate the distance between two optional points.
/// Absence of either coordinate means "no distance available".
pub fn annotate(from: Option<&GeoPoint>, to: Option<&GeoPoint>) -> Option<DistanceInfo> {
    let from = from?;
    let to = to?;

    let meters = haversine_m((from.lat, from.lon), (to.lat, to.lon));
    let seconds = estimate_seconds(meters);

    Some(DistanceInfo {
        meters,
        seconds,
        distance_text: format_distance(meters),
        duration_text: format_duration(seconds),
    })
}

/// Coordinate sanity check for inbound payloads
pub fn is_valid_point(point: &GeoPoint) -> bool {
    (-90.0..=90.0).contains(&point.lat) && (-180.0..=180.0).contains(&point.lon)
}

fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round() as i64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).ceil() as i64;
    if minutes < 60 {
        format!("{minutes} min")
    } else {
        format!("{} h {} min", minutes / 60, minutes % 60)
    }
}
