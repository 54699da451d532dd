use serde::{Deserialize, Serialize};

use crate::models::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub path: Vec<GeoPoint>,
    pub distance_m: f64,
    /// `None` when the duration is unknown (straight-line fallback).
    pub duration_s: Option<f64>,
    pub is_fallback: bool,
}
