use serde::{Deserialize, Serialize};

use crate::models::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub delivery_id: String,
    pub destination: GeoPoint,
}

/// Body of the backend's "complete delivery" call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub delivery_id: String,
    pub delivery_time_minutes: u64,
    pub rating: f64,
}
