use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Panics when the coordinates are out of range.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        assert!(
            is_valid(latitude, longitude),
            "coordinates out of range: ({latitude}, {longitude})"
        );
        Self {
            latitude,
            longitude,
        }
    }

    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, AppError> {
        let point = Self {
            latitude,
            longitude,
        };
        point.validate()?;
        Ok(point)
    }

    /// Checks a point that arrived from outside the process, e.g. a request body.
    pub fn validate(&self) -> Result<(), AppError> {
        if is_valid(self.latitude, self.longitude) {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "coordinates out of range: latitude must be in [-90, 90] and longitude in [-180, 180], got ({}, {})",
                self.latitude, self.longitude
            )))
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid(self.latitude, self.longitude)
    }
}

fn is_valid(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

/// One location fix delivered by a location source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedPosition {
    pub point: GeoPoint,
    pub captured_at: DateTime<Utc>,
    pub accuracy_m: Option<f64>,
}

impl TrackedPosition {
    pub fn new(point: GeoPoint, captured_at: DateTime<Utc>) -> Self {
        Self {
            point,
            captured_at,
            accuracy_m: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::GeoPoint;

    #[test]
    fn accepts_boundary_coordinates() {
        assert!(GeoPoint::try_new(90.0, 180.0).is_ok());
        assert!(GeoPoint::try_new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(GeoPoint::try_new(90.5, 0.0).is_err());
        assert!(GeoPoint::try_new(0.0, -181.0).is_err());
        assert!(GeoPoint::try_new(f64::NAN, 0.0).is_err());
    }

    #[test]
    #[should_panic(expected = "coordinates out of range")]
    fn new_fails_fast_on_invalid_latitude() {
        let _ = GeoPoint::new(123.0, 37.0);
    }
}
