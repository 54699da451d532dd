use serde::Serialize;

use crate::geo::haversine_m;
use crate::models::delivery::DeliveryTarget;
use crate::models::geo::TrackedPosition;

/// A courier closer than this to the destination has arrived.
pub const ARRIVAL_THRESHOLD_METERS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProximityReading {
    pub distance_m: f64,
    pub arrived: bool,
}

pub fn evaluate(position: &TrackedPosition, target: &DeliveryTarget) -> ProximityReading {
    let distance_m = haversine_m(&position.point, &target.destination);

    ProximityReading {
        distance_m,
        arrived: distance_m < ARRIVAL_THRESHOLD_METERS,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{evaluate, ARRIVAL_THRESHOLD_METERS};
    use crate::geo::destination_point;
    use crate::models::delivery::DeliveryTarget;
    use crate::models::geo::{GeoPoint, TrackedPosition};

    fn target() -> DeliveryTarget {
        DeliveryTarget {
            delivery_id: "42".to_string(),
            destination: GeoPoint::new(55.0, 37.0),
        }
    }

    fn position_at(distance_m: f64) -> TrackedPosition {
        let point = destination_point(&target().destination, 45.0, distance_m);
        TrackedPosition::new(point, Utc::now())
    }

    #[test]
    fn five_meters_away_counts_as_arrived() {
        let reading = evaluate(&position_at(5.0), &target());
        assert!((reading.distance_m - 5.0).abs() < 0.01);
        assert!(reading.arrived);
    }

    #[test]
    fn fifty_meters_away_is_still_en_route() {
        let reading = evaluate(&position_at(50.0), &target());
        assert!((reading.distance_m - 50.0).abs() < 0.01);
        assert!(!reading.arrived);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(!evaluate(&position_at(ARRIVAL_THRESHOLD_METERS + 0.05), &target()).arrived);
        assert!(evaluate(&position_at(ARRIVAL_THRESHOLD_METERS - 0.05), &target()).arrived);
    }
}
