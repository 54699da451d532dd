use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::models::geo::{GeoPoint, TrackedPosition};
use crate::state::AppState;
use crate::tracking::source::LocationError;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/positions", post(report_position))
        .route("/positions/errors", post(report_location_error))
}

#[derive(Deserialize)]
pub struct PositionReport {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub captured_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct LocationErrorReport {
    pub kind: LocationError,
}

#[derive(Serialize)]
pub struct FeedReceipt {
    pub delivered_to: usize,
}

async fn report_position(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PositionReport>,
) -> Result<(StatusCode, Json<FeedReceipt>), AppError> {
    let point = GeoPoint::try_new(payload.latitude, payload.longitude)?;

    let mut position = TrackedPosition::new(point, payload.captured_at.unwrap_or_else(Utc::now));
    if let Some(accuracy_m) = payload.accuracy_m {
        if !accuracy_m.is_finite() || accuracy_m < 0.0 {
            return Err(AppError::BadRequest(
                "accuracy_m must be a non-negative number".to_string(),
            ));
        }
        position = position.with_accuracy(accuracy_m);
    }

    let delivered_to = state.location_feed.publish(Ok(position));
    debug!(delivered_to, "location fix published");

    Ok((StatusCode::ACCEPTED, Json(FeedReceipt { delivered_to })))
}

async fn report_location_error(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LocationErrorReport>,
) -> (StatusCode, Json<FeedReceipt>) {
    let delivered_to = state.location_feed.publish(Err(payload.kind));
    debug!(delivered_to, error = %payload.kind, "location error published");

    (StatusCode::ACCEPTED, Json(FeedReceipt { delivered_to }))
}
