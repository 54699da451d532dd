use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::geo::GeoPoint;
use crate::models::route::RouteEstimate;
use crate::state::AppState;

const MAX_ROUTE_TIMEOUT_MS: u64 = 30_000;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/routes/estimate", post(estimate_route))
}

#[derive(Deserialize)]
pub struct EstimateRouteRequest {
    /// Defaults to the session's current origin.
    pub origin: Option<GeoPoint>,
    pub destination: GeoPoint,
    pub timeout_ms: Option<u64>,
}

async fn estimate_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EstimateRouteRequest>,
) -> Result<Json<RouteEstimate>, AppError> {
    payload.destination.validate()?;

    let origin = match payload.origin {
        Some(origin) => {
            origin.validate()?;
            origin
        }
        None => state.session.snapshot().await?.origin,
    };

    let timeout = match payload.timeout_ms {
        Some(0) => return Err(AppError::BadRequest("timeout_ms must be > 0".to_string())),
        Some(ms) => Duration::from_millis(ms.min(MAX_ROUTE_TIMEOUT_MS)),
        None => state.routes.default_timeout(),
    };

    let estimate = state
        .routes
        .estimate_route(origin, payload.destination, timeout)
        .await;

    Ok(Json(estimate))
}
