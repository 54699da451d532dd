use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::delivery::DeliveryTarget;
use crate::models::geo::GeoPoint;
use crate::models::session::SessionSnapshot;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/accept", post(accept_delivery))
        .route("/session/cancel", post(cancel_delivery))
        .route("/session/complete", post(retry_completion))
}

/// The backend hands out numeric ids; the UI sometimes sends them as strings.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum DeliveryId {
    Number(u64),
    Text(String),
}

impl DeliveryId {
    fn into_string(self) -> String {
        match self {
            DeliveryId::Number(id) => id.to_string(),
            DeliveryId::Text(id) => id.trim().to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct AcceptDeliveryRequest {
    pub delivery_id: DeliveryId,
    pub destination: GeoPoint,
}

async fn get_session(State(state): State<Arc<AppState>>) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.session.snapshot().await?))
}

async fn accept_delivery(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AcceptDeliveryRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    payload.destination.validate()?;

    let target = DeliveryTarget {
        delivery_id: payload.delivery_id.into_string(),
        destination: payload.destination,
    };

    Ok(Json(state.session.accept(target).await?))
}

async fn cancel_delivery(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.session.cancel().await?))
}

async fn retry_completion(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.session.retry_completion().await?))
}
