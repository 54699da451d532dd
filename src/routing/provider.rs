use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::geo::GeoPoint;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Transport(String),

    #[error("routing service answered with status {0}")]
    Status(u16),

    #[error("routing response has no coordinates")]
    MissingCoordinates,

    #[error("malformed routing response: {0}")]
    Malformed(String),

    #[error("routing service did not answer within {after_ms} ms")]
    Timeout { after_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLocation {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRequest {
    pub locations: Vec<RouteLocation>,
    pub costing: String,
}

impl RouteRequest {
    pub fn between(origin: GeoPoint, destination: GeoPoint, costing: &str) -> Self {
        Self {
            locations: vec![
                RouteLocation {
                    id: "start".to_string(),
                    lat: origin.latitude,
                    lon: origin.longitude,
                    name: Some("Your location".to_string()),
                    kind: "start".to_string(),
                },
                RouteLocation {
                    id: "end".to_string(),
                    lat: destination.latitude,
                    lon: destination.longitude,
                    name: Some("Destination".to_string()),
                    kind: "end".to_string(),
                },
            ],
            costing: costing.to_string(),
        }
    }
}

/// A path as computed by the routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    pub path: Vec<GeoPoint>,
    pub distance_m: f64,
    pub duration_s: Option<f64>,
}

/// Wire shape of the routing endpoint's answer. Coordinates are `[lat, lon]`.
#[derive(Debug, Deserialize)]
pub struct RouteResponseBody {
    pub distance: Option<f64>,
    pub duration: Option<f64>,
    pub coordinates: Option<Vec<[f64; 2]>>,
}

impl TryFrom<RouteResponseBody> for RoutedPath {
    type Error = RoutingError;

    fn try_from(body: RouteResponseBody) -> Result<Self, Self::Error> {
        let coordinates = match body.coordinates {
            Some(coordinates) if !coordinates.is_empty() => coordinates,
            _ => return Err(RoutingError::MissingCoordinates),
        };

        let path = coordinates
            .into_iter()
            .map(|[lat, lon]| {
                GeoPoint::try_new(lat, lon)
                    .map_err(|_| RoutingError::Malformed(format!("invalid coordinate ({lat}, {lon})")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let distance_m = body
            .distance
            .filter(|distance| distance.is_finite() && *distance >= 0.0)
            .ok_or_else(|| RoutingError::Malformed("missing or invalid distance".to_string()))?;

        let duration_s = body
            .duration
            .filter(|duration| duration.is_finite() && *duration >= 0.0);

        Ok(RoutedPath {
            path,
            distance_m,
            duration_s,
        })
    }
}

#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn route(&self, request: &RouteRequest) -> Result<RoutedPath, RoutingError>;
}

/// Routing provider reached through the backend's `/routes/route` endpoint.
pub struct HttpRoutingProvider {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpRoutingProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            auth_token,
        }
    }

    fn url(&self) -> String {
        format!("{}/routes/route", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RoutingProvider for HttpRoutingProvider {
    async fn route(&self, request: &RouteRequest) -> Result<RoutedPath, RoutingError> {
        let mut builder = self.client.post(self.url()).json(request);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| RoutingError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Status(status.as_u16()));
        }

        let body = response
            .json::<RouteResponseBody>()
            .await
            .map_err(|err| RoutingError::Malformed(err.to_string()))?;

        RoutedPath::try_from(body)
    }
}
