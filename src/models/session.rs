use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::delivery::DeliveryTarget;
use crate::models::geo::{GeoPoint, TrackedPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Tracking,
    Arrived,
    Completed,
    Cancelled,
}

impl SessionState {
    /// Tracking and Arrived hold a delivery; every other state accepts a new one.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Tracking | SessionState::Arrived)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub session_id: Option<Uuid>,
    pub target: Option<DeliveryTarget>,
    pub position: Option<TrackedPosition>,
    pub origin: GeoPoint,
    pub distance_m: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub elapsed_display: String,
    pub last_error: Option<String>,
    pub completion_pending: bool,
}

/// Broadcast to websocket clients as the session moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Accepted {
        session_id: Uuid,
        delivery_id: String,
        at: DateTime<Utc>,
    },
    Position {
        session_id: Uuid,
        position: TrackedPosition,
        distance_m: f64,
        elapsed_seconds: u64,
    },
    LocationDegraded {
        session_id: Uuid,
        error: String,
        origin: GeoPoint,
    },
    Arrived {
        session_id: Uuid,
        delivery_id: String,
        distance_m: f64,
        elapsed_seconds: u64,
    },
    Completed {
        session_id: Uuid,
        delivery_id: String,
        delivery_time_minutes: u64,
    },
    CompletionFailed {
        session_id: Uuid,
        delivery_id: String,
        error: String,
    },
    Cancelled {
        session_id: Uuid,
        delivery_id: String,
    },
}
