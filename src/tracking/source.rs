use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::models::geo::TrackedPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    Unavailable,

    #[error("no position within the watch timeout")]
    Timeout,
}

pub type LocationSample = Result<TrackedPosition, LocationError>;

pub type LocationStream = Pin<Box<dyn Stream<Item = LocationSample> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the source may hand out on subscribe.
    pub maximum_age: Duration,
    /// Silence after which the watcher reports `LocationError::Timeout`.
    pub timeout: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout: Duration::from_millis(5000),
        }
    }
}

/// A continuous, push-based source of location fixes.
///
/// Every call to `watch` opens an independent subscription; dropping the
/// returned stream releases it.
pub trait LocationSource: Send + Sync {
    fn watch(&self, options: WatchOptions) -> LocationStream;
}

/// Location source fed from outside the process, e.g. a device agent posting
/// fixes over HTTP. Subscribers only see samples published after they
/// subscribed, so a stale fix is never replayed.
#[derive(Clone)]
pub struct LocationFeed {
    tx: broadcast::Sender<LocationSample>,
}

impl LocationFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns the number of subscriptions that received the sample.
    pub fn publish(&self, sample: LocationSample) -> usize {
        self.tx.send(sample).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl LocationSource for LocationFeed {
    fn watch(&self, _options: WatchOptions) -> LocationStream {
        let stream = BroadcastStream::new(self.tx.subscribe()).filter_map(|item| match item {
            Ok(sample) => Some(sample),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "location watcher lagged; dropping oldest samples");
                None
            }
        });

        Box::pin(stream)
    }
}
