use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::models::geo::TrackedPosition;
use crate::tracking::source::{LocationError, LocationSource, WatchOptions};

/// Shared stop flag of one subscription. Callbacks run while holding the
/// flag's lock, so once `mark_stopped` returns no callback is in flight and
/// none will start.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionStatus {
    stopped: Arc<Mutex<bool>>,
}

impl SubscriptionStatus {
    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mark_stopped(&self) -> bool {
        let mut stopped = self.stopped.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let was_running = !*stopped;
        *stopped = true;
        was_running
    }

    fn run_if_active(&self, f: impl FnOnce()) -> bool {
        let stopped = self.stopped.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *stopped {
            return false;
        }
        f();
        true
    }
}

/// Owning handle of a running location watch. Stopping is idempotent and
/// also happens on drop.
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: u64,
    status: SubscriptionStatus,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.status.is_stopped()
    }

    pub fn stop(&mut self) {
        if self.status.mark_stopped() {
            debug!(subscription_id = self.id, "location subscription stopped");
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct PositionTracker {
    source: Arc<dyn LocationSource>,
    options: WatchOptions,
    latest: Arc<watch::Sender<Option<TrackedPosition>>>,
    next_id: AtomicU64,
}

impl PositionTracker {
    pub fn new(source: Arc<dyn LocationSource>, options: WatchOptions) -> Self {
        let (latest, _unused_rx) = watch::channel(None);
        Self {
            source,
            options,
            latest: Arc::new(latest),
            next_id: AtomicU64::new(1),
        }
    }

    /// Last position delivered by any subscription of this tracker.
    pub fn latest(&self) -> Option<TrackedPosition> {
        *self.latest.borrow()
    }

    /// Subscribes to the location source. Samples are handed to the callbacks
    /// in source order, one at a time. Source errors and watch timeouts go to
    /// `on_error` and the watch keeps running until the handle is stopped or
    /// the source closes.
    pub fn start_tracking<U, E>(&self, mut on_update: U, mut on_error: E) -> SubscriptionHandle
    where
        U: FnMut(TrackedPosition) + Send + 'static,
        E: FnMut(LocationError) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let status = SubscriptionStatus::default();
        let mut stream = self.source.watch(self.options);
        let silence = self.options.timeout;
        let latest = self.latest.clone();
        let task_status = status.clone();

        let task = tokio::spawn(async move {
            loop {
                let delivered = match timeout(silence, stream.next()).await {
                    Ok(Some(Ok(position))) => task_status.run_if_active(|| {
                        latest.send_replace(Some(position));
                        on_update(position);
                    }),
                    Ok(Some(Err(err))) => task_status.run_if_active(|| on_error(err)),
                    Ok(None) => {
                        debug!(subscription_id = id, "location source closed");
                        break;
                    }
                    Err(_elapsed) => {
                        task_status.run_if_active(|| on_error(LocationError::Timeout))
                    }
                };

                if !delivered {
                    break;
                }
            }
        });

        debug!(subscription_id = id, high_accuracy = self.options.high_accuracy, "location subscription started");

        SubscriptionHandle {
            id,
            status,
            task: Some(task),
        }
    }

    pub fn stop_tracking(&self, handle: &mut SubscriptionHandle) {
        handle.stop();
    }
}
