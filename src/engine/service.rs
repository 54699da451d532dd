use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::client::deliveries::DeliveryApi;
use crate::engine::session::{
    CompletionOutcome, DeliverySession, PendingCompletion, SessionSettings, SessionUpdate,
    TrackerSignal,
};
use crate::error::AppError;
use crate::models::delivery::DeliveryTarget;
use crate::models::session::{SessionEvent, SessionSnapshot};
use crate::observability::metrics::Metrics;
use crate::tracking::tracker::PositionTracker;

pub enum SessionCommand {
    Accept {
        target: DeliveryTarget,
        reply: oneshot::Sender<Result<SessionSnapshot, AppError>>,
    },
    Cancel {
        reply: oneshot::Sender<Result<SessionSnapshot, AppError>>,
    },
    RetryCompletion {
        reply: oneshot::Sender<Result<SessionSnapshot, AppError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Dispose {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable front door to the session service task.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionCommand>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub async fn accept(&self, target: DeliveryTarget) -> Result<SessionSnapshot, AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Accept { target, reply }).await?;
        rx.await.map_err(unavailable)?
    }

    pub async fn cancel(&self) -> Result<SessionSnapshot, AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Cancel { reply }).await?;
        rx.await.map_err(unavailable)?
    }

    pub async fn retry_completion(&self) -> Result<SessionSnapshot, AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::RetryCompletion { reply }).await?;
        rx.await.map_err(unavailable)?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        rx.await.map_err(unavailable)
    }

    pub async fn dispose(&self) -> Result<(), AppError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Dispose { reply }).await?;
        rx.await.map_err(unavailable)
    }

    async fn send(&self, command: SessionCommand) -> Result<(), AppError> {
        self.tx
            .send(command)
            .await
            .map_err(|err| AppError::Internal(format!("session command send failed: {err}")))
    }
}

type SnapshotReply = oneshot::Sender<Result<SessionSnapshot, AppError>>;

/// Backend answer to a completion call that ran off the service loop.
struct CompletionDone {
    pending: PendingCompletion,
    result: Result<(), AppError>,
}

enum Input {
    Command(SessionCommand),
    Signal(TrackerSignal),
    Completion(CompletionDone),
}

fn unavailable(err: oneshot::error::RecvError) -> AppError {
    AppError::Internal(format!("session service dropped the request: {err}"))
}

/// Owns the single delivery session. Commands and tracker signals are
/// handled one at a time, so session fields need no locking. Backend
/// completion calls run on their own task and report back on a channel.
pub struct SessionService {
    session: DeliverySession,
    commands: mpsc::Receiver<SessionCommand>,
    signals: mpsc::UnboundedReceiver<TrackerSignal>,
    api: Arc<dyn DeliveryApi>,
    completions_tx: mpsc::UnboundedSender<CompletionDone>,
    completions: mpsc::UnboundedReceiver<CompletionDone>,
    retry_reply: Option<SnapshotReply>,
    events: broadcast::Sender<SessionEvent>,
    metrics: Metrics,
}

impl SessionService {
    pub fn new(
        tracker: PositionTracker,
        settings: SessionSettings,
        api: Arc<dyn DeliveryApi>,
        events: broadcast::Sender<SessionEvent>,
        metrics: Metrics,
        commands: mpsc::Receiver<SessionCommand>,
    ) -> Self {
        let (signal_tx, signals) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        Self {
            session: DeliverySession::new(tracker, signal_tx, settings),
            commands,
            signals,
            api,
            completions_tx,
            completions,
            retry_reply: None,
            events,
            metrics,
        }
    }

    pub async fn run(mut self) {
        info!("session service started");

        loop {
            let input = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => Input::Command(command),
                    None => break,
                },
                Some(signal) = self.signals.recv() => Input::Signal(signal),
                Some(done) = self.completions.recv() => Input::Completion(done),
            };

            match input {
                Input::Command(command) => self.handle_command(command),
                Input::Signal(signal) => self.handle_signal(signal),
                Input::Completion(done) => self.handle_completion(done),
            }
        }

        self.dispose();
        warn!("session service stopped: command channel closed");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Accept { target, reply } => {
                let _ = reply.send(self.accept(target));
            }
            SessionCommand::Cancel { reply } => {
                let _ = reply.send(self.cancel());
            }
            SessionCommand::RetryCompletion { reply } => match self.start_completion() {
                Ok(()) => self.retry_reply = Some(reply),
                Err(err) => {
                    let _ = reply.send(Err(err));
                }
            },
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot(Utc::now()));
            }
            SessionCommand::Dispose { reply } => {
                self.dispose();
                let _ = reply.send(());
            }
        }
    }

    fn accept(&mut self, target: DeliveryTarget) -> Result<SessionSnapshot, AppError> {
        let now = Utc::now();
        let delivery_id = target.delivery_id.clone();
        let session_id = self.session.accept_delivery(target, now)?;

        self.metrics.active_sessions.inc();
        self.publish(SessionEvent::Accepted {
            session_id,
            delivery_id,
            at: now,
        });

        Ok(self.session.snapshot(now))
    }

    fn cancel(&mut self) -> Result<SessionSnapshot, AppError> {
        let session_id = self.session.session_id();
        let target = self.session.cancel()?;

        self.metrics.active_sessions.dec();
        if let Some(session_id) = session_id {
            self.publish(SessionEvent::Cancelled {
                session_id,
                delivery_id: target.delivery_id,
            });
        }

        Ok(self.session.snapshot(Utc::now()))
    }

    /// Spawns the backend call so the loop keeps serving commands and
    /// signals while it runs.
    fn start_completion(&mut self) -> Result<(), AppError> {
        let pending = self.session.begin_completion()?;
        let api = self.api.clone();
        let done = self.completions_tx.clone();

        tokio::spawn(async move {
            let result = api.complete_delivery(&pending.report).await;
            let _ = done.send(CompletionDone { pending, result });
        });

        Ok(())
    }

    fn handle_completion(&mut self, done: CompletionDone) {
        let session_id = done.pending.session_id;
        let delivery_id = done.pending.report.delivery_id.clone();
        let result = match self.session.finish_completion(done.pending, done.result) {
            CompletionOutcome::Stale => {
                debug!(session_id = %session_id, "completion finished after the session moved on");
                return;
            }
            CompletionOutcome::Completed(report) => {
                self.metrics
                    .completions_total
                    .with_label_values(&["success"])
                    .inc();
                self.metrics.active_sessions.dec();
                self.publish(SessionEvent::Completed {
                    session_id,
                    delivery_id: report.delivery_id,
                    delivery_time_minutes: report.delivery_time_minutes,
                });
                Ok(self.session.snapshot(Utc::now()))
            }
            CompletionOutcome::Failed(err) => {
                self.metrics
                    .completions_total
                    .with_label_values(&["error"])
                    .inc();
                error!(delivery_id = %delivery_id, error = %err, "failed to report delivery completion");
                self.publish(SessionEvent::CompletionFailed {
                    session_id,
                    delivery_id,
                    error: err.to_string(),
                });
                Err(err)
            }
        };

        if let Some(reply) = self.retry_reply.take() {
            let _ = reply.send(result);
        }
    }

    fn handle_signal(&mut self, signal: TrackerSignal) {
        let now = Utc::now();
        let update = self.session.handle_signal(signal, now);
        let Some(session_id) = self.session.session_id() else {
            self.record_sample("ignored");
            return;
        };

        match update {
            SessionUpdate::Ignored => self.record_sample("ignored"),
            SessionUpdate::Moved(reading) => {
                self.record_sample("position");
                self.metrics.distance_to_target_meters.set(reading.distance_m);
                if let Some(position) = self.session.position() {
                    self.publish(SessionEvent::Position {
                        session_id,
                        position,
                        distance_m: reading.distance_m,
                        elapsed_seconds: self.session.elapsed_seconds(now),
                    });
                }
            }
            SessionUpdate::Arrived(reading) => {
                self.record_sample("position");
                self.metrics.distance_to_target_meters.set(reading.distance_m);
                self.publish(SessionEvent::Arrived {
                    session_id,
                    delivery_id: self
                        .session
                        .target()
                        .map(|target| target.delivery_id.clone())
                        .unwrap_or_default(),
                    distance_m: reading.distance_m,
                    elapsed_seconds: self.session.elapsed_seconds(now),
                });
                if let Err(err) = self.start_completion() {
                    warn!(error = %err, "could not start delivery completion");
                }
            }
            SessionUpdate::Degraded(error) => {
                self.record_sample("error");
                self.publish(SessionEvent::LocationDegraded {
                    session_id,
                    error: error.to_string(),
                    origin: self.session.origin(),
                });
            }
        }
    }

    fn dispose(&mut self) {
        if let Some(reply) = self.retry_reply.take() {
            let _ = reply.send(Err(AppError::Conflict(
                "delivery session disposed during completion".to_string(),
            )));
        }
        if self.session.state().is_active() {
            self.metrics.active_sessions.dec();
        }
        self.session.dispose();
    }

    fn record_sample(&self, kind: &str) {
        self.metrics
            .position_samples_total
            .with_label_values(&[kind])
            .inc();
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
