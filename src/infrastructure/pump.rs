//! Async click ingestion.
//!
//! The network layer usually produces click notifications on its own tasks.
//! `ClickPump` drains a channel of `ClickEvent`s into a `ClickThrottle` on a
//! background task so producers never touch the throttle directly.
//!
//! **Requires the `async` feature.**

use crate::domain::actor::ClickEvent;
use crate::infrastructure::throttle::ClickThrottle;
use std::fmt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

/// Error returned when the pump task could not be joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownError {
    /// The pump task panicked
    Panicked,
    /// The pump task was cancelled before it finished
    Cancelled,
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownError::Panicked => write!(f, "click pump task panicked"),
            ShutdownError::Cancelled => write!(f, "click pump task was cancelled"),
        }
    }
}

impl std::error::Error for ShutdownError {}

impl From<JoinError> for ShutdownError {
    fn from(e: JoinError) -> Self {
        if e.is_panic() {
            ShutdownError::Panicked
        } else {
            ShutdownError::Cancelled
        }
    }
}

/// Spawns click ingestion tasks.
#[derive(Debug)]
pub struct ClickPump;

impl ClickPump {
    /// Feed every event from `events` into `throttle` until the channel
    /// closes or the handle asks it to stop.
    ///
    /// Must be called from within a tokio runtime. Dropping the handle stops
    /// the pump the same way `shutdown` does.
    pub fn spawn(throttle: ClickThrottle, mut events: mpsc::Receiver<ClickEvent>) -> PumpHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut pumped = 0u64;
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => {
                        // Refuse new events, then drain what is already queued
                        events.close();
                        while let Some(event) = events.recv().await {
                            throttle.record(event);
                            pumped += 1;
                        }
                        break;
                    }
                    event = events.recv() => match event {
                        Some(event) => {
                            throttle.record(event);
                            pumped += 1;
                        }
                        None => break,
                    },
                }
            }
            debug!(pumped, "click pump stopped");
            pumped
        });

        PumpHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

/// Handle to a running click pump.
#[derive(Debug)]
pub struct PumpHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<u64>,
}

impl PumpHandle {
    /// Stop the pump after draining queued events.
    ///
    /// Returns how many events the pump fed into the throttle.
    ///
    /// # Errors
    /// Returns `ShutdownError` if the task panicked or was cancelled.
    pub async fn shutdown(mut self) -> Result<u64, ShutdownError> {
        if let Some(stop) = self.stop.take() {
            // The task may already have exited on a closed channel
            let _ = stop.send(());
        }
        Ok(self.task.await?)
    }

    /// Whether the pump task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::{ActorId, ClickKind};
    use crate::infrastructure::mocks::{MockDirectory, RecordingGateway};
    use std::sync::Arc;
    use std::time::Instant;

    fn throttle() -> ClickThrottle {
        ClickThrottle::builder()
            .with_directory(Arc::new(MockDirectory::new()))
            .with_gateway(Arc::new(RecordingGateway::new()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let throttle = throttle();
        let (tx, rx) = mpsc::channel(64);
        let actor = ActorId::new(1);
        let now = Instant::now();

        for _ in 0..10 {
            tx.send(ClickEvent::new(actor, ClickKind::Primary, now))
                .await
                .unwrap();
        }

        let handle = ClickPump::spawn(throttle.clone(), rx);
        let pumped = handle.shutdown().await.unwrap();

        assert_eq!(pumped, 10);
        assert_eq!(throttle.window_len(actor, ClickKind::Primary), 10);
        assert!(tx.send(ClickEvent::new(actor, ClickKind::Primary, now)).await.is_err());
    }

    #[tokio::test]
    async fn test_pump_exits_when_senders_drop() {
        let throttle = throttle();
        let (tx, rx) = mpsc::channel(8);
        let handle = ClickPump::spawn(throttle.clone(), rx);

        tx.send(ClickEvent::new(ActorId::new(2), ClickKind::Secondary, Instant::now()))
            .await
            .unwrap();
        drop(tx);

        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
        assert_eq!(handle.shutdown().await.unwrap(), 1);
        assert_eq!(throttle.metrics().clicks_recorded(), 1);
    }

    #[test]
    fn test_shutdown_error_display() {
        assert_eq!(ShutdownError::Panicked.to_string(), "click pump task panicked");
        assert_eq!(ShutdownError::Cancelled.to_string(), "click pump task was cancelled");
    }
}
