//! Per-session status broadcasting.
//!
//! The broadcaster decouples event production (fast, synchronous within a
//! run) from consumption (asynchronous, possibly zero observers, possibly
//! multiple). Events published while a session has no observer are
//! buffered and flushed, in order, to the first subscriber.
//!
//! A single mutex guards all per-session state. It is held only for
//! set/list mutation; delivery I/O always happens outside the critical
//! section, against a snapshot of the observer list.

use crate::core::{SessionId, SessionMessage};
use crate::errors::DeliveryError;
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Trait for observers that receive session messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventObserver: Send + Sync {
    /// Delivers one message to the observer.
    ///
    /// A returned error means the observer is gone (disconnected-peer
    /// semantics); the broadcaster drops it and keeps delivering to the
    /// rest.
    async fn deliver(&self, message: &SessionMessage) -> Result<(), DeliveryError>;
}

/// An observer backed by an unbounded channel of newline-delimited
/// JSON lines.
///
/// This is the transport-facing observer: a socket handler holds the
/// receiving end and forwards lines to the wire.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelObserver {
    /// Creates an observer and the receiver for its message lines.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventObserver for ChannelObserver {
    async fn deliver(&self, message: &SessionMessage) -> Result<(), DeliveryError> {
        self.tx
            .send(message.to_json_line())
            .map_err(|_| DeliveryError("channel receiver dropped".to_string()))
    }
}

#[derive(Default)]
struct SessionState {
    observers: Vec<Arc<dyn EventObserver>>,
    pending: Vec<SessionMessage>,
}

/// Tracks observers and undelivered messages per evaluation session.
#[derive(Default)]
pub struct StatusBroadcaster {
    sessions: Mutex<HashMap<SessionId, SessionState>>,
}

impl StatusBroadcaster {
    /// Creates an empty broadcaster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for a session.
    ///
    /// Any messages buffered while the session had no observer are
    /// flushed to the new observer immediately, in original order.
    pub async fn subscribe(&self, session_id: &SessionId, observer: Arc<dyn EventObserver>) {
        let pending = {
            let mut sessions = self.sessions.lock();
            let state = sessions.entry(session_id.clone()).or_default();
            state.observers.push(Arc::clone(&observer));
            std::mem::take(&mut state.pending)
        };

        for message in &pending {
            if let Err(err) = observer.deliver(message).await {
                warn!(session = %session_id, error = %err, "observer lost during buffer flush");
                self.unsubscribe(session_id, &observer);
                return;
            }
        }
    }

    /// Removes one observer from a session.
    ///
    /// If it was the last observer, the session's buffer is preserved so
    /// a future subscriber still receives history.
    pub fn unsubscribe(&self, session_id: &SessionId, observer: &Arc<dyn EventObserver>) {
        let mut sessions = self.sessions.lock();
        if let Some(state) = sessions.get_mut(session_id) {
            state.observers.retain(|o| !Arc::ptr_eq(o, observer));
        }
    }

    /// Publishes a message to a session.
    ///
    /// Delivers to every current observer; with no observers the message
    /// is buffered. Individual delivery failures drop the failing
    /// observer and never propagate out of this method.
    pub async fn publish(&self, session_id: &SessionId, message: SessionMessage) {
        let observers = {
            let mut sessions = self.sessions.lock();
            let state = sessions.entry(session_id.clone()).or_default();
            if state.observers.is_empty() {
                state.pending.push(message);
                return;
            }
            state.observers.clone()
        };

        let results = join_all(observers.iter().map(|observer| observer.deliver(&message))).await;
        let mut dead = Vec::new();
        for (observer, result) in observers.iter().zip(results) {
            if let Err(err) = result {
                debug!(session = %session_id, error = %err, "dropping disconnected observer");
                dead.push(Arc::clone(observer));
            }
        }

        if !dead.is_empty() {
            let mut sessions = self.sessions.lock();
            if let Some(state) = sessions.get_mut(session_id) {
                state
                    .observers
                    .retain(|o| !dead.iter().any(|d| Arc::ptr_eq(o, d)));
            }
        }
    }

    /// Disconnects all observers for a session and discards its buffer.
    ///
    /// Called once a run is known to have fully terminated.
    pub fn close(&self, session_id: &SessionId) {
        let removed = self.sessions.lock().remove(session_id);
        if let Some(state) = removed {
            debug!(
                session = %session_id,
                observers = state.observers.len(),
                buffered = state.pending.len(),
                "session closed"
            );
        }
    }

    /// Returns the number of live observers for a session.
    #[must_use]
    pub fn observer_count(&self, session_id: &SessionId) -> usize {
        self.sessions
            .lock()
            .get(session_id)
            .map_or(0, |s| s.observers.len())
    }

    /// Returns the number of buffered messages for a session.
    #[must_use]
    pub fn buffered_count(&self, session_id: &SessionId) -> usize {
        self.sessions
            .lock()
            .get(session_id)
            .map_or(0, |s| s.pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StageEvent, StageStatus};
    use parking_lot::Mutex as PlMutex;

    fn stage_msg(ordinal: usize, status: StageStatus, progress: u8) -> SessionMessage {
        SessionMessage::Stage(StageEvent::new("test", ordinal, status, progress, ""))
    }

    /// Observer that records deliveries and can be told to start failing.
    #[derive(Default)]
    struct RecordingObserver {
        received: PlMutex<Vec<SessionMessage>>,
        failing: PlMutex<bool>,
    }

    impl RecordingObserver {
        fn received(&self) -> Vec<SessionMessage> {
            self.received.lock().clone()
        }

        fn set_failing(&self, failing: bool) {
            *self.failing.lock() = failing;
        }
    }

    #[async_trait]
    impl EventObserver for RecordingObserver {
        async fn deliver(&self, message: &SessionMessage) -> Result<(), DeliveryError> {
            if *self.failing.lock() {
                return Err(DeliveryError("gone".to_string()));
            }
            self.received.lock().push(message.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publish_without_observers_buffers() {
        let broadcaster = StatusBroadcaster::new();
        let session = SessionId::new();

        broadcaster
            .publish(&session, stage_msg(0, StageStatus::Started, 0))
            .await;
        broadcaster
            .publish(&session, stage_msg(0, StageStatus::Completed, 12))
            .await;

        assert_eq!(broadcaster.buffered_count(&session), 2);
    }

    #[tokio::test]
    async fn test_late_subscriber_receives_buffer_in_order() {
        let broadcaster = StatusBroadcaster::new();
        let session = SessionId::new();

        for ordinal in 0..3 {
            broadcaster
                .publish(&session, stage_msg(ordinal, StageStatus::Started, 0))
                .await;
        }

        let observer = Arc::new(RecordingObserver::default());
        broadcaster
            .subscribe(&session, Arc::clone(&observer) as Arc<dyn EventObserver>)
            .await;

        let received = observer.received();
        assert_eq!(received.len(), 3);
        for (ordinal, message) in received.iter().enumerate() {
            match message {
                SessionMessage::Stage(event) => assert_eq!(event.ordinal, ordinal),
                other => panic!("unexpected message: {other:?}"),
            }
        }
        // Buffer delivered exactly once
        assert_eq!(broadcaster.buffered_count(&session), 0);
    }

    #[tokio::test]
    async fn test_two_observers_both_receive() {
        let broadcaster = StatusBroadcaster::new();
        let session = SessionId::new();

        let first = Arc::new(RecordingObserver::default());
        let second = Arc::new(RecordingObserver::default());
        broadcaster
            .subscribe(&session, Arc::clone(&first) as Arc<dyn EventObserver>)
            .await;
        broadcaster
            .subscribe(&session, Arc::clone(&second) as Arc<dyn EventObserver>)
            .await;

        broadcaster
            .publish(&session, stage_msg(0, StageStatus::Started, 0))
            .await;

        assert_eq!(first.received().len(), 1);
        assert_eq!(second.received().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_observer_dropped_others_still_delivered() {
        let broadcaster = StatusBroadcaster::new();
        let session = SessionId::new();

        let healthy = Arc::new(RecordingObserver::default());
        let broken = Arc::new(RecordingObserver::default());
        broken.set_failing(true);

        broadcaster
            .subscribe(&session, Arc::clone(&broken) as Arc<dyn EventObserver>)
            .await;
        broadcaster
            .subscribe(&session, Arc::clone(&healthy) as Arc<dyn EventObserver>)
            .await;

        broadcaster
            .publish(&session, stage_msg(0, StageStatus::Started, 0))
            .await;

        assert_eq!(healthy.received().len(), 1);
        assert_eq!(broadcaster.observer_count(&session), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_last_observer_preserves_buffer() {
        let broadcaster = StatusBroadcaster::new();
        let session = SessionId::new();

        let observer = Arc::new(RecordingObserver::default()) as Arc<dyn EventObserver>;
        broadcaster.subscribe(&session, Arc::clone(&observer)).await;
        broadcaster.unsubscribe(&session, &observer);

        broadcaster
            .publish(&session, stage_msg(0, StageStatus::Started, 0))
            .await;
        assert_eq!(broadcaster.buffered_count(&session), 1);

        // History survives to the next subscriber
        let next = Arc::new(RecordingObserver::default());
        broadcaster
            .subscribe(&session, Arc::clone(&next) as Arc<dyn EventObserver>)
            .await;
        assert_eq!(next.received().len(), 1);
    }

    #[tokio::test]
    async fn test_close_discards_everything() {
        let broadcaster = StatusBroadcaster::new();
        let session = SessionId::new();

        broadcaster
            .publish(&session, stage_msg(0, StageStatus::Started, 0))
            .await;
        let observer = Arc::new(RecordingObserver::default());
        broadcaster
            .subscribe(&session, Arc::clone(&observer) as Arc<dyn EventObserver>)
            .await;

        broadcaster.close(&session);
        assert_eq!(broadcaster.observer_count(&session), 0);
        assert_eq!(broadcaster.buffered_count(&session), 0);
    }

    #[tokio::test]
    async fn test_channel_observer_emits_json_lines() {
        let broadcaster = StatusBroadcaster::new();
        let session = SessionId::new();

        let (observer, mut rx) = ChannelObserver::new();
        broadcaster
            .subscribe(&session, Arc::new(observer) as Arc<dyn EventObserver>)
            .await;

        broadcaster
            .publish(&session, stage_msg(2, StageStatus::Completed, 37))
            .await;

        let line = rx.recv().await.unwrap();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["ordinal"], 2);
    }

    #[tokio::test]
    async fn test_channel_receiver_pending_until_publish() {
        let broadcaster = StatusBroadcaster::new();
        let session = SessionId::new();

        let (observer, mut rx) = ChannelObserver::new();
        broadcaster
            .subscribe(&session, Arc::new(observer) as Arc<dyn EventObserver>)
            .await;

        let mut recv = tokio_test::task::spawn(rx.recv());
        tokio_test::assert_pending!(recv.poll());

        broadcaster
            .publish(&session, stage_msg(0, StageStatus::Started, 0))
            .await;

        assert!(recv.is_woken());
        let line = tokio_test::assert_ready!(recv.poll()).unwrap();
        assert!(line.contains(r#""status":"started""#));
    }

    #[tokio::test]
    async fn test_mock_observer_receives_exactly_one_delivery() {
        let mut mock = MockEventObserver::new();
        mock.expect_deliver().times(1).returning(|_| Ok(()));

        let broadcaster = StatusBroadcaster::new();
        let session = SessionId::new();
        broadcaster
            .subscribe(&session, Arc::new(mock) as Arc<dyn EventObserver>)
            .await;
        broadcaster
            .publish(&session, stage_msg(0, StageStatus::Started, 0))
            .await;
    }

    #[tokio::test]
    async fn test_channel_observer_dropped_receiver_fails_delivery() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        let result = observer
            .deliver(&stage_msg(0, StageStatus::Started, 0))
            .await;
        assert!(result.is_err());
    }
}
