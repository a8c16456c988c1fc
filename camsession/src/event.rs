//! Event system for session and camera events

use crate::state::ServiceStateSummary;
use camsession_media::{CameraEventListener, CameraState};
use tokio::sync::broadcast;
use tracing::debug;

/// Events published by a [`VideoSession`](crate::VideoSession)
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A transition committed a new snapshot
    StateChanged {
        /// Operation that produced the snapshot
        operation: &'static str,
        /// The new snapshot
        summary: ServiceStateSummary,
    },
    /// A transition failed; `summary` is the snapshot the session kept
    TransitionFailed {
        /// Operation that failed
        operation: &'static str,
        /// Error description
        error: String,
        /// The snapshot the session was left in
        summary: ServiceStateSummary,
    },
    /// The camera finished opening
    CameraInitialized,
    /// The camera finished switching direction
    CameraSwitched {
        /// State reported after the switch
        state: CameraState,
    },
}

impl SessionEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::StateChanged { .. } => "state_changed",
            SessionEvent::TransitionFailed { .. } => "transition_failed",
            SessionEvent::CameraInitialized => "camera_initialized",
            SessionEvent::CameraSwitched { .. } => "camera_switched",
        }
    }

    /// Check if this is a camera callback event
    pub fn is_camera_event(&self) -> bool {
        matches!(
            self,
            SessionEvent::CameraInitialized | SessionEvent::CameraSwitched { .. }
        )
    }

    /// Check if this is an error event
    pub fn is_error_event(&self) -> bool {
        matches!(self, SessionEvent::TransitionFailed { .. })
    }
}

/// Stream of session events for async iteration
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self { receiver }
    }

    /// Get the next event, or `None` once the session is gone.
    ///
    /// Events missed because the stream fell behind are skipped.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Event stream lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to get the next event without waiting
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!("Event stream lagged, skipped {} events", skipped);
                }
                Err(_) => return None,
            }
        }
    }
}

/// Forwards camera callbacks into the session's event channel
#[derive(Debug, Clone)]
pub(crate) struct EventForwarder {
    events: broadcast::Sender<SessionEvent>,
}

impl EventForwarder {
    pub(crate) fn new(events: broadcast::Sender<SessionEvent>) -> Self {
        Self { events }
    }

    pub(crate) fn publish(&self, event: SessionEvent) {
        debug!("Session event: {}", event.event_type());
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl CameraEventListener for EventForwarder {
    fn on_fully_initialized(&self) {
        self.publish(SessionEvent::CameraInitialized);
    }

    fn on_camera_switch_completed(&self, state: CameraState) {
        self.publish(SessionEvent::CameraSwitched { state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camsession_media::CameraDirection;

    #[test]
    fn test_event_classification() {
        assert!(SessionEvent::CameraInitialized.is_camera_event());
        let switched = SessionEvent::CameraSwitched {
            state: CameraState::new(CameraDirection::Back, true, 2),
        };
        assert!(switched.is_camera_event());
        assert!(!switched.is_error_event());
        assert_eq!(switched.event_type(), "camera_switched");
    }

    #[tokio::test]
    async fn test_forwarder_publishes_camera_callbacks() {
        let (tx, rx) = broadcast::channel(8);
        let forwarder = EventForwarder::new(tx);
        let mut stream = EventStream::new(rx);

        forwarder.on_fully_initialized();
        forwarder.on_camera_switch_completed(CameraState::UNKNOWN);

        assert!(matches!(stream.next().await, Some(SessionEvent::CameraInitialized)));
        assert!(matches!(
            stream.next().await,
            Some(SessionEvent::CameraSwitched { .. })
        ));
        assert!(stream.try_next().is_none());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let (tx, rx) = broadcast::channel(1);
        drop(rx);
        EventForwarder::new(tx).publish(SessionEvent::CameraInitialized);
    }
}
