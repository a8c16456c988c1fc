//! Session facade
//!
//! [`VideoSession`] owns the current [`ServiceState`] and drives it through
//! [`VideoLifecycle`] transitions. Calls are serialised; every committed
//! snapshot (including the one kept after a failure) is published as a
//! [`SessionEvent`].

use crate::config::CamSessionConfig;
use crate::error::{SessionError, SessionResult, TransitionResult};
use crate::event::{EventForwarder, EventStream, SessionEvent};
use crate::lifecycle::{HardwareContext, VideoLifecycle};
use crate::state::{Orientation, ServiceState, ServiceStateSummary};
use camsession_media::{BroadcastVideoSink, CameraEventListener};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Last committed snapshot as seen by readers
#[derive(Debug)]
struct Published {
    summary: ServiceStateSummary,
    local_sink: Option<Arc<BroadcastVideoSink>>,
}

impl Published {
    fn from_state(state: &ServiceState) -> Self {
        Self {
            summary: state.summary(),
            local_sink: state.video_state().local_sink().cloned(),
        }
    }
}

/// A call's local video resources
#[derive(Debug)]
pub struct VideoSession {
    lifecycle: VideoLifecycle,
    hardware: HardwareContext,
    forwarder: EventForwarder,
    events: broadcast::Sender<SessionEvent>,
    // None only while a transition holds the snapshot.
    state: Mutex<Option<ServiceState>>,
    // Readers never wait on a running transition.
    published: RwLock<Published>,
}

impl VideoSession {
    /// Create a session with no hardware open
    pub fn new(config: &CamSessionConfig, hardware: HardwareContext) -> SessionResult<Self> {
        config.validate()?;
        let lifecycle = VideoLifecycle::new(&config.session)?;
        let state = ServiceState::with_orientation(config.session.initial_orientation);
        info!("Created video session {}", state.session_id());

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            lifecycle,
            hardware,
            forwarder: EventForwarder::new(events.clone()),
            events,
            published: RwLock::new(Published::from_state(&state)),
            state: Mutex::new(Some(state)),
        })
    }

    /// Open the rendering context, local sink and camera
    pub fn start_video(&self) -> SessionResult<ServiceStateSummary> {
        self.transition(
            "initialize_video",
            |state| {
                let video = state.video_state();
                if video.camera().is_some() || video.render_context().is_some() {
                    return Err(invalid_state("video not initialized", "video initialized"));
                }
                Ok(())
            },
            |lifecycle, hardware, listener, state| {
                lifecycle.initialize_video(hardware, listener, state)
            },
        )
    }

    /// Replace the camera, keeping the rendering context and local sink
    pub fn restart_camera(&self) -> SessionResult<ServiceStateSummary> {
        self.transition(
            "reinitialize_camera",
            |state| {
                let video = state.video_state();
                if video.camera().is_none() || video.render_context().is_none() {
                    return Err(invalid_state("camera and rendering context", "no camera"));
                }
                Ok(())
            },
            |lifecycle, hardware, listener, state| {
                lifecycle.reinitialize_camera(hardware, listener, state)
            },
        )
    }

    /// Start the self-preview: camera frames flow through the orientation
    /// router into the local sink
    pub fn start_vanity(&self) -> SessionResult<ServiceStateSummary> {
        self.transition(
            "initialize_vanity_camera",
            |state| {
                let video = state.video_state();
                if video.camera().is_none() || video.local_sink().is_none() {
                    return Err(invalid_state("camera and local sink", "no camera"));
                }
                Ok(())
            },
            |lifecycle, _, _, state| lifecycle.initialize_vanity_camera(state),
        )
    }

    /// Turn local video on or off
    pub fn set_camera_enabled(&self, enabled: bool) -> SessionResult<ServiceStateSummary> {
        self.transition(
            "set_camera_enabled",
            |_| Ok(()),
            move |lifecycle, _, _, state| lifecycle.set_camera_enabled(state, enabled),
        )
    }

    /// Record a device rotation
    pub fn set_orientation(&self, orientation: Orientation) -> SessionResult<ServiceStateSummary> {
        self.transition(
            "set_orientation",
            |_| Ok(()),
            move |lifecycle, _, _, state| lifecycle.set_orientation(state, orientation),
        )
    }

    /// Release every hardware handle
    pub fn stop_video(&self) -> SessionResult<ServiceStateSummary> {
        self.transition(
            "deinitialize_video",
            |_| Ok(()),
            |lifecycle, _, _, state| lifecycle.deinitialize_video(state),
        )
    }

    /// Last committed snapshot
    pub fn summary(&self) -> ServiceStateSummary {
        self.published.read().summary.clone()
    }

    /// Local sink renderers attach to, while video is initialized
    pub fn local_sink(&self) -> Option<Arc<BroadcastVideoSink>> {
        self.published.read().local_sink.clone()
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    fn transition<C, T>(
        &self,
        operation: &'static str,
        check: C,
        run: T,
    ) -> SessionResult<ServiceStateSummary>
    where
        C: FnOnce(&ServiceState) -> SessionResult<()>,
        T: FnOnce(
            &VideoLifecycle,
            &HardwareContext,
            Arc<dyn CameraEventListener>,
            ServiceState,
        ) -> TransitionResult,
    {
        let mut slot = self.state.lock();
        let current = slot.take().ok_or_else(|| {
            invalid_state("a committed state", "state lost by an interrupted transition")
        })?;
        if let Err(err) = check(&current) {
            *slot = Some(current);
            return Err(err);
        }

        let listener: Arc<dyn CameraEventListener> = Arc::new(self.forwarder.clone());
        let (next, outcome) = match run(&self.lifecycle, &self.hardware, listener, current) {
            Ok(next) => (next, Ok(())),
            Err(err) => {
                let (kind, next) = err.into_parts();
                error!("{} failed: {}", operation, kind);
                (next, Err(kind))
            }
        };

        let published = Published::from_state(&next);
        let summary = published.summary.clone();
        *self.published.write() = published;
        *slot = Some(next);
        drop(slot);

        match outcome {
            Ok(()) => {
                self.forwarder.publish(SessionEvent::StateChanged {
                    operation,
                    summary: summary.clone(),
                });
                Ok(summary)
            }
            Err(kind) => {
                self.forwarder.publish(SessionEvent::TransitionFailed {
                    operation,
                    error: kind.to_string(),
                    summary,
                });
                Err(SessionError::Transition { operation, kind })
            }
        }
    }
}

impl Drop for VideoSession {
    fn drop(&mut self) {
        let Some(state) = self.state.get_mut().take() else {
            return;
        };
        match self.lifecycle.deinitialize_video(state) {
            Ok(state) => info!("Closed video session {}", state.session_id()),
            Err(err) => warn!("Video session closed uncleanly: {}", err),
        }
    }
}

fn invalid_state(expected: &str, actual: &str) -> SessionError {
    SessionError::InvalidState {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}
