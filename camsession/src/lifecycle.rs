//! Video resource lifecycle
//!
//! [`VideoLifecycle`] performs the four capture-resource transitions of a
//! call (and two small supplementary ones) against a [`ServiceState`]
//! snapshot. Every hardware call is made on the lifecycle's affinity thread;
//! the caller blocks until the transition has committed.
//!
//! Each operation consumes the current snapshot and returns its successor.
//! When a transition fails, the [`TransitionError`] carries the snapshot the
//! session is left in, so no camera or rendering context is ever orphaned.

use crate::config::SessionConfig;
use crate::error::{TransitionError, TransitionErrorKind, TransitionResult};
use crate::state::{Orientation, ServiceState};
use camsession_core::{AffinityThread, CoreResult};
use camsession_media::{
    BroadcastVideoSink, Camera, CameraDirection, CameraEventListener, CameraFactory, CameraState,
    OrientationAwareVideoSink, RenderContext, RenderContextFactory, SinkCapturerObserver,
    VideoSink,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Device factories a session creates its hardware from
#[derive(Clone)]
pub struct HardwareContext {
    render_contexts: Arc<dyn RenderContextFactory>,
    cameras: Arc<dyn CameraFactory>,
}

impl HardwareContext {
    /// Bundle a rendering-context factory and a camera factory
    pub fn new(
        render_contexts: Arc<dyn RenderContextFactory>,
        cameras: Arc<dyn CameraFactory>,
    ) -> Self {
        Self {
            render_contexts,
            cameras,
        }
    }
}

impl fmt::Debug for HardwareContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareContext").finish_non_exhaustive()
    }
}

/// Runs capture-resource transitions on a dedicated affinity thread
#[derive(Debug)]
pub struct VideoLifecycle {
    affinity: AffinityThread,
    default_direction: CameraDirection,
}

impl VideoLifecycle {
    /// Spawn the affinity thread described by `config`
    pub fn new(config: &SessionConfig) -> CoreResult<Self> {
        let affinity = AffinityThread::spawn(config.affinity_thread_name.clone())?;
        Ok(Self::with_affinity(affinity, config.default_direction))
    }

    /// Use an existing affinity thread
    pub fn with_affinity(affinity: AffinityThread, default_direction: CameraDirection) -> Self {
        Self {
            affinity,
            default_direction,
        }
    }

    /// Thread every hardware call runs on
    pub fn affinity(&self) -> &AffinityThread {
        &self.affinity
    }

    /// Camera direction used when none is active
    pub fn default_direction(&self) -> CameraDirection {
        self.default_direction
    }

    /// Create the rendering context, local sink and camera for a call.
    ///
    /// If the camera cannot be created the new rendering context is released
    /// and the error carries `state` unchanged.
    ///
    /// # Panics
    /// Panics if `state` already holds a camera or a rendering context.
    pub fn initialize_video(
        &self,
        hardware: &HardwareContext,
        listener: Arc<dyn CameraEventListener>,
        state: ServiceState,
    ) -> TransitionResult {
        assert!(
            state.video_state().camera().is_none() && state.video_state().render_context().is_none(),
            "initialize_video requires a state without camera or rendering context"
        );
        info!("Initializing video for session {}", state.session_id());

        let hardware = hardware.clone();
        let direction = self.default_direction;
        self.dispatch("initialize_video", state, move |state| {
            let render_context = match hardware.render_contexts.create() {
                Ok(render_context) => render_context,
                Err(err) => {
                    return Err(TransitionError::new(
                        "initialize_video",
                        TransitionErrorKind::RenderContextCreation(err),
                        state,
                    ))
                }
            };
            let handle = render_context.handle();
            debug!("Created {}", handle);
            let local_sink = Arc::new(BroadcastVideoSink::new(handle));

            let mut camera = match hardware.cameras.create(listener, handle, direction) {
                Ok(camera) => camera,
                Err(err) => {
                    release_render_context(render_context);
                    return Err(TransitionError::new(
                        "initialize_video",
                        TransitionErrorKind::CameraCreation(err),
                        state,
                    ));
                }
            };
            debug!("Created camera {} ({:?})", camera.id(), direction);
            camera.set_orientation(state.local_device_state().orientation.degrees());
            let camera_state = camera.camera_state();

            Ok(state
                .builder()
                .change_video_state()
                .render_context(Some(render_context))
                .local_sink(Some(local_sink))
                .camera(Some(camera))
                .commit()
                .change_local_device_state()
                .camera_state(camera_state)
                .commit()
                .build())
        })
    }

    /// Replace the camera while keeping the rendering context and local sink.
    ///
    /// The new camera opens in the previously active direction. If it cannot
    /// be created the error carries a snapshot with no camera and
    /// [`CameraState::UNKNOWN`].
    ///
    /// # Panics
    /// Panics if `state` lacks a camera or a rendering context.
    pub fn reinitialize_camera(
        &self,
        hardware: &HardwareContext,
        listener: Arc<dyn CameraEventListener>,
        state: ServiceState,
    ) -> TransitionResult {
        assert!(
            state.video_state().camera().is_some() && state.video_state().render_context().is_some(),
            "reinitialize_camera requires a state with camera and rendering context"
        );

        let previous = state.local_device_state().camera_state.active_direction;
        let direction = if previous.is_usable() {
            previous
        } else {
            self.default_direction
        };
        info!(
            "Reinitializing camera for session {} ({:?})",
            state.session_id(),
            direction
        );

        let hardware = hardware.clone();
        self.dispatch("reinitialize_camera", state, move |state| {
            let orientation = state.local_device_state().orientation;
            let handle = state.video_state().require_render_context().handle();

            let mut editor = state.builder().change_video_state();
            if let Some(camera) = editor.take_camera() {
                dispose_camera(camera);
            }

            match hardware.cameras.create(listener, handle, direction) {
                Ok(mut camera) => {
                    debug!("Created camera {} ({:?})", camera.id(), direction);
                    camera.set_orientation(orientation.degrees());
                    let camera_state = camera.camera_state();
                    Ok(editor
                        .camera(Some(camera))
                        .commit()
                        .change_local_device_state()
                        .camera_state(camera_state)
                        .commit()
                        .build())
                }
                Err(err) => {
                    let state = editor
                        .commit()
                        .change_local_device_state()
                        .camera_state(CameraState::UNKNOWN)
                        .commit()
                        .build();
                    Err(TransitionError::new(
                        "reinitialize_camera",
                        TransitionErrorKind::CameraCreation(err),
                        state,
                    ))
                }
            }
        })
    }

    /// Dispose the camera, release the rendering context and clear the video
    /// state. Disposal failures are logged and ignored.
    ///
    /// A state that holds nothing is returned as is.
    pub fn deinitialize_video(&self, state: ServiceState) -> TransitionResult {
        if state.video_state().is_cleared()
            && state.local_device_state().camera_state == CameraState::UNKNOWN
        {
            debug!("Video already deinitialized for session {}", state.session_id());
            return Ok(state);
        }
        info!("Deinitializing video for session {}", state.session_id());

        self.dispatch("deinitialize_video", state, |state| {
            let mut editor = state.builder().change_video_state();
            if let Some(camera) = editor.take_camera() {
                dispose_camera(camera);
            }
            if let Some(render_context) = editor.take_render_context() {
                release_render_context(render_context);
            }

            Ok(editor
                .local_sink(None)
                .commit()
                .change_local_device_state()
                .camera_state(CameraState::UNKNOWN)
                .commit()
                .build())
        })
    }

    /// Route the camera's frames through the self-preview orientation fix
    /// into the local sink, then enable the camera.
    ///
    /// A camera without a capturer is left alone; only the camera state is
    /// refreshed.
    ///
    /// # Panics
    /// Panics if `state` lacks a camera or a local sink.
    pub fn initialize_vanity_camera(&self, state: ServiceState) -> TransitionResult {
        assert!(
            state.video_state().camera().is_some() && state.video_state().local_sink().is_some(),
            "initialize_vanity_camera requires a state with camera and local sink"
        );
        info!("Starting vanity camera for session {}", state.session_id());

        self.dispatch("initialize_vanity_camera", state, |state| {
            let local_sink: Arc<dyn VideoSink> =
                Arc::clone(state.video_state().require_local_sink()) as Arc<dyn VideoSink>;
            let router: Arc<dyn VideoSink> = Arc::new(OrientationAwareVideoSink::new(local_sink));

            let mut builder = state.builder();
            let camera_state = match builder.camera_mut() {
                Some(camera) => {
                    if camera.has_capturer() {
                        camera.init_capturer(Box::new(SinkCapturerObserver::new(router)));
                        camera.set_enabled(true);
                    } else {
                        debug!("Camera {} has no capturer", camera.id());
                    }
                    camera.camera_state()
                }
                None => CameraState::UNKNOWN,
            };

            Ok(builder
                .change_local_device_state()
                .camera_state(camera_state)
                .commit()
                .build())
        })
    }

    /// Enable or disable the live camera and record the user's choice
    pub fn set_camera_enabled(&self, state: ServiceState, enabled: bool) -> TransitionResult {
        info!(
            "Setting local video {} for session {}",
            if enabled { "on" } else { "off" },
            state.session_id()
        );

        self.dispatch("set_camera_enabled", state, move |state| {
            let mut builder = state.builder();
            let camera_state = match builder.camera_mut() {
                Some(camera) => {
                    camera.set_enabled(enabled);
                    camera.camera_state()
                }
                None => builder.local_device_state().camera_state,
            };

            Ok(builder
                .change_call_info_state()
                .local_video_enabled(enabled)
                .commit()
                .change_local_device_state()
                .camera_state(camera_state)
                .commit()
                .build())
        })
    }

    /// Record a new device orientation and apply it to the live camera
    pub fn set_orientation(&self, state: ServiceState, orientation: Orientation) -> TransitionResult {
        debug!(
            "Orientation {:?} for session {}",
            orientation,
            state.session_id()
        );

        self.dispatch("set_orientation", state, move |state| {
            let mut builder = state.builder();
            if let Some(camera) = builder.camera_mut() {
                camera.set_orientation(orientation.degrees());
            }

            Ok(builder
                .change_local_device_state()
                .orientation(orientation)
                .commit()
                .build())
        })
    }

    /// Run `work` on the affinity thread, handing the snapshot back if the
    /// work never ran.
    fn dispatch<F>(&self, operation: &'static str, state: ServiceState, work: F) -> TransitionResult
    where
        F: FnOnce(ServiceState) -> TransitionResult + Send + 'static,
    {
        let slot = Arc::new(Mutex::new(Some(state)));
        let job_slot = Arc::clone(&slot);

        let outcome = self.affinity.run(move || {
            let state = job_slot.lock().take();
            state.map(work)
        });

        match outcome {
            Ok(Some(result)) => result,
            Ok(None) => unreachable!("{operation} ran without a state"),
            Err(err) => match slot.lock().take() {
                Some(state) => Err(TransitionError::new(
                    operation,
                    TransitionErrorKind::Dispatch(err),
                    state,
                )),
                None => unreachable!("{operation} consumed its state without finishing"),
            },
        }
    }
}

/// Stop and dispose a camera, logging instead of failing
fn dispose_camera(mut camera: Box<dyn Camera>) {
    let id = camera.id();
    camera.set_enabled(false);
    match camera.dispose() {
        Ok(()) => debug!("Disposed camera {}", id),
        Err(err) => warn!("Failed to dispose camera {}: {}", id, err),
    }
}

/// Release a rendering context, logging instead of failing
fn release_render_context(mut render_context: Box<dyn RenderContext>) {
    let handle = render_context.handle();
    match render_context.release() {
        Ok(()) => debug!("Released {}", handle),
        Err(err) => warn!("Failed to release {}: {}", handle, err),
    }
}
