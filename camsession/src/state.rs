//! Immutable service state and its transition builders
//!
//! A [`ServiceState`] is a complete snapshot of the session's local video
//! resources. It is never edited in place: [`ServiceState::builder`] consumes
//! the snapshot into a [`ServiceStateBuilder`] draft, field groups are edited
//! through scoped editors whose only way back to the draft is `commit()`, and
//! [`ServiceStateBuilder::build`] publishes a wholly new snapshot with the
//! next version number.
//!
//! Because the old snapshot is moved into the builder, hardware handles move
//! with it. No code can keep reading a superseded snapshot's camera or
//! rendering context.

use camsession_core::HandleId;
use camsession_media::{
    BroadcastVideoSink, Camera, CameraState, RenderContext, RenderContextHandle,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Physical rotation of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Upright
    #[default]
    Portrait,
    /// Rotated 90 degrees
    LandscapeLeft,
    /// Rotated 180 degrees
    PortraitUpsideDown,
    /// Rotated 270 degrees
    LandscapeRight,
}

impl Orientation {
    /// Rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            Orientation::Portrait => 0,
            Orientation::LandscapeLeft => 90,
            Orientation::PortraitUpsideDown => 180,
            Orientation::LandscapeRight => 270,
        }
    }

    /// Nearest quarter turn to an arbitrary sensor reading
    pub fn from_degrees(degrees: u32) -> Self {
        match ((degrees % 360) + 45) / 90 % 4 {
            0 => Orientation::Portrait,
            1 => Orientation::LandscapeLeft,
            2 => Orientation::PortraitUpsideDown,
            _ => Orientation::LandscapeRight,
        }
    }
}

/// Hardware handles and local sink owned by the current snapshot
#[derive(Default)]
pub struct VideoState {
    camera: Option<Box<dyn Camera>>,
    render_context: Option<Box<dyn RenderContext>>,
    local_sink: Option<Arc<BroadcastVideoSink>>,
}

impl VideoState {
    /// Live camera, if any
    pub fn camera(&self) -> Option<&dyn Camera> {
        self.camera.as_deref()
    }

    /// Live camera
    ///
    /// # Panics
    /// Panics if no camera is present.
    #[track_caller]
    pub fn require_camera(&self) -> &dyn Camera {
        match self.camera.as_deref() {
            Some(camera) => camera,
            None => panic!("video state has no camera"),
        }
    }

    /// Live rendering context, if any
    pub fn render_context(&self) -> Option<&dyn RenderContext> {
        self.render_context.as_deref()
    }

    /// Live rendering context
    ///
    /// # Panics
    /// Panics if no rendering context is present.
    #[track_caller]
    pub fn require_render_context(&self) -> &dyn RenderContext {
        match self.render_context.as_deref() {
            Some(context) => context,
            None => panic!("video state has no rendering context"),
        }
    }

    /// Local sink, if any
    pub fn local_sink(&self) -> Option<&Arc<BroadcastVideoSink>> {
        self.local_sink.as_ref()
    }

    /// Local sink
    ///
    /// # Panics
    /// Panics if no local sink is present.
    #[track_caller]
    pub fn require_local_sink(&self) -> &Arc<BroadcastVideoSink> {
        match self.local_sink.as_ref() {
            Some(sink) => sink,
            None => panic!("video state has no local sink"),
        }
    }

    /// Identity of the live camera
    pub fn camera_id(&self) -> Option<HandleId> {
        self.camera.as_ref().map(|camera| camera.id())
    }

    /// Handle of the live rendering context
    pub fn render_context_handle(&self) -> Option<RenderContextHandle> {
        self.render_context.as_ref().map(|context| context.handle())
    }

    /// Whether no handle and no sink is held
    pub fn is_cleared(&self) -> bool {
        self.camera.is_none() && self.render_context.is_none() && self.local_sink.is_none()
    }
}

impl fmt::Debug for VideoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoState")
            .field("camera", &self.camera_id())
            .field("render_context", &self.render_context_handle())
            .field("local_sink", &self.local_sink.is_some())
            .finish()
    }
}

/// Device-derived state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalDeviceState {
    /// Current device orientation
    pub orientation: Orientation,
    /// State reported by the most recently committed camera
    pub camera_state: CameraState,
}

/// Call-level flags carried through video transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallInfoState {
    /// Whether the user wants local video sent
    pub local_video_enabled: bool,
}

/// Complete immutable snapshot of the session's local video state
#[derive(Debug)]
pub struct ServiceState {
    session_id: Uuid,
    version: u64,
    video_state: VideoState,
    local_device_state: LocalDeviceState,
    call_info_state: CallInfoState,
}

impl ServiceState {
    /// Fresh session state with no hardware
    pub fn new() -> Self {
        Self::with_orientation(Orientation::default())
    }

    /// Fresh session state with a known device orientation
    pub fn with_orientation(orientation: Orientation) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            version: 0,
            video_state: VideoState::default(),
            local_device_state: LocalDeviceState {
                orientation,
                camera_state: CameraState::UNKNOWN,
            },
            call_info_state: CallInfoState::default(),
        }
    }

    /// Session this snapshot belongs to
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Number of snapshots published before this one
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Hardware handles and local sink
    pub fn video_state(&self) -> &VideoState {
        &self.video_state
    }

    /// Device orientation and camera state
    pub fn local_device_state(&self) -> &LocalDeviceState {
        &self.local_device_state
    }

    /// Call-level flags
    pub fn call_info_state(&self) -> &CallInfoState {
        &self.call_info_state
    }

    /// Start a transition from this snapshot
    pub fn builder(self) -> ServiceStateBuilder {
        ServiceStateBuilder { draft: self }
    }

    /// Hardware-free copy of what this snapshot holds
    pub fn summary(&self) -> ServiceStateSummary {
        ServiceStateSummary {
            session_id: self.session_id,
            version: self.version,
            camera: self.video_state.camera_id(),
            render_context: self.video_state.render_context_handle(),
            has_local_sink: self.video_state.local_sink.is_some(),
            orientation: self.local_device_state.orientation,
            camera_state: self.local_device_state.camera_state,
            local_video_enabled: self.call_info_state.local_video_enabled,
        }
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable view of a [`ServiceState`] without its hardware handles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStateSummary {
    /// Session identity
    pub session_id: Uuid,
    /// Snapshot version
    pub version: u64,
    /// Live camera identity
    pub camera: Option<HandleId>,
    /// Live rendering context
    pub render_context: Option<RenderContextHandle>,
    /// Whether a local sink is installed
    pub has_local_sink: bool,
    /// Device orientation
    pub orientation: Orientation,
    /// Derived camera state
    pub camera_state: CameraState,
    /// Local video flag
    pub local_video_enabled: bool,
}

/// Pending snapshot produced from a consumed [`ServiceState`]
#[must_use = "a builder does nothing until `build` is called"]
pub struct ServiceStateBuilder {
    draft: ServiceState,
}

impl ServiceStateBuilder {
    /// Edit the video field group
    pub fn change_video_state(self) -> VideoStateEditor {
        VideoStateEditor {
            builder: self,
            camera: None,
            render_context: None,
            local_sink: None,
        }
    }

    /// Edit the device field group
    pub fn change_local_device_state(self) -> LocalDeviceStateEditor {
        LocalDeviceStateEditor {
            builder: self,
            orientation: None,
            camera_state: None,
        }
    }

    /// Edit the call-info field group
    pub fn change_call_info_state(self) -> CallInfoStateEditor {
        CallInfoStateEditor {
            builder: self,
            local_video_enabled: None,
        }
    }

    /// Video fields as committed so far
    pub fn video_state(&self) -> &VideoState {
        &self.draft.video_state
    }

    /// Device fields as committed so far
    pub fn local_device_state(&self) -> &LocalDeviceState {
        &self.draft.local_device_state
    }

    /// Drive the draft's camera. Hardware calls are allowed; field changes
    /// still go through an editor.
    pub fn camera_mut(&mut self) -> Option<&mut (dyn Camera + 'static)> {
        self.draft.video_state.camera.as_deref_mut()
    }

    /// Publish the new snapshot
    pub fn build(self) -> ServiceState {
        let mut state = self.draft;
        state.version += 1;
        state
    }
}

impl fmt::Debug for ServiceStateBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceStateBuilder")
            .field("draft", &self.draft)
            .finish()
    }
}

/// Scoped editor for [`VideoState`]
#[must_use = "edits are dropped unless `commit` is called"]
pub struct VideoStateEditor {
    builder: ServiceStateBuilder,
    camera: Option<Option<Box<dyn Camera>>>,
    render_context: Option<Option<Box<dyn RenderContext>>>,
    local_sink: Option<Option<Arc<BroadcastVideoSink>>>,
}

impl VideoStateEditor {
    /// Install a camera into an empty slot
    ///
    /// # Panics
    /// Panics if the draft still holds a camera; move it out with
    /// [`take_camera`](Self::take_camera) and dispose it first.
    #[track_caller]
    pub fn camera(mut self, camera: Option<Box<dyn Camera>>) -> Self {
        if let Some(live) = self.builder.draft.video_state.camera.as_ref() {
            panic!("camera {} must be taken for disposal before it is replaced", live.id());
        }
        self.camera = Some(camera);
        self
    }

    /// Install a rendering context into an empty slot
    ///
    /// # Panics
    /// Panics if the draft still holds a rendering context; move it out with
    /// [`take_render_context`](Self::take_render_context) and release it first.
    #[track_caller]
    pub fn render_context(mut self, render_context: Option<Box<dyn RenderContext>>) -> Self {
        if let Some(live) = self.builder.draft.video_state.render_context.as_ref() {
            panic!("{} must be taken for release before it is replaced", live.handle());
        }
        self.render_context = Some(render_context);
        self
    }

    /// Replace the local sink
    pub fn local_sink(mut self, local_sink: Option<Arc<BroadcastVideoSink>>) -> Self {
        self.local_sink = Some(local_sink);
        self
    }

    /// Move the draft's camera out, e.g. to dispose it
    pub fn take_camera(&mut self) -> Option<Box<dyn Camera>> {
        self.builder.draft.video_state.camera.take()
    }

    /// Move the draft's rendering context out, e.g. to release it
    pub fn take_render_context(&mut self) -> Option<Box<dyn RenderContext>> {
        self.builder.draft.video_state.render_context.take()
    }

    /// Fold the edits into the builder
    pub fn commit(self) -> ServiceStateBuilder {
        let VideoStateEditor {
            mut builder,
            camera,
            render_context,
            local_sink,
        } = self;
        let video = &mut builder.draft.video_state;

        // The setters only accept empty slots, so nothing live is overwritten here.
        if let Some(camera) = camera {
            video.camera = camera;
        }
        if let Some(render_context) = render_context {
            video.render_context = render_context;
        }
        if let Some(local_sink) = local_sink {
            video.local_sink = local_sink;
        }
        builder
    }
}

/// Scoped editor for [`LocalDeviceState`]
#[must_use = "edits are dropped unless `commit` is called"]
pub struct LocalDeviceStateEditor {
    builder: ServiceStateBuilder,
    orientation: Option<Orientation>,
    camera_state: Option<CameraState>,
}

impl LocalDeviceStateEditor {
    /// Set the device orientation
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Set the derived camera state
    pub fn camera_state(mut self, camera_state: CameraState) -> Self {
        self.camera_state = Some(camera_state);
        self
    }

    /// Fold the edits into the builder
    pub fn commit(self) -> ServiceStateBuilder {
        let mut builder = self.builder;
        let device = &mut builder.draft.local_device_state;
        if let Some(orientation) = self.orientation {
            device.orientation = orientation;
        }
        if let Some(camera_state) = self.camera_state {
            device.camera_state = camera_state;
        }
        builder
    }
}

/// Scoped editor for [`CallInfoState`]
#[must_use = "edits are dropped unless `commit` is called"]
pub struct CallInfoStateEditor {
    builder: ServiceStateBuilder,
    local_video_enabled: Option<bool>,
}

impl CallInfoStateEditor {
    /// Set the local video flag
    pub fn local_video_enabled(mut self, enabled: bool) -> Self {
        self.local_video_enabled = Some(enabled);
        self
    }

    /// Fold the edits into the builder
    pub fn commit(self) -> ServiceStateBuilder {
        let mut builder = self.builder;
        if let Some(enabled) = self.local_video_enabled {
            builder.draft.call_info_state.local_video_enabled = enabled;
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camsession_media::{CameraDirection, MediaResult, CapturerObserver};

    #[derive(Debug)]
    struct StubCamera {
        id: HandleId,
    }

    impl Camera for StubCamera {
        fn id(&self) -> HandleId {
            self.id
        }
        fn set_orientation(&mut self, _degrees: u32) {}
        fn set_enabled(&mut self, _enabled: bool) {}
        fn dispose(&mut self) -> MediaResult<()> {
            Ok(())
        }
        fn has_capturer(&self) -> bool {
            false
        }
        fn init_capturer(&mut self, _observer: Box<dyn CapturerObserver>) {}
        fn camera_state(&self) -> CameraState {
            CameraState::new(CameraDirection::Front, false, 1)
        }
    }

    #[test]
    fn test_orientation_degrees() {
        assert_eq!(Orientation::LandscapeRight.degrees(), 270);
        assert_eq!(Orientation::from_degrees(0), Orientation::Portrait);
        assert_eq!(Orientation::from_degrees(100), Orientation::LandscapeLeft);
        assert_eq!(Orientation::from_degrees(200), Orientation::PortraitUpsideDown);
        assert_eq!(Orientation::from_degrees(330), Orientation::Portrait);
        assert_eq!(Orientation::from_degrees(630), Orientation::LandscapeRight);
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = ServiceState::new();
        assert_eq!(state.version(), 0);
        assert!(state.video_state().is_cleared());
        assert_eq!(state.local_device_state().camera_state, CameraState::UNKNOWN);
        assert!(!state.call_info_state().local_video_enabled);
    }

    #[test]
    fn test_build_bumps_version_and_keeps_session() {
        let state = ServiceState::new();
        let session_id = state.session_id();

        let next = state.builder().build();
        assert_eq!(next.version(), 1);
        assert_eq!(next.session_id(), session_id);
    }

    #[test]
    fn test_chained_editors_commit_all_groups() {
        let camera_id = HandleId::new();
        let state = ServiceState::new()
            .builder()
            .change_video_state()
            .camera(Some(Box::new(StubCamera { id: camera_id })))
            .commit()
            .change_local_device_state()
            .orientation(Orientation::LandscapeLeft)
            .camera_state(CameraState::new(CameraDirection::Front, false, 1))
            .commit()
            .change_call_info_state()
            .local_video_enabled(true)
            .commit()
            .build();

        assert_eq!(state.video_state().camera_id(), Some(camera_id));
        assert_eq!(state.local_device_state().orientation, Orientation::LandscapeLeft);
        assert_eq!(
            state.local_device_state().camera_state.active_direction,
            CameraDirection::Front
        );
        assert!(state.call_info_state().local_video_enabled);
    }

    #[test]
    fn test_untouched_fields_carry_over() {
        let state = ServiceState::with_orientation(Orientation::PortraitUpsideDown)
            .builder()
            .change_call_info_state()
            .local_video_enabled(true)
            .commit()
            .build();

        let next = state
            .builder()
            .change_local_device_state()
            .camera_state(CameraState::UNKNOWN)
            .commit()
            .build();

        assert_eq!(next.local_device_state().orientation, Orientation::PortraitUpsideDown);
        assert!(next.call_info_state().local_video_enabled);
        assert_eq!(next.version(), 2);
    }

    #[test]
    fn test_take_camera_moves_handle_out() {
        let camera_id = HandleId::new();
        let state = ServiceState::new()
            .builder()
            .change_video_state()
            .camera(Some(Box::new(StubCamera { id: camera_id })))
            .commit()
            .build();

        let mut editor = state.builder().change_video_state();
        let taken = editor.take_camera().map(|camera| camera.id());
        let state = editor.commit().build();

        assert_eq!(taken, Some(camera_id));
        assert!(state.video_state().camera().is_none());
    }

    #[test]
    fn test_builder_reads_committed_fields() {
        let builder = ServiceState::new()
            .builder()
            .change_local_device_state()
            .orientation(Orientation::LandscapeRight)
            .commit();
        assert_eq!(
            builder.local_device_state().orientation,
            Orientation::LandscapeRight
        );
        assert!(builder.video_state().is_cleared());
    }

    #[test]
    fn test_summary_reflects_snapshot() {
        let state = ServiceState::new();
        let summary = state.summary();
        assert_eq!(summary.session_id, state.session_id());
        assert_eq!(summary.camera, None);
        assert!(!summary.has_local_sink);
        assert_eq!(summary.camera_state, CameraState::UNKNOWN);
    }

    fn with_stub_camera() -> ServiceState {
        ServiceState::new()
            .builder()
            .change_video_state()
            .camera(Some(Box::new(StubCamera { id: HandleId::new() })))
            .commit()
            .build()
    }

    #[test]
    #[should_panic(expected = "must be taken for disposal")]
    fn test_clearing_live_camera_without_take_panics() {
        let _ = with_stub_camera()
            .builder()
            .change_video_state()
            .camera(None)
            .commit()
            .build();
    }

    #[test]
    #[should_panic(expected = "must be taken for disposal")]
    fn test_overwriting_live_camera_panics() {
        let _ = with_stub_camera()
            .builder()
            .change_video_state()
            .camera(Some(Box::new(StubCamera { id: HandleId::new() })));
    }

    #[derive(Debug)]
    struct StubRenderContext {
        handle: RenderContextHandle,
    }

    impl RenderContext for StubRenderContext {
        fn handle(&self) -> RenderContextHandle {
            self.handle
        }
        fn release(&mut self) -> MediaResult<()> {
            Ok(())
        }
    }

    #[test]
    #[should_panic(expected = "must be taken for release")]
    fn test_clearing_live_render_context_without_take_panics() {
        let state = ServiceState::new()
            .builder()
            .change_video_state()
            .render_context(Some(Box::new(StubRenderContext {
                handle: RenderContextHandle::new(HandleId::new()),
            })))
            .commit()
            .build();
        let _ = state.builder().change_video_state().render_context(None);
    }

    #[test]
    fn test_taken_camera_slot_accepts_replacement() {
        let replacement = HandleId::new();
        let mut editor = with_stub_camera().builder().change_video_state();
        assert!(editor.take_camera().is_some());

        let state = editor
            .camera(Some(Box::new(StubCamera { id: replacement })))
            .commit()
            .build();
        assert_eq!(state.video_state().camera_id(), Some(replacement));
    }

    #[test]
    #[should_panic(expected = "video state has no camera")]
    fn test_require_camera_panics_when_absent() {
        let state = ServiceState::new();
        let _ = state.video_state().require_camera();
    }
}
