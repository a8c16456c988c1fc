//! Camera device contract and capture callbacks
//!
//! Concrete camera drivers implement [`Camera`] and [`CameraFactory`]. All
//! methods except the capture callbacks are invoked on the session's
//! affinity thread. Frame delivery happens on the driver's own capture
//! thread through a [`CapturerObserver`].

use crate::error::MediaResult;
use crate::frame::VideoFrame;
use crate::render::RenderContextHandle;
use crate::sink::VideoSink;
use camsession_core::HandleId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which physical camera is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraDirection {
    /// User-facing camera
    Front,
    /// World-facing camera
    Back,
    /// No camera selected
    None,
    /// A switch between cameras is in progress
    Pending,
}

impl CameraDirection {
    /// Whether this names a physical camera
    pub fn is_usable(&self) -> bool {
        matches!(self, CameraDirection::Front | CameraDirection::Back)
    }
}

/// Coarse device status derived from a [`CameraState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraStatus {
    /// No camera is known
    Unknown,
    /// A camera exists but is not capturing
    Disabled,
    /// Front camera is capturing
    EnabledFront,
    /// Back camera is capturing
    EnabledBack,
    /// Direction switch in progress
    Switching,
}

/// Snapshot of a camera's reported state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraState {
    /// Direction the camera is bound to
    pub active_direction: CameraDirection,
    /// Whether frames are being captured
    pub enabled: bool,
    /// Number of cameras available on the device
    pub camera_count: u32,
}

impl CameraState {
    /// State reported when no camera exists
    pub const UNKNOWN: CameraState = CameraState {
        active_direction: CameraDirection::None,
        enabled: false,
        camera_count: 0,
    };

    /// Create a camera state
    pub fn new(active_direction: CameraDirection, enabled: bool, camera_count: u32) -> Self {
        Self {
            active_direction,
            enabled,
            camera_count,
        }
    }

    /// Derived device status
    pub fn status(&self) -> CameraStatus {
        match (self.active_direction, self.enabled) {
            (CameraDirection::Pending, _) => CameraStatus::Switching,
            (CameraDirection::Front, true) => CameraStatus::EnabledFront,
            (CameraDirection::Back, true) => CameraStatus::EnabledBack,
            _ if self.camera_count == 0 => CameraStatus::Unknown,
            _ => CameraStatus::Disabled,
        }
    }

    /// Whether a camera is currently capturing
    pub fn is_enabled(&self) -> bool {
        matches!(
            self.status(),
            CameraStatus::EnabledFront | CameraStatus::EnabledBack
        )
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// Owned camera device handle
pub trait Camera: Send + fmt::Debug {
    /// Identity of this camera instance
    fn id(&self) -> HandleId;

    /// Apply device orientation in degrees
    fn set_orientation(&mut self, degrees: u32);

    /// Start or stop capture. Disabling must not return until frame
    /// callbacks for this camera have stopped.
    fn set_enabled(&mut self, enabled: bool);

    /// Release the device. Called at most once by the owner.
    fn dispose(&mut self) -> MediaResult<()>;

    /// Whether the device can deliver frames to an observer
    fn has_capturer(&self) -> bool;

    /// Install the observer that receives captured frames
    fn init_capturer(&mut self, observer: Box<dyn CapturerObserver>);

    /// Current reported state
    fn camera_state(&self) -> CameraState;
}

/// Creates camera instances; must be invoked on the affinity thread
pub trait CameraFactory: Send + Sync {
    /// Open a camera bound to `render_context`, facing `direction`
    fn create(
        &self,
        listener: Arc<dyn CameraEventListener>,
        render_context: RenderContextHandle,
        direction: CameraDirection,
    ) -> MediaResult<Box<dyn Camera>>;
}

/// Notifications raised by a camera driver
pub trait CameraEventListener: Send + Sync {
    /// Camera finished opening
    fn on_fully_initialized(&self);

    /// A direction switch completed
    fn on_camera_switch_completed(&self, state: CameraState);
}

/// Receives capture callbacks from a camera driver
pub trait CapturerObserver: Send {
    /// Capture session start result
    fn on_capturer_started(&mut self, success: bool);

    /// Capture session ended
    fn on_capturer_stopped(&mut self);

    /// A frame was captured
    fn on_frame_captured(&mut self, frame: VideoFrame);
}

/// Capture observer that forwards captured frames into a sink
pub struct SinkCapturerObserver {
    sink: Arc<dyn VideoSink>,
}

impl SinkCapturerObserver {
    /// Forward frames into `sink`
    pub fn new(sink: Arc<dyn VideoSink>) -> Self {
        Self { sink }
    }
}

impl CapturerObserver for SinkCapturerObserver {
    fn on_capturer_started(&mut self, success: bool) {
        debug!("Capturer started (success: {})", success);
    }

    fn on_capturer_stopped(&mut self) {
        debug!("Capturer stopped");
    }

    fn on_frame_captured(&mut self, frame: VideoFrame) {
        self.sink.on_frame(frame);
    }
}

impl fmt::Debug for SinkCapturerObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkCapturerObserver").finish_non_exhaustive()
    }
}
