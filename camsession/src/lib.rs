//! # camsession - Capture Resources for Real-Time Video Calls
//!
//! camsession owns the local video hardware of a call: the camera device,
//! the GPU rendering context it draws through, and the local sink renderers
//! attach to. It keeps them in an immutable, versioned [`ServiceState`]
//! that only changes through scoped transition builders, performs every
//! hardware call on one affinity thread, and corrects the orientation of
//! front-camera self-preview frames.
//!
//! ## Key Features
//!
//! - **Immutable snapshots**: transitions consume the old state and publish a new one
//! - **Single hardware thread**: camera and GPU calls never race
//! - **No orphaned handles**: failed transitions hand back the state they leave behind
//! - **Self-preview routing**: landscape-shaped frames are shown rotated 270 degrees
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use camsession::{CamSessionConfig, HardwareContext, VideoSession};
//! use camsession::{SyntheticCameraConfig, SyntheticCameraFactory, SyntheticRenderContextFactory, SyntheticStats};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), camsession::SessionError> {
//! let stats = Arc::new(SyntheticStats::default());
//! let hardware = HardwareContext::new(
//!     Arc::new(SyntheticRenderContextFactory::new(stats.clone())),
//!     Arc::new(SyntheticCameraFactory::new(SyntheticCameraConfig::default(), stats)),
//! );
//!
//! let session = VideoSession::new(&CamSessionConfig::default(), hardware)?;
//! session.start_video()?;
//! session.start_vanity()?;
//! session.restart_camera()?;
//! session.stop_video()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export lower-layer types for easy access
pub use camsession_core::{AffinityThread, CoreError, CoreResult, HandleId};
pub use camsession_media::{
    BroadcastVideoSink, Camera, CameraDirection, CameraEventListener, CameraFactory, CameraState,
    CameraStatus, CapturerObserver, FnVideoSink, FrameBuffer, MediaError, MediaResult,
    OrientationAwareVideoSink, PixelFormat, RenderContext, RenderContextFactory,
    RenderContextHandle, SinkCapturerObserver, SinkId, SyntheticCameraConfig,
    SyntheticCameraFactory, SyntheticCounts, SyntheticRenderContextFactory, SyntheticStats,
    VideoFrame, VideoRotation, VideoSink, LANDSCAPE_PREVIEW_ROTATION,
};

// Public API modules
pub mod config;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod logging;
pub mod session;
pub mod state;

// Re-export main API types
pub use config::{CamSessionConfig, GlobalConfig, SessionConfig};
pub use error::{SessionError, SessionResult, TransitionError, TransitionErrorKind, TransitionResult};
pub use event::{EventStream, SessionEvent};
pub use lifecycle::{HardwareContext, VideoLifecycle};
pub use logging::init_logging;
pub use session::VideoSession;
pub use state::{
    CallInfoState, LocalDeviceState, Orientation, ServiceState, ServiceStateBuilder,
    ServiceStateSummary, VideoState,
};
