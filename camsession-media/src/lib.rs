//! # camsession media
//!
//! Frame model, frame sinks and the device contracts the session drives.
//! This crate handles everything on the capture path: the immutable
//! [`VideoFrame`], the [`VideoSink`] consumer interface with its
//! orientation-correcting and broadcasting implementations, and the traits
//! concrete camera and GPU drivers implement.

#![warn(clippy::all)]

pub mod camera;
pub mod error;
pub mod frame;
pub mod render;
pub mod sink;
pub mod synthetic;

// Re-export main types
pub use camera::{
    Camera, CameraDirection, CameraEventListener, CameraFactory, CameraState, CameraStatus,
    CapturerObserver, SinkCapturerObserver,
};
pub use error::{ErrorCategory, MediaError, MediaResult};
pub use frame::{FrameBuffer, PixelFormat, VideoFrame, VideoRotation};
pub use render::{RenderContext, RenderContextFactory, RenderContextHandle};
pub use sink::{
    BroadcastVideoSink, FnVideoSink, OrientationAwareVideoSink, SinkId, VideoSink,
    LANDSCAPE_PREVIEW_ROTATION,
};
pub use synthetic::{
    SyntheticCamera, SyntheticCameraConfig, SyntheticCameraFactory, SyntheticCounts,
    SyntheticRenderContext, SyntheticRenderContextFactory, SyntheticStats,
};
