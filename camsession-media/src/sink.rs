//! Frame sinks
//!
//! [`VideoSink`] is the single-method consumer interface on the capture path.
//! Implementations here:
//! - [`OrientationAwareVideoSink`] rewrites rotation metadata for self-preview
//!   and delegates to another sink.
//! - [`BroadcastVideoSink`] is the session's local sink; it fans frames out to
//!   any number of registered renderers.
//! - [`FnVideoSink`] adapts a closure.
//!
//! Sinks are invoked on capture threads at frame rate. None of them block on
//! I/O or copy pixel data.

use crate::frame::{VideoFrame, VideoRotation};
use crate::render::RenderContextHandle;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Consumer of captured frames
pub trait VideoSink: Send + Sync {
    /// Handle one frame
    fn on_frame(&self, frame: VideoFrame);
}

/// Rotation forced onto landscape-shaped self-preview frames
pub const LANDSCAPE_PREVIEW_ROTATION: VideoRotation = VideoRotation::Deg270;

/// Sink decorator that corrects front-camera preview orientation.
///
/// A frame whose rotated height is less than its rotated width is forwarded
/// as a copy with rotation forced to 270 degrees, sharing the original buffer
/// and timestamp. Every other frame is forwarded unchanged.
pub struct OrientationAwareVideoSink {
    delegate: Arc<dyn VideoSink>,
}

impl OrientationAwareVideoSink {
    /// Wrap `delegate`
    pub fn new(delegate: Arc<dyn VideoSink>) -> Self {
        Self { delegate }
    }

    /// The frame that would be forwarded for `frame`
    pub fn route(frame: VideoFrame) -> VideoFrame {
        if frame.rotated_height() < frame.rotated_width() {
            frame.with_rotation(LANDSCAPE_PREVIEW_ROTATION)
        } else {
            frame
        }
    }
}

impl VideoSink for OrientationAwareVideoSink {
    fn on_frame(&self, frame: VideoFrame) {
        self.delegate.on_frame(Self::route(frame));
    }
}

impl fmt::Debug for OrientationAwareVideoSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrientationAwareVideoSink")
            .finish_non_exhaustive()
    }
}

/// Closure-backed sink
pub struct FnVideoSink<F>(F);

impl<F> FnVideoSink<F>
where
    F: Fn(VideoFrame) + Send + Sync,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> VideoSink for FnVideoSink<F>
where
    F: Fn(VideoFrame) + Send + Sync,
{
    fn on_frame(&self, frame: VideoFrame) {
        (self.0)(frame)
    }
}

/// Registration token returned by [`BroadcastVideoSink::add_sink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

type SinkList = Arc<Vec<(SinkId, Arc<dyn VideoSink>)>>;

/// The session's local sink: fans frames out to registered renderers.
///
/// Bound to the rendering context whose surfaces its renderers draw into.
pub struct BroadcastVideoSink {
    render_context: RenderContextHandle,
    // Copy-on-write so delivery only holds the lock long enough to clone an Arc.
    sinks: RwLock<SinkList>,
    next_id: AtomicU64,
    frames_delivered: AtomicU64,
    // Rotated width in the high half, height in the low half; 0 = no frame yet.
    last_frame_size: AtomicU64,
}

impl BroadcastVideoSink {
    /// Create a local sink bound to `render_context`
    pub fn new(render_context: RenderContextHandle) -> Self {
        debug!("Created broadcast sink on {}", render_context);
        Self {
            render_context,
            sinks: RwLock::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(1),
            frames_delivered: AtomicU64::new(0),
            last_frame_size: AtomicU64::new(0),
        }
    }

    /// Rendering context this sink draws through
    pub fn render_context(&self) -> RenderContextHandle {
        self.render_context
    }

    /// Register a renderer
    pub fn add_sink(&self, sink: Arc<dyn VideoSink>) -> SinkId {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut sinks = self.sinks.write();
        let mut updated = Vec::with_capacity(sinks.len() + 1);
        updated.extend(sinks.iter().cloned());
        updated.push((id, sink));
        *sinks = Arc::new(updated);
        id
    }

    /// Unregister a renderer; returns whether it was registered
    pub fn remove_sink(&self, id: SinkId) -> bool {
        let mut sinks = self.sinks.write();
        if !sinks.iter().any(|(sink_id, _)| *sink_id == id) {
            return false;
        }
        let updated: Vec<_> = sinks
            .iter()
            .filter(|(sink_id, _)| *sink_id != id)
            .cloned()
            .collect();
        *sinks = Arc::new(updated);
        true
    }

    /// Number of registered renderers
    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }

    /// Frames received since creation
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::Relaxed)
    }

    /// Rotated size of the most recent frame
    pub fn last_frame_size(&self) -> Option<(u32, u32)> {
        match self.last_frame_size.load(Ordering::Relaxed) {
            0 => None,
            packed => Some(((packed >> 32) as u32, packed as u32)),
        }
    }
}

impl VideoSink for BroadcastVideoSink {
    fn on_frame(&self, frame: VideoFrame) {
        let packed = (u64::from(frame.rotated_width()) << 32) | u64::from(frame.rotated_height());
        self.last_frame_size.store(packed, Ordering::Relaxed);
        self.frames_delivered.fetch_add(1, Ordering::Relaxed);

        let sinks = Arc::clone(&self.sinks.read());
        for (_, sink) in sinks.iter() {
            sink.on_frame(frame.clone());
        }
    }
}

impl fmt::Debug for BroadcastVideoSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastVideoSink")
            .field("render_context", &self.render_context)
            .field("sinks", &self.sink_count())
            .field("frames_delivered", &self.frames_delivered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameBuffer;
    use camsession_core::HandleId;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        frames: Mutex<Vec<VideoFrame>>,
    }

    impl VideoSink for RecordingSink {
        fn on_frame(&self, frame: VideoFrame) {
            self.frames.lock().push(frame);
        }
    }

    fn frame(width: u32, height: u32, rotation: VideoRotation, ts: i64) -> VideoFrame {
        VideoFrame::new(Arc::new(FrameBuffer::texture(width, height)), rotation, ts)
    }

    #[test]
    fn test_landscape_frame_forced_to_270() {
        let recorder = Arc::new(RecordingSink::default());
        let router = OrientationAwareVideoSink::new(recorder.clone());

        let input = frame(1280, 720, VideoRotation::Deg0, 42);
        router.on_frame(input.clone());

        let frames = recorder.frames.lock();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].rotation(), VideoRotation::Deg270);
        assert!(frames[0].shares_buffer_with(&input));
        assert_eq!(frames[0].timestamp_ns(), 42);
    }

    #[test]
    fn test_portrait_frame_passes_through() {
        let recorder = Arc::new(RecordingSink::default());
        let router = OrientationAwareVideoSink::new(recorder.clone());

        let input = frame(720, 1280, VideoRotation::Deg0, 43);
        router.on_frame(input.clone());

        let frames = recorder.frames.lock();
        assert_eq!(frames[0].rotation(), VideoRotation::Deg0);
        assert!(frames[0].shares_buffer_with(&input));
        assert_eq!(frames[0].timestamp_ns(), 43);
    }

    #[test]
    fn test_rotation_is_applied_before_comparison() {
        // Stored landscape, but a 90 degree rotation makes it portrait on screen.
        let routed = OrientationAwareVideoSink::route(frame(1280, 720, VideoRotation::Deg90, 0));
        assert_eq!(routed.rotation(), VideoRotation::Deg90);

        // Stored portrait, rotated into landscape.
        let routed = OrientationAwareVideoSink::route(frame(720, 1280, VideoRotation::Deg90, 0));
        assert_eq!(routed.rotation(), VideoRotation::Deg270);
    }

    #[test]
    fn test_square_frame_passes_through() {
        let routed = OrientationAwareVideoSink::route(frame(480, 480, VideoRotation::Deg180, 0));
        assert_eq!(routed.rotation(), VideoRotation::Deg180);
    }

    #[test]
    fn test_routing_is_idempotent() {
        let once = OrientationAwareVideoSink::route(frame(1920, 1080, VideoRotation::Deg0, 5));
        let twice = OrientationAwareVideoSink::route(once.clone());
        assert_eq!(once.rotation(), twice.rotation());
        assert!(once.shares_buffer_with(&twice));
        assert_eq!(once.timestamp_ns(), twice.timestamp_ns());
    }

    #[test]
    fn test_broadcast_fans_out() {
        let local = BroadcastVideoSink::new(RenderContextHandle::new(HandleId::new()));
        let a = Arc::new(RecordingSink::default());
        let b = Arc::new(RecordingSink::default());
        local.add_sink(a.clone());
        let b_id = local.add_sink(b.clone());
        assert_eq!(local.sink_count(), 2);

        local.on_frame(frame(640, 480, VideoRotation::Deg0, 1));
        assert!(local.remove_sink(b_id));
        assert!(!local.remove_sink(b_id));
        local.on_frame(frame(640, 480, VideoRotation::Deg90, 2));

        assert_eq!(a.frames.lock().len(), 2);
        assert_eq!(b.frames.lock().len(), 1);
        assert_eq!(local.frames_delivered(), 2);
        assert_eq!(local.last_frame_size(), Some((480, 640)));
    }

    #[test]
    fn test_broadcast_without_frames() {
        let local = BroadcastVideoSink::new(RenderContextHandle::new(HandleId::new()));
        assert_eq!(local.last_frame_size(), None);
        assert_eq!(local.frames_delivered(), 0);
    }

    #[test]
    fn test_fn_sink() {
        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();
        let sink = FnVideoSink::new(move |_frame| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        sink.on_frame(frame(2, 2, VideoRotation::Deg0, 0));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
