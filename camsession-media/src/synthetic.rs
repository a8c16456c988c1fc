//! Synthetic capture devices
//!
//! Driver-free implementations of [`Camera`] and [`RenderContext`] for tests,
//! demos and headless environments. The synthetic camera produces blank I420
//! frames on its own capture thread while enabled, and refuses to open while
//! another synthetic camera from the same factory is still undisposed, which
//! is how most real camera stacks behave.

use crate::camera::{
    Camera, CameraDirection, CameraEventListener, CameraFactory, CameraState, CapturerObserver,
};
use crate::error::{MediaError, MediaResult};
use crate::frame::{FrameBuffer, PixelFormat, VideoFrame, VideoRotation};
use crate::render::{RenderContext, RenderContextFactory, RenderContextHandle};
use bytes::Bytes;
use camsession_core::HandleId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Counters shared by synthetic factories and the handles they create
#[derive(Debug, Default)]
pub struct SyntheticStats {
    cameras_created: AtomicUsize,
    cameras_disposed: AtomicUsize,
    contexts_created: AtomicUsize,
    contexts_released: AtomicUsize,
    frames_produced: AtomicU64,
    last_orientation: AtomicU32,
}

/// Point-in-time copy of [`SyntheticStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyntheticCounts {
    /// Cameras successfully opened
    pub cameras_created: usize,
    /// Cameras disposed
    pub cameras_disposed: usize,
    /// Rendering contexts created
    pub contexts_created: usize,
    /// Rendering contexts released
    pub contexts_released: usize,
    /// Frames delivered to capture observers
    pub frames_produced: u64,
    /// Orientation most recently applied to any camera
    pub last_orientation: u32,
}

impl SyntheticCounts {
    /// Cameras opened but not yet disposed
    pub fn live_cameras(&self) -> usize {
        self.cameras_created.saturating_sub(self.cameras_disposed)
    }

    /// Contexts created but not yet released
    pub fn live_contexts(&self) -> usize {
        self.contexts_created.saturating_sub(self.contexts_released)
    }
}

impl SyntheticStats {
    /// Snapshot the counters
    pub fn counts(&self) -> SyntheticCounts {
        // Releases are read before creations so a snapshot never shows more
        // handles closed than opened.
        let cameras_disposed = self.cameras_disposed.load(Ordering::SeqCst);
        let contexts_released = self.contexts_released.load(Ordering::SeqCst);
        SyntheticCounts {
            cameras_created: self.cameras_created.load(Ordering::SeqCst),
            cameras_disposed,
            contexts_created: self.contexts_created.load(Ordering::SeqCst),
            contexts_released,
            frames_produced: self.frames_produced.load(Ordering::SeqCst),
            last_orientation: self.last_orientation.load(Ordering::SeqCst),
        }
    }
}

/// Synthetic camera configuration
#[derive(Debug, Clone)]
pub struct SyntheticCameraConfig {
    /// Stored frame width
    pub width: u32,
    /// Stored frame height
    pub height: u32,
    /// Frames per second while enabled
    pub fps: u32,
    /// Rotation stamped on every produced frame
    pub sensor_rotation: VideoRotation,
    /// Cameras reported on the device
    pub camera_count: u32,
    /// Whether cameras accept a capture observer
    pub has_capturer: bool,
}

impl Default for SyntheticCameraConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 30,
            sensor_rotation: VideoRotation::Deg0,
            camera_count: 2,
            has_capturer: true,
        }
    }
}

/// Factory for [`SyntheticCamera`]s
#[derive(Debug)]
pub struct SyntheticCameraFactory {
    config: SyntheticCameraConfig,
    stats: Arc<SyntheticStats>,
    failing_creates: AtomicUsize,
    failing_disposal: AtomicBool,
}

impl SyntheticCameraFactory {
    /// Create a factory recording into `stats`
    pub fn new(config: SyntheticCameraConfig, stats: Arc<SyntheticStats>) -> Self {
        Self {
            config,
            stats,
            failing_creates: AtomicUsize::new(0),
            failing_disposal: AtomicBool::new(false),
        }
    }

    /// Make the next `count` calls to `create` fail as if the device were busy
    pub fn fail_next_creates(&self, count: usize) {
        self.failing_creates.store(count, Ordering::SeqCst);
    }

    /// Make cameras created from now on report an error from `dispose`
    pub fn fail_disposal(&self, failing: bool) {
        self.failing_disposal.store(failing, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_creates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl CameraFactory for SyntheticCameraFactory {
    fn create(
        &self,
        listener: Arc<dyn CameraEventListener>,
        render_context: RenderContextHandle,
        direction: CameraDirection,
    ) -> MediaResult<Box<dyn Camera>> {
        if self.take_injected_failure() {
            return Err(MediaError::ResourceNotAvailable {
                resource: format!("{:?} camera", direction),
            });
        }
        if !direction.is_usable() {
            return Err(MediaError::DeviceNotFound {
                device_id: format!("{:?}", direction),
            });
        }
        if self.stats.counts().live_cameras() > 0 {
            return Err(MediaError::ResourceNotAvailable {
                resource: "camera already open".to_string(),
            });
        }

        let camera = SyntheticCamera {
            id: HandleId::new(),
            direction,
            render_context,
            config: self.config.clone(),
            stats: self.stats.clone(),
            fail_disposal: self.failing_disposal.load(Ordering::SeqCst),
            enabled: false,
            disposed: false,
            orientation: 0,
            observer: None,
            capture: None,
        };
        self.stats.cameras_created.fetch_add(1, Ordering::SeqCst);
        info!(
            "Opened synthetic {:?} camera {} on {}",
            direction, camera.id, render_context
        );

        listener.on_fully_initialized();
        Ok(Box::new(camera))
    }
}

type SharedObserver = Arc<Mutex<Box<dyn CapturerObserver>>>;

struct CaptureThread {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Camera that generates blank frames on a background thread
pub struct SyntheticCamera {
    id: HandleId,
    direction: CameraDirection,
    render_context: RenderContextHandle,
    config: SyntheticCameraConfig,
    stats: Arc<SyntheticStats>,
    fail_disposal: bool,
    enabled: bool,
    disposed: bool,
    orientation: u32,
    observer: Option<SharedObserver>,
    capture: Option<CaptureThread>,
}

impl SyntheticCamera {
    fn start_capture(&mut self) {
        let Some(observer) = self.observer.clone() else {
            return;
        };
        if self.capture.is_some() {
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let stats = self.stats.clone();
        let (width, height) = (self.config.width, self.config.height);
        let rotation = self.config.sensor_rotation;
        let interval = Duration::from_secs(1) / self.config.fps.max(1);
        let payload = Bytes::from(vec![0u8; width as usize * height as usize * 3 / 2]);

        let spawned = thread::Builder::new()
            .name(format!("synthetic-capture-{}", self.id))
            .spawn(move || {
                let started = Instant::now();
                observer.lock().on_capturer_started(true);
                while !thread_stop.load(Ordering::SeqCst) {
                    match FrameBuffer::new(width, height, PixelFormat::I420, payload.clone()) {
                        Ok(buffer) => {
                            let timestamp_ns = started.elapsed().as_nanos() as i64;
                            let frame = VideoFrame::new(Arc::new(buffer), rotation, timestamp_ns);
                            observer.lock().on_frame_captured(frame);
                            stats.frames_produced.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => {
                            warn!("Synthetic frame rejected: {}", e);
                            break;
                        }
                    }
                    thread::sleep(interval);
                }
                observer.lock().on_capturer_stopped();
            });

        match spawned {
            Ok(handle) => self.capture = Some(CaptureThread { stop, handle }),
            Err(e) => warn!("Failed to spawn synthetic capture thread: {}", e),
        }
    }

    fn stop_capture(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.stop.store(true, Ordering::SeqCst);
            if capture.handle.join().is_err() {
                warn!("Synthetic capture thread for {} panicked", self.id);
            }
        }
    }
}

impl Camera for SyntheticCamera {
    fn id(&self) -> HandleId {
        self.id
    }

    fn set_orientation(&mut self, degrees: u32) {
        self.orientation = degrees;
        self.stats.last_orientation.store(degrees, Ordering::SeqCst);
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.disposed {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.start_capture();
        } else {
            self.stop_capture();
        }
    }

    fn dispose(&mut self) -> MediaResult<()> {
        if self.disposed {
            return Err(MediaError::AlreadyDisposed {
                resource: format!("camera {}", self.id),
            });
        }
        self.stop_capture();
        self.enabled = false;
        self.observer = None;
        self.disposed = true;
        self.stats.cameras_disposed.fetch_add(1, Ordering::SeqCst);
        debug!("Disposed synthetic camera {}", self.id);

        if self.fail_disposal {
            return Err(MediaError::Video {
                message: format!("camera {} reported a close error", self.id),
            });
        }
        Ok(())
    }

    fn has_capturer(&self) -> bool {
        self.config.has_capturer
    }

    fn init_capturer(&mut self, observer: Box<dyn CapturerObserver>) {
        if !self.config.has_capturer {
            return;
        }
        // A new observer replaces the old one; restart capture so it takes effect.
        self.stop_capture();
        self.observer = Some(Arc::new(Mutex::new(observer)));
        if self.enabled {
            self.start_capture();
        }
    }

    fn camera_state(&self) -> CameraState {
        if self.disposed {
            return CameraState::UNKNOWN;
        }
        CameraState::new(self.direction, self.enabled, self.config.camera_count)
    }
}

impl std::fmt::Debug for SyntheticCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticCamera")
            .field("id", &self.id)
            .field("direction", &self.direction)
            .field("render_context", &self.render_context)
            .field("enabled", &self.enabled)
            .field("disposed", &self.disposed)
            .field("orientation", &self.orientation)
            .finish()
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        // Never leave a capture thread behind, even for a leaked handle.
        self.stop_capture();
    }
}

/// Factory for [`SyntheticRenderContext`]s
#[derive(Debug)]
pub struct SyntheticRenderContextFactory {
    stats: Arc<SyntheticStats>,
    failing_creates: AtomicUsize,
}

impl SyntheticRenderContextFactory {
    /// Create a factory recording into `stats`
    pub fn new(stats: Arc<SyntheticStats>) -> Self {
        Self {
            stats,
            failing_creates: AtomicUsize::new(0),
        }
    }

    /// Make the next `count` calls to `create` fail
    pub fn fail_next_creates(&self, count: usize) {
        self.failing_creates.store(count, Ordering::SeqCst);
    }
}

impl RenderContextFactory for SyntheticRenderContextFactory {
    fn create(&self) -> MediaResult<Box<dyn RenderContext>> {
        let injected = self
            .failing_creates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(MediaError::HardwareAccelerationNotAvailable {
                reason: "synthetic GPU context unavailable".to_string(),
            });
        }

        let context = SyntheticRenderContext {
            handle: RenderContextHandle::new(HandleId::new()),
            stats: self.stats.clone(),
            released: false,
        };
        self.stats.contexts_created.fetch_add(1, Ordering::SeqCst);
        debug!("Created {}", context.handle);
        Ok(Box::new(context))
    }
}

/// Rendering context with no GPU behind it
#[derive(Debug)]
pub struct SyntheticRenderContext {
    handle: RenderContextHandle,
    stats: Arc<SyntheticStats>,
    released: bool,
}

impl RenderContext for SyntheticRenderContext {
    fn handle(&self) -> RenderContextHandle {
        self.handle
    }

    fn release(&mut self) -> MediaResult<()> {
        if self.released {
            return Err(MediaError::AlreadyDisposed {
                resource: self.handle.to_string(),
            });
        }
        self.released = true;
        self.stats.contexts_released.fetch_add(1, Ordering::SeqCst);
        debug!("Released {}", self.handle);
        Ok(())
    }
}
