//! Video frame representation
//!
//! A [`VideoFrame`] is an immutable value: pixel storage is held in a shared
//! [`FrameBuffer`], and "changing" a frame's rotation produces a new frame
//! that points at the same buffer. Pixel data is never copied on the frame
//! path.

use crate::error::{MediaError, MediaResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pixel layouts a capture device may deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0
    I420,
    /// Semi-planar YUV 4:2:0
    Nv12,
    /// Packed 8-bit RGBA
    Rgba,
    /// GPU-resident texture; `data` is empty
    Texture,
}

impl PixelFormat {
    /// Expected payload size for a `width` x `height` image, if the format has one
    pub fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        let pixels = width as usize * height as usize;
        match self {
            PixelFormat::I420 | PixelFormat::Nv12 => Some(pixels * 3 / 2),
            PixelFormat::Rgba => Some(pixels * 4),
            PixelFormat::Texture => None,
        }
    }
}

/// Clockwise rotation that must be applied to a buffer for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VideoRotation {
    /// No rotation
    #[default]
    Deg0,
    /// Quarter turn
    Deg90,
    /// Half turn
    Deg180,
    /// Three quarter turn
    Deg270,
}

impl VideoRotation {
    /// Rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            VideoRotation::Deg0 => 0,
            VideoRotation::Deg90 => 90,
            VideoRotation::Deg180 => 180,
            VideoRotation::Deg270 => 270,
        }
    }

    /// Whether the rotation swaps width and height
    pub fn is_transposing(&self) -> bool {
        matches!(self, VideoRotation::Deg90 | VideoRotation::Deg270)
    }
}

impl TryFrom<u32> for VideoRotation {
    type Error = MediaError;

    fn try_from(degrees: u32) -> MediaResult<Self> {
        match degrees {
            0 => Ok(VideoRotation::Deg0),
            90 => Ok(VideoRotation::Deg90),
            180 => Ok(VideoRotation::Deg180),
            270 => Ok(VideoRotation::Deg270),
            other => Err(MediaError::InvalidRotation { degrees: other }),
        }
    }
}

/// Shared pixel storage for one captured image
#[derive(Debug)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Bytes,
}

impl FrameBuffer {
    /// Wrap captured pixel data, validating its size against the format
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Bytes) -> MediaResult<Self> {
        if let Some(expected) = format.frame_size(width, height) {
            if data.len() != expected {
                return Err(MediaError::InvalidFrameData {
                    expected,
                    actual: data.len(),
                });
            }
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// A GPU-resident buffer with no CPU-side payload
    pub fn texture(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Texture,
            data: Bytes::new(),
        }
    }

    /// Buffer width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw payload
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// One captured image plus its display metadata
#[derive(Debug, Clone)]
pub struct VideoFrame {
    buffer: Arc<FrameBuffer>,
    rotation: VideoRotation,
    timestamp_ns: i64,
}

impl VideoFrame {
    /// Create a frame over `buffer`
    pub fn new(buffer: Arc<FrameBuffer>, rotation: VideoRotation, timestamp_ns: i64) -> Self {
        Self {
            buffer,
            rotation,
            timestamp_ns,
        }
    }

    /// Shared pixel buffer
    pub fn buffer(&self) -> &Arc<FrameBuffer> {
        &self.buffer
    }

    /// Display rotation
    pub fn rotation(&self) -> VideoRotation {
        self.rotation
    }

    /// Monotonic capture timestamp in nanoseconds
    pub fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    /// Stored buffer width
    pub fn width(&self) -> u32 {
        self.buffer.width
    }

    /// Stored buffer height
    pub fn height(&self) -> u32 {
        self.buffer.height
    }

    /// Width once the rotation has been applied
    pub fn rotated_width(&self) -> u32 {
        if self.rotation.is_transposing() {
            self.buffer.height
        } else {
            self.buffer.width
        }
    }

    /// Height once the rotation has been applied
    pub fn rotated_height(&self) -> u32 {
        if self.rotation.is_transposing() {
            self.buffer.width
        } else {
            self.buffer.height
        }
    }

    /// A frame over the same buffer and timestamp with a different rotation
    pub fn with_rotation(&self, rotation: VideoRotation) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
            rotation,
            timestamp_ns: self.timestamp_ns,
        }
    }

    /// Whether both frames reference the same pixel buffer
    pub fn shares_buffer_with(&self, other: &VideoFrame) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}
