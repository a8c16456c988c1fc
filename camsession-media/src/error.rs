//! Media error types and handling
//!
//! Errors raised by capture devices, rendering contexts and frame
//! construction. The frame router itself has no failure modes.

use camsession_core::CoreError;
use thiserror::Error;

/// Main error type for device and frame operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// Failure in shared session plumbing
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Device not found error
    #[error("Device not found: {device_id}")]
    DeviceNotFound {
        /// Device identifier
        device_id: String,
    },

    /// Resource not available (device busy, context limit reached)
    #[error("Resource not available: {resource}")]
    ResourceNotAvailable {
        /// Resource name
        resource: String,
    },

    /// Permission denied error
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// Operation that was denied
        operation: String,
    },

    /// Hardware acceleration not available
    #[error("Hardware acceleration not available: {reason}")]
    HardwareAccelerationNotAvailable {
        /// Reason why hardware acceleration is not available
        reason: String,
    },

    /// Handle was already disposed or released
    #[error("{resource} already disposed")]
    AlreadyDisposed {
        /// Kind of handle
        resource: String,
    },

    /// Rotation outside the four quarter turns
    #[error("Invalid rotation: {degrees} degrees")]
    InvalidRotation {
        /// Offending rotation value
        degrees: u32,
    },

    /// Invalid frame data error
    #[error("Invalid frame data: expected {expected} bytes, got {actual}")]
    InvalidFrameData {
        /// Expected data size
        expected: usize,
        /// Actual data size
        actual: usize,
    },

    /// Video specific errors
    #[error("Video error: {message}")]
    Video {
        /// Error message
        message: String,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if error is recoverable (a retry may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::ResourceNotAvailable { .. } => true,
            MediaError::HardwareAccelerationNotAvailable { .. } => true,
            MediaError::DeviceNotFound { .. } => false,
            MediaError::PermissionDenied { .. } => false,
            MediaError::AlreadyDisposed { .. } => false,
            _ => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::Core(_) => ErrorCategory::System,
            MediaError::DeviceNotFound { .. } => ErrorCategory::Device,
            MediaError::ResourceNotAvailable { .. } => ErrorCategory::Device,
            MediaError::PermissionDenied { .. } => ErrorCategory::System,
            MediaError::HardwareAccelerationNotAvailable { .. } => ErrorCategory::Platform,
            MediaError::AlreadyDisposed { .. } => ErrorCategory::State,
            MediaError::InvalidRotation { .. } => ErrorCategory::Data,
            MediaError::InvalidFrameData { .. } => ErrorCategory::Data,
            MediaError::Video { .. } => ErrorCategory::Video,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// System-level errors (threads, permissions, etc.)
    System,
    /// Platform compatibility errors
    Platform,
    /// Data validation errors
    Data,
    /// Device and hardware errors
    Device,
    /// Handle lifecycle errors
    State,
    /// Video-specific errors
    Video,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let busy = MediaError::ResourceNotAvailable {
            resource: "front camera".to_string(),
        };
        assert_eq!(busy.category(), ErrorCategory::Device);
        assert!(busy.is_recoverable());

        let denied = MediaError::PermissionDenied {
            operation: "open camera".to_string(),
        };
        assert_eq!(denied.category(), ErrorCategory::System);
        assert!(!denied.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = MediaError::InvalidFrameData {
            expected: 1024,
            actual: 512,
        };
        assert_eq!(
            error.to_string(),
            "Invalid frame data: expected 1024 bytes, got 512"
        );

        let error = MediaError::InvalidRotation { degrees: 45 };
        assert_eq!(error.to_string(), "Invalid rotation: 45 degrees");
    }

    #[test]
    fn test_error_from_core() {
        let core = CoreError::AffinityThreadStopped {
            thread: "camsession-main".to_string(),
        };
        let media_error = MediaError::from(core);

        match media_error {
            MediaError::Core(_) => (),
            _ => panic!("Expected Core error variant"),
        }
        assert_eq!(
            media_error.to_string(),
            "Affinity thread 'camsession-main' is no longer running"
        );
    }
}
