//! Error types for lifecycle transitions and the session facade

use crate::state::ServiceState;
use camsession_core::CoreError;
use camsession_media::MediaError;
use thiserror::Error;

/// What went wrong during a lifecycle transition
#[derive(Error, Debug)]
pub enum TransitionErrorKind {
    /// The rendering context could not be created
    #[error("Render context creation failed: {0}")]
    RenderContextCreation(#[source] MediaError),

    /// The camera could not be created
    #[error("Camera creation failed: {0}")]
    CameraCreation(#[source] MediaError),

    /// The work never ran on the affinity thread
    #[error(transparent)]
    Dispatch(#[from] CoreError),
}

impl TransitionErrorKind {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            TransitionErrorKind::RenderContextCreation(_) => "RENDER_CONTEXT_CREATION_FAILED",
            TransitionErrorKind::CameraCreation(_) => "CAMERA_CREATION_FAILED",
            TransitionErrorKind::Dispatch(err) => err.error_code(),
        }
    }

    /// Whether retrying the same transition may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransitionErrorKind::RenderContextCreation(err)
            | TransitionErrorKind::CameraCreation(err) => err.is_recoverable(),
            TransitionErrorKind::Dispatch(_) => false,
        }
    }
}

/// A failed transition, together with the snapshot the session is left in.
///
/// The snapshot owns every hardware handle that survived the failure, so it
/// must be kept or deinitialized rather than dropped.
#[derive(Error, Debug)]
#[error("{operation} failed: {kind}")]
pub struct TransitionError {
    operation: &'static str,
    #[source]
    kind: TransitionErrorKind,
    state: Box<ServiceState>,
}

impl TransitionError {
    pub(crate) fn new(
        operation: &'static str,
        kind: TransitionErrorKind,
        state: ServiceState,
    ) -> Self {
        Self {
            operation,
            kind,
            state: Box::new(state),
        }
    }

    /// Name of the failed operation
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Cause of the failure
    pub fn kind(&self) -> &TransitionErrorKind {
        &self.kind
    }

    /// Snapshot the session is left in
    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    /// Take the resulting snapshot, discarding the cause
    pub fn into_state(self) -> ServiceState {
        *self.state
    }

    /// Split into cause and resulting snapshot
    pub fn into_parts(self) -> (TransitionErrorKind, ServiceState) {
        (self.kind, *self.state)
    }
}

/// Result of a lifecycle transition
pub type TransitionResult = Result<ServiceState, TransitionError>;

/// Errors surfaced by [`VideoSession`](crate::VideoSession) and configuration loading
#[derive(Error, Debug)]
pub enum SessionError {
    /// A transition failed; the session kept the resulting snapshot
    #[error("{operation} failed: {kind}")]
    Transition {
        /// Name of the failed operation
        operation: &'static str,
        /// Cause of the failure
        #[source]
        kind: TransitionErrorKind,
    },

    /// The operation does not apply to the current state
    #[error("Invalid state: expected {expected}, found {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// Core error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::Transition { kind, .. } => kind.error_code(),
            SessionError::InvalidState { .. } => "INVALID_STATE",
            SessionError::Core(err) => err.error_code(),
            SessionError::Config(_) => "CONFIG_PARSE_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_returns_state() {
        let state = ServiceState::new();
        let session_id = state.session_id();
        let err = TransitionError::new(
            "initialize_video",
            TransitionErrorKind::CameraCreation(MediaError::DeviceNotFound {
                device_id: "front".to_string(),
            }),
            state,
        );

        assert_eq!(err.operation(), "initialize_video");
        assert_eq!(err.kind().error_code(), "CAMERA_CREATION_FAILED");
        assert!(err.to_string().starts_with("initialize_video failed: Camera creation failed"));
        assert_eq!(err.into_state().session_id(), session_id);
    }

    #[test]
    fn test_dispatch_errors_are_not_recoverable() {
        let kind = TransitionErrorKind::from(CoreError::AffinityThreadStopped {
            thread: "camsession-main".to_string(),
        });
        assert!(!kind.is_recoverable());
        assert_eq!(kind.error_code(), "AFFINITY_THREAD_STOPPED");
    }

    #[test]
    fn test_session_error_codes() {
        let err = SessionError::InvalidState {
            expected: "video initialized".to_string(),
            actual: "no camera".to_string(),
        };
        assert_eq!(err.error_code(), "INVALID_STATE");

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(SessionError::from(parse).error_code(), "CONFIG_PARSE_FAILED");
    }
}
