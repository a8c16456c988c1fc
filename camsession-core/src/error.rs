//! Error types shared by every camsession crate

use thiserror::Error;

/// Core error type for session plumbing that is not tied to a device
#[derive(Error, Debug)]
pub enum CoreError {
    /// Initialization error
    #[error("Initialization failed: {reason}")]
    Initialization {
        /// Reason for initialization failure
        reason: String,
    },

    /// Missing configuration error
    #[error("Missing required configuration: {field}")]
    MissingConfiguration {
        /// Missing configuration field
        field: String,
    },

    /// A configuration value was present but unusable
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration {
        /// Offending configuration field
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The affinity thread exited before the work could complete
    #[error("Affinity thread '{thread}' is no longer running")]
    AffinityThreadStopped {
        /// Name of the affinity thread
        thread: String,
    },

    /// I/O failure (thread spawn, config file access)
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

/// Result alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::Initialization { .. } => "INITIALIZATION_FAILED",
            CoreError::MissingConfiguration { .. } => "MISSING_CONFIGURATION",
            CoreError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            CoreError::AffinityThreadStopped { .. } => "AFFINITY_THREAD_STOPPED",
            CoreError::Io { .. } => "IO_ERROR",
        }
    }
}
