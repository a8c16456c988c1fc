//! # camsession core
//!
//! Foundational pieces shared by the camsession crates: the error taxonomy
//! for non-device failures, opaque identities for hardware handles, and the
//! affinity thread on which every hardware lifecycle call is executed.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod affinity;
pub mod error;
pub mod handle;

// Re-export main types
pub use affinity::AffinityThread;
pub use error::{CoreError, CoreResult};
pub use handle::HandleId;
