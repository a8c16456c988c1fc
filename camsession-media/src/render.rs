//! GPU rendering-context contract
//!
//! The rendering context is the expensive half of local video: surfaces and
//! shader state hang off it, so it outlives individual camera instances. The
//! concrete GPU binding lives outside this crate; the session only needs to
//! create it, hand its [`RenderContextHandle`] to sinks and cameras, and
//! release it once.

use crate::error::MediaResult;
use camsession_core::HandleId;
use std::fmt;

/// Non-owning reference to a live rendering context.
///
/// Sinks and cameras hold this to share the context; the owning
/// [`RenderContext`] stays with the video state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderContextHandle(HandleId);

impl RenderContextHandle {
    /// Wrap a handle identity
    pub fn new(id: HandleId) -> Self {
        Self(id)
    }

    /// Identity of the underlying context
    pub fn id(&self) -> HandleId {
        self.0
    }
}

impl fmt::Display for RenderContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render-context:{}", self.0)
    }
}

/// Owned GPU rendering context
pub trait RenderContext: Send + fmt::Debug {
    /// Shareable reference to this context
    fn handle(&self) -> RenderContextHandle;

    /// Release GPU resources. Called exactly once by the owner.
    fn release(&mut self) -> MediaResult<()>;
}

/// Creates rendering contexts; must be invoked on the affinity thread
pub trait RenderContextFactory: Send + Sync {
    /// Create a new rendering context
    fn create(&self) -> MediaResult<Box<dyn RenderContext>>;
}
