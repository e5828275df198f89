//! Seams between the engine and whatever hosts it.
//!
//! The engine never talks to a window system directly. It asks a
//! [`RenderSurface`] for its size and for a GPU backend, asks a
//! [`FrameScheduler`] for one callback per display refresh, and subscribes to
//! a [`ResizeObserver`] scoped to its own surface.

use crate::backend::Backend;
use crate::viewport::LogicalSize;

/// Drawable area the engine renders into.
pub trait RenderSurface {
    type Backend: Backend;

    /// Current displayed size in logical units.
    fn display_size(&self) -> LogicalSize;
    /// Device pixel ratio reported by the host; capped by the engine.
    fn scale_factor(&self) -> f64;
    /// Acquires a GPU context bound to this surface.
    fn create_backend(&mut self) -> Result<Self::Backend, String>;
}

/// Opaque handle for one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Opaque handle for one resize subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Display-refresh driven callback source.
///
/// A host calls [`crate::Engine::on_frame`] with the token returned here once
/// the next refresh arrives. Hosts may withhold callbacks while the surface is
/// not visible.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Size-change notifications for a single surface.
pub trait ResizeObserver {
    fn subscribe(&mut self) -> ListenerId;
    fn unsubscribe(&mut self, listener: ListenerId);
}

/// Registrations the engine owns for its lifetime.
pub struct HostHooks {
    pub scheduler: Box<dyn FrameScheduler>,
    pub resize: Box<dyn ResizeObserver>,
}

impl HostHooks {
    pub fn new(
        scheduler: impl FrameScheduler + 'static,
        resize: impl ResizeObserver + 'static,
    ) -> Self {
        Self {
            scheduler: Box::new(scheduler),
            resize: Box::new(resize),
        }
    }
}
